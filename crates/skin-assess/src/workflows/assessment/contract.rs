use serde_json::Value;

use super::domain::AssessmentResult;

/// Top-level keys a payload must carry before it is treated as an assessment.
pub const REQUIRED_FIELDS: [&str; 8] = [
    "assessment_confidence",
    "chronological_age",
    "assessed_skin_age",
    "aging_acceleration",
    "primary_concern",
    "clinical_metrics",
    "findings",
    "recommendations",
];

/// Plausible human ages, in years.
pub const AGE_RANGE: std::ops::RangeInclusive<i32> = 1..=150;
/// Clinical metric scale.
pub const METRIC_SCORE_RANGE: std::ops::RangeInclusive<f64> = 0.0..=10.0;

/// Reasons a remote payload is refused as an assessment.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ContractViolation {
    #[error("assessment payload is not a JSON object")]
    NotAnObject,
    #[error("assessment payload is missing `{0}`")]
    MissingField(&'static str),
    #[error("assessment payload has an invalid shape: {0}")]
    Shape(String),
    #[error("assessment_confidence {0} is outside 0..=1")]
    ConfidenceOutOfRange(f64),
    #[error("{field} {value} is not a plausible age")]
    AgeOutOfRange { field: &'static str, value: i32 },
    #[error("{metric} score {score} is outside 0..=10")]
    MetricScoreOutOfRange { metric: &'static str, score: f64 },
    #[error("assessment payload carries no findings")]
    NoFindings,
    #[error("assessment payload carries no recommendations")]
    NoRecommendations,
}

/// Turn an untyped payload into an assessment, rejecting anything structurally off.
/// Unknown keys are tolerated.
pub fn validate_payload(payload: Value) -> Result<AssessmentResult, ContractViolation> {
    let object = payload.as_object().ok_or(ContractViolation::NotAnObject)?;
    if let Some(missing) = REQUIRED_FIELDS
        .iter()
        .find(|field| object.get(**field).map_or(true, Value::is_null))
    {
        return Err(ContractViolation::MissingField(*missing));
    }

    let result: AssessmentResult = serde_json::from_value(payload)
        .map_err(|err| ContractViolation::Shape(err.to_string()))?;
    check(&result)?;
    Ok(result)
}

/// Structural rules shared by both producers.
pub fn check(result: &AssessmentResult) -> Result<(), ContractViolation> {
    let confidence = result.assessment_confidence;
    if !(0.0..=1.0).contains(&confidence) {
        return Err(ContractViolation::ConfidenceOutOfRange(confidence));
    }
    for (field, value) in [
        ("chronological_age", result.chronological_age),
        ("assessed_skin_age", result.assessed_skin_age),
    ] {
        if !AGE_RANGE.contains(&value) {
            return Err(ContractViolation::AgeOutOfRange { field, value });
        }
    }
    let metrics = &result.clinical_metrics;
    for (metric, score) in [
        ("volume_integrity", metrics.volume_integrity.score),
        ("dermal_density", metrics.dermal_density.score),
    ] {
        if !METRIC_SCORE_RANGE.contains(&score) {
            return Err(ContractViolation::MetricScoreOutOfRange { metric, score });
        }
    }
    if result.findings.is_empty() {
        return Err(ContractViolation::NoFindings);
    }
    if result.recommendations.is_empty() {
        return Err(ContractViolation::NoRecommendations);
    }
    Ok(())
}
