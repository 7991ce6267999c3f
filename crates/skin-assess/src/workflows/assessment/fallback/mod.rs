//! Questionnaire-only scoring used whenever the remote analysis cannot be trusted.
//!
//! The scorer is pure: the same answers always produce the same assessment, with the same
//! shape the remote producer returns.

mod metrics;
mod rules;
mod weights;

pub use metrics::{categorize, CONCERN_CEILING, NORMAL_FLOOR};
pub use weights::ScoringWeights;

use super::domain::{AnswerRecord, AssessmentResult, Finding};
use rules::{apply_rules, assessed_skin_age, chronological_age};

/// Acceleration above which the finding calls for a broader intervention plan.
const MULTI_FACTOR_THRESHOLD: i32 = 5;

/// Stateless scorer that applies a weight table to questionnaire answers.
#[derive(Debug, Clone, Default)]
pub struct FallbackScorer {
    weights: ScoringWeights,
}

impl FallbackScorer {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn standard() -> Self {
        Self::new(ScoringWeights::standard())
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    pub fn score(&self, answers: &AnswerRecord) -> AssessmentResult {
        let outcome = apply_rules(answers, &self.weights);
        let chronological = chronological_age(answers, &self.weights);
        let assessed = assessed_skin_age(chronological, outcome.acceleration, &self.weights);
        let acceleration = assessed - chronological;

        AssessmentResult {
            assessment_confidence: self.weights.confidence,
            chronological_age: chronological,
            assessed_skin_age: assessed,
            aging_acceleration: acceleration,
            primary_concern: outcome.primary_concern.to_string(),
            clinical_metrics: metrics::clinical_metrics(answers),
            findings: vec![lifestyle_finding(
                answers,
                chronological,
                acceleration,
                outcome.acceleration,
            )],
            recommendations: outcome.recommendations,
            enhanced_image_url: None,
            error_info: None,
        }
    }
}

/// Score with the standard weight table.
pub fn score(answers: &AnswerRecord) -> AssessmentResult {
    FallbackScorer::standard().score(answers)
}

/// `rule_acceleration` is the uncapped rule total; `acceleration` is what the result reports.
fn lifestyle_finding(
    answers: &AnswerRecord,
    chronological: i32,
    acceleration: i32,
    rule_acceleration: i32,
) -> Finding {
    let sun = answers
        .sun_exposure
        .map(|exposure| exposure.label())
        .unwrap_or("unreported");

    let biological_factor = if rule_acceleration > MULTI_FACTOR_THRESHOLD {
        "Multiple accelerating factors detected; a comprehensive intervention plan is indicated"
    } else {
        "Age-appropriate patterns; targeted preventive care is indicated"
    };

    Finding {
        area: "comprehensive_facial_assessment".to_string(),
        observation: format!(
            "Questionnaire-based evaluation: aging pattern expected for age {chronological} \
             plus {acceleration} year(s) from lifestyle factors"
        ),
        lifestyle_factor: format!(
            "Key factors: {} sleep quality, {} stress levels, {} UV exposure history",
            answers.sleep_quality.label(),
            answers.stress_level.label(),
            sun
        ),
        biological_factor: biological_factor.to_string(),
    }
}
