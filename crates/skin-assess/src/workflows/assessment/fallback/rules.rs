use super::super::domain::{
    AnswerRecord, SleepQuality, StressLevel, SunExposure, GENERAL_WELLNESS,
    PHOTOAGING_PREVENTION, STRESS_MANAGEMENT,
};
use super::weights::ScoringWeights;

/// Recommendations appended to every questionnaire-only assessment.
pub(crate) const EVIDENCE_BASED_TAIL: [&str; 5] = [
    "Start retinoid therapy (ask a dermatologist about prescription strength)",
    "Morning antioxidant serum (Vitamin C + E + ferulic acid)",
    "Stay well-hydrated (8+ glasses of water daily)",
    "Evening peptide moisturizer for collagen support",
    "Annual comprehensive dermatological examination",
];

pub(crate) struct RuleOutcome {
    pub acceleration: i32,
    pub primary_concern: &'static str,
    pub recommendations: Vec<String>,
}

/// Apply the additive lifestyle rules. Evaluation order is sun, sleep, stress; a later rule
/// overrides the concern chosen by an earlier one.
pub(crate) fn apply_rules(answers: &AnswerRecord, weights: &ScoringWeights) -> RuleOutcome {
    let mut outcome = RuleOutcome {
        acceleration: weights.base_acceleration,
        primary_concern: GENERAL_WELLNESS,
        recommendations: Vec::new(),
    };

    match answers.sun_exposure {
        Some(SunExposure::High) => {
            outcome.acceleration += weights.high_sun_delta;
            outcome.primary_concern = PHOTOAGING_PREVENTION;
            outcome.push("Critical: apply broad-spectrum SPF 50+ sunscreen daily");
            outcome.push("Seek shade during peak UV hours (10am-4pm)");
            outcome.push("Consider professional IPL or laser treatment for photoaging");
        }
        Some(SunExposure::Moderate) => {
            outcome.acceleration += weights.moderate_sun_delta;
            outcome.push("Daily broad-spectrum SPF 30+ sunscreen application");
        }
        Some(SunExposure::Low) | None => {}
    }

    if answers.sleep_quality == SleepQuality::Poor {
        outcome.acceleration += weights.poor_sleep_delta;
        outcome.push("Prioritize 7-9 hours of quality sleep for cellular repair");
        outcome.push("Consider a sleep study if insomnia persists");
    }

    if answers.stress_level == StressLevel::High {
        outcome.acceleration += weights.high_stress_delta;
        outcome.primary_concern = STRESS_MANAGEMENT;
        outcome.push("Implement daily stress-reduction techniques");
        outcome.push("Consider cortisol management through meditation or therapy");
    }

    outcome
        .recommendations
        .extend(EVIDENCE_BASED_TAIL.iter().map(|tip| tip.to_string()));
    outcome
}

impl RuleOutcome {
    fn push(&mut self, recommendation: &str) {
        self.recommendations.push(recommendation.to_string());
    }
}

/// Whole years from the answers, or the configured default when the age is unusable.
pub(crate) fn chronological_age(answers: &AnswerRecord, weights: &ScoringWeights) -> i32 {
    answers
        .age
        .years()
        .and_then(|years| i32::try_from(years).ok())
        .unwrap_or(weights.default_chronological_age)
}

/// Skin age capped at the configured ceiling; never pulled below the chronological age by the cap.
pub(crate) fn assessed_skin_age(
    chronological: i32,
    acceleration: i32,
    weights: &ScoringWeights,
) -> i32 {
    let ceiling = weights.max_skin_age.max(chronological);
    chronological.saturating_add(acceleration).min(ceiling)
}
