use serde::{Deserialize, Serialize};

/// Rule weights and bounds for the questionnaire-only scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub high_sun_delta: i32,
    pub moderate_sun_delta: i32,
    pub poor_sleep_delta: i32,
    pub high_stress_delta: i32,
    pub base_acceleration: i32,
    pub default_chronological_age: i32,
    pub max_skin_age: i32,
    pub confidence: f64,
}

impl ScoringWeights {
    pub fn standard() -> Self {
        Self {
            high_sun_delta: 6,
            moderate_sun_delta: 3,
            poor_sleep_delta: 4,
            high_stress_delta: 4,
            base_acceleration: 0,
            default_chronological_age: 42,
            max_skin_age: 85,
            confidence: 0.55,
        }
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self::standard()
    }
}
