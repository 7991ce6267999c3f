use std::collections::BTreeMap;

use super::super::domain::{
    AnswerRecord, ClinicalMetric, ClinicalMetrics, MetricCategory, SleepQuality, StressLevel,
    SunExposure,
};

/// Scores at or below this are a concern.
pub const CONCERN_CEILING: f64 = 6.0;
/// Scores at or above this are normal; anything between is monitored.
pub const NORMAL_FLOOR: f64 = 7.5;

pub fn categorize(score: f64) -> MetricCategory {
    if score <= CONCERN_CEILING {
        MetricCategory::Concern
    } else if score < NORMAL_FLOOR {
        MetricCategory::Monitor
    } else {
        MetricCategory::Normal
    }
}

fn metric(score: f64, description: &str) -> ClinicalMetric {
    ClinicalMetric {
        score,
        category: categorize(score),
        description: description.to_string(),
    }
}

pub(crate) fn clinical_metrics(answers: &AnswerRecord) -> ClinicalMetrics {
    let volume_score = if answers.stress_level == StressLevel::High {
        5.8
    } else {
        6.5
    };

    let density_score = if answers.sleep_quality == SleepQuality::Poor {
        5.5
    } else if answers.sun_exposure == Some(SunExposure::High) {
        6.0
    } else {
        7.2
    };

    ClinicalMetrics {
        volume_integrity: metric(
            volume_score,
            "Facial volume estimate from lifestyle and hormonal factors",
        ),
        dermal_density: metric(
            density_score,
            "Skin density estimate from environmental and lifestyle factors",
        ),
        additional: BTreeMap::new(),
    }
}
