use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const GENERAL_WELLNESS: &str = "general_wellness";
pub const PHOTOAGING_PREVENTION: &str = "photoaging_prevention";
pub const STRESS_MANAGEMENT: &str = "stress_management";

/// `error_info.type` attached whenever the fallback scorer stood in for the remote analysis.
pub const REMOTE_FAILURE: &str = "remote_failure";

/// Lowest confidence a successful remote analysis is expected to report.
pub const NOMINAL_REMOTE_CONFIDENCE: f64 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SleepQuality {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl SleepQuality {
    pub const ALL: [SleepQuality; 4] = [Self::Excellent, Self::Good, Self::Fair, Self::Poor];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Fair => "fair",
            Self::Poor => "poor",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StressLevel {
    Low,
    Moderate,
    High,
}

impl StressLevel {
    pub const ALL: [StressLevel; 3] = [Self::Low, Self::Moderate, Self::High];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodStatus {
    Regular,
    Irregular,
    Stopped,
    Hrt,
}

impl PeriodStatus {
    pub const ALL: [PeriodStatus; 4] = [Self::Regular, Self::Irregular, Self::Stopped, Self::Hrt];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Regular => "regular",
            Self::Irregular => "irregular",
            Self::Stopped => "stopped",
            Self::Hrt => "hrt",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SunExposure {
    Low,
    Moderate,
    High,
}

impl SunExposure {
    pub const ALL: [SunExposure; 3] = [Self::Low, Self::Moderate, Self::High];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
        }
    }
}

/// Age as entered: a plain number of years, or an age-range token from the older flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AgeInput {
    Years(u32),
    Range(String),
}

impl AgeInput {
    /// Whole years, taking the lower bound of a `41-45` style range.
    pub fn years(&self) -> Option<u32> {
        match self {
            AgeInput::Years(0) => None,
            AgeInput::Years(years) => Some(*years),
            AgeInput::Range(token) => token
                .split('-')
                .next()
                .and_then(|lower| lower.trim().parse::<u32>().ok())
                .filter(|years| *years > 0),
        }
    }
}

/// Questionnaire answers for one session. Built once by the collector and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    pub age: AgeInput,
    pub sleep_quality: SleepQuality,
    pub stress_level: StressLevel,
    pub period_status: PeriodStatus,
    #[serde(default)]
    pub skincare_routine: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sun_exposure: Option<SunExposure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hormone_status: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricCategory {
    Normal,
    Monitor,
    Concern,
}

impl MetricCategory {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Monitor => "monitor",
            Self::Concern => "concern",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalMetric {
    pub score: f64,
    pub category: MetricCategory,
    pub description: String,
}

/// The two metrics every page reads, plus whatever else the remote chose to report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalMetrics {
    pub volume_integrity: ClinicalMetric,
    pub dermal_density: ClinicalMetric,
    #[serde(flatten)]
    pub additional: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub area: String,
    pub observation: String,
    pub lifestyle_factor: String,
    pub biological_factor: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub fallback_used: bool,
}

impl ErrorInfo {
    pub fn remote_failure(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: REMOTE_FAILURE.to_string(),
            fallback_used: true,
        }
    }
}

/// The assessment every funnel page renders, whichever producer built it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentResult {
    pub assessment_confidence: f64,
    pub chronological_age: i32,
    pub assessed_skin_age: i32,
    pub aging_acceleration: i32,
    pub primary_concern: String,
    pub clinical_metrics: ClinicalMetrics,
    pub findings: Vec<Finding>,
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub enhanced_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_info: Option<ErrorInfo>,
}

impl AssessmentResult {
    pub fn fallback_used(&self) -> bool {
        self.error_info
            .as_ref()
            .map(|info| info.fallback_used)
            .unwrap_or(false)
    }
}
