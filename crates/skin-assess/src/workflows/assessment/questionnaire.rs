use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::domain::{AgeInput, AnswerRecord, PeriodStatus, SleepQuality, StressLevel, SunExposure};

/// Raw form payload as the questionnaire widget posts it. Every field may be blank.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionnaireSubmission {
    #[serde(default)]
    pub age: Option<RawAge>,
    #[serde(default)]
    pub sleep_quality: Option<String>,
    #[serde(default)]
    pub stress_level: Option<String>,
    #[serde(default)]
    pub period_status: Option<String>,
    #[serde(default)]
    pub skincare_routine: Vec<String>,
    #[serde(default)]
    pub sun_exposure: Option<String>,
    #[serde(default)]
    pub hormone_status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAge {
    Number(i64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("'{value}' is not a valid choice for {field}")]
    InvalidChoice { field: &'static str, value: String },
    #[error("age must be a positive whole number or a range like 41-45 (got '{0}')")]
    InvalidAge(String),
    #[error("image reference must be an image data URI or an http(s) URL ({0})")]
    InvalidImage(String),
}

impl ValidationError {
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::MissingField(field) => *field,
            ValidationError::InvalidChoice { field, .. } => *field,
            ValidationError::InvalidAge(_) => "age",
            ValidationError::InvalidImage(_) => "imageUrl",
        }
    }
}

impl QuestionnaireSubmission {
    /// Check every required answer and build the immutable record handed to the orchestrator.
    pub fn into_answers(self) -> Result<AnswerRecord, ValidationError> {
        let age = parse_age(self.age)?;
        let sleep_quality = required("sleepQuality", self.sleep_quality, parse_sleep)?;
        let stress_level = required("stressLevel", self.stress_level, parse_stress)?;
        let period_status = required("periodStatus", self.period_status, parse_period)?;
        let sun_exposure = optional("sunExposure", self.sun_exposure, parse_sun)?;

        let skincare_routine: BTreeSet<String> = self
            .skincare_routine
            .into_iter()
            .map(|label| label.trim().to_string())
            .filter(|label| !label.is_empty())
            .collect();

        let hormone_status = self
            .hormone_status
            .map(|status| status.trim().to_string())
            .filter(|status| !status.is_empty());

        Ok(AnswerRecord {
            age,
            sleep_quality,
            stress_level,
            period_status,
            skincare_routine,
            sun_exposure,
            hormone_status,
        })
    }
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|raw| raw.trim().to_ascii_lowercase())
        .filter(|raw| !raw.is_empty())
}

fn required<T>(
    field: &'static str,
    value: Option<String>,
    parse: fn(&str) -> Option<T>,
) -> Result<T, ValidationError> {
    optional(field, value, parse)?.ok_or(ValidationError::MissingField(field))
}

fn optional<T>(
    field: &'static str,
    value: Option<String>,
    parse: fn(&str) -> Option<T>,
) -> Result<Option<T>, ValidationError> {
    match blank_to_none(value) {
        None => Ok(None),
        Some(raw) => parse(&raw)
            .map(Some)
            .ok_or(ValidationError::InvalidChoice { field, value: raw }),
    }
}

fn parse_age(raw: Option<RawAge>) -> Result<AgeInput, ValidationError> {
    match raw {
        None => Err(ValidationError::MissingField("age")),
        Some(RawAge::Number(years)) => u32::try_from(years)
            .ok()
            .filter(|years| *years > 0)
            .map(AgeInput::Years)
            .ok_or_else(|| ValidationError::InvalidAge(years.to_string())),
        Some(RawAge::Text(text)) => {
            let text = text.trim();
            if text.is_empty() {
                return Err(ValidationError::MissingField("age"));
            }
            if let Ok(years) = text.parse::<u32>() {
                return match years {
                    0 => Err(ValidationError::InvalidAge(text.to_string())),
                    years => Ok(AgeInput::Years(years)),
                };
            }
            let range = AgeInput::Range(text.to_string());
            match range.years() {
                Some(_) => Ok(range),
                None => Err(ValidationError::InvalidAge(text.to_string())),
            }
        }
    }
}

fn parse_sleep(raw: &str) -> Option<SleepQuality> {
    SleepQuality::ALL.into_iter().find(|v| v.label() == raw)
}

fn parse_stress(raw: &str) -> Option<StressLevel> {
    StressLevel::ALL.into_iter().find(|v| v.label() == raw)
}

fn parse_period(raw: &str) -> Option<PeriodStatus> {
    PeriodStatus::ALL.into_iter().find(|v| v.label() == raw)
}

fn parse_sun(raw: &str) -> Option<SunExposure> {
    SunExposure::ALL.into_iter().find(|v| v.label() == raw)
}

/// Photo reference accepted by the analysis request: inline image data or a reachable URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference(String);

impl ImageReference {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ValidationError::MissingField("imageUrl"));
        }

        if let Some(rest) = raw.strip_prefix("data:") {
            let (media_type, payload) = rest
                .split_once(',')
                .ok_or_else(|| ValidationError::InvalidImage("data URI has no payload".into()))?;
            let essence = media_type.split(';').next().unwrap_or_default();
            let media = essence.parse::<mime::Mime>().map_err(|_| {
                ValidationError::InvalidImage(format!("unknown media type '{essence}'"))
            })?;
            if media.type_() != mime::IMAGE {
                return Err(ValidationError::InvalidImage(format!(
                    "'{media}' is not an image"
                )));
            }
            if payload.is_empty() {
                return Err(ValidationError::InvalidImage("data URI payload is empty".into()));
            }
            return Ok(Self(raw.to_string()));
        }

        let path = raw
            .strip_prefix("https://")
            .or_else(|| raw.strip_prefix("http://"))
            .ok_or_else(|| ValidationError::InvalidImage("unsupported scheme".into()))?;
        let path = path.split(['?', '#']).next().unwrap_or_default();
        if let Some((_, resource)) = path.split_once('/') {
            if let Some(guess) = mime_guess::from_path(resource).first() {
                if guess.type_() != mime::IMAGE {
                    return Err(ValidationError::InvalidImage(format!(
                        "'{guess}' is not an image"
                    )));
                }
            }
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}
