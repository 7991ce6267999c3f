use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Deserializer};

use super::domain::AnswerRecord;
use super::questionnaire::{QuestionnaireSubmission, RawAge, ValidationError};

/// Reads exported questionnaire rows so they can be scored offline.
pub struct QuestionnaireImporter;

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row}: {source}")]
    Row {
        row: usize,
        #[source]
        source: ValidationError,
    },
}

impl QuestionnaireImporter {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Vec<AnswerRecord>, ImportError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ImportError::Open {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_reader(file)
    }

    /// Rows are numbered from 1, not counting the header.
    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<AnswerRecord>, ImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut records = Vec::new();

        for (index, row) in csv_reader.deserialize::<QuestionnaireRow>().enumerate() {
            let answers = row?
                .into_submission()
                .into_answers()
                .map_err(|source| ImportError::Row {
                    row: index + 1,
                    source,
                })?;
            records.push(answers);
        }

        Ok(records)
    }
}

#[derive(Debug, Deserialize)]
struct QuestionnaireRow {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    age: Option<String>,
    #[serde(rename = "sleepQuality", default, deserialize_with = "empty_string_as_none")]
    sleep_quality: Option<String>,
    #[serde(rename = "stressLevel", default, deserialize_with = "empty_string_as_none")]
    stress_level: Option<String>,
    #[serde(rename = "periodStatus", default, deserialize_with = "empty_string_as_none")]
    period_status: Option<String>,
    #[serde(rename = "skincareRoutine", default, deserialize_with = "empty_string_as_none")]
    skincare_routine: Option<String>,
    #[serde(rename = "sunExposure", default, deserialize_with = "empty_string_as_none")]
    sun_exposure: Option<String>,
    #[serde(rename = "hormoneStatus", default, deserialize_with = "empty_string_as_none")]
    hormone_status: Option<String>,
}

impl QuestionnaireRow {
    fn into_submission(self) -> QuestionnaireSubmission {
        QuestionnaireSubmission {
            age: self.age.map(RawAge::Text),
            sleep_quality: self.sleep_quality,
            stress_level: self.stress_level,
            period_status: self.period_status,
            skincare_routine: self
                .skincare_routine
                .map(|routine| routine.split(';').map(str::to_string).collect())
                .unwrap_or_default(),
            sun_exposure: self.sun_exposure,
            hormone_status: self.hormone_status,
        }
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
