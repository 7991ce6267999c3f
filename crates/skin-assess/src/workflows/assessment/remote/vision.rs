use serde::Deserialize;
use serde_json::{json, Value};

use super::{AnalysisClient, AnalysisRequest, RemoteFailure};
use crate::workflows::assessment::contract::validate_payload;
use crate::workflows::assessment::domain::{AgeInput, AnswerRecord, AssessmentResult};

const MAX_TOKENS: u32 = 4000;

const SYSTEM_PROMPT: &str = "You are a board-certified dermatologist specializing in facial aging \
analysis. Describe only what is objectively visible in the photograph, using anatomical terms \
(periorbital, midface, nasolabial, jawline). Score volume integrity and dermal density on a 0-10 \
scale against age-matched norms and categorize each as normal, monitor or concern. Identify the \
most prominent aging markers, estimate a realistic skin age, and lower your confidence for poor \
photo quality. Relate visible changes to the patient's reported sleep, stress, sun exposure and \
hormonal status.

Respond with a single JSON object with exactly these keys: assessment_confidence (0-1), \
chronological_age, assessed_skin_age, aging_acceleration (integers), primary_concern (snake_case), \
clinical_metrics {volume_integrity, dermal_density} each {score, category, description}, \
findings [{area, observation, lifestyle_factor, biological_factor}], recommendations [string].";

/// Calls a chat-completions vision model directly and validates the JSON it writes back.
pub struct VisionCompletionClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
}

#[derive(Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl VisionCompletionClient {
    pub fn new(
        http: reqwest::Client,
        endpoint: &str,
        api_key: Option<String>,
        model: &str,
    ) -> Self {
        Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
            model: model.to_string(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn completion_body(&self, request: &AnalysisRequest) -> Value {
        json!({
            "model": self.model,
            "max_tokens": MAX_TOKENS,
            "response_format": { "type": "json_object" },
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                {
                    "role": "user",
                    "content": [
                        { "type": "image_url", "image_url": { "url": request.image_url } },
                        { "type": "text", "text": patient_summary(&request.questionnaire_data) }
                    ]
                }
            ]
        })
    }
}

impl AnalysisClient for VisionCompletionClient {
    async fn invoke(&self, request: &AnalysisRequest) -> Result<AssessmentResult, RemoteFailure> {
        let key = self
            .api_key
            .as_deref()
            .ok_or(RemoteFailure::MissingCredential)?;

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(key)
            .json(&self.completion_body(request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteFailure::Status {
                status: status.as_u16(),
                body,
            });
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .map_err(|err| RemoteFailure::Parse(err.to_string()))?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(RemoteFailure::MissingChoices)?;

        let block = extract_json_block(&content)
            .ok_or_else(|| RemoteFailure::Parse("no JSON object in completion".to_string()))?;
        let payload: Value =
            serde_json::from_str(block).map_err(|err| RemoteFailure::Parse(err.to_string()))?;

        let mut result = validate_payload(payload)?;
        // Image enhancement is switched off for this producer.
        result.enhanced_image_url = None;
        Ok(result)
    }
}

/// Pull the JSON object out of model output that may be fenced or wrapped in prose.
pub fn extract_json_block(text: &str) -> Option<&str> {
    let trimmed = text.trim();

    if let Some(start) = trimmed.find("```json") {
        let after_fence = &trimmed[start + 7..];
        if let Some(end) = after_fence.find("```") {
            return Some(after_fence[..end].trim());
        }
    }

    if let Some(start) = trimmed.find("```") {
        let after_fence = &trimmed[start + 3..];
        if let Some(end) = after_fence.find("```") {
            let block = after_fence[..end].trim();
            if block.starts_with('{') {
                return Some(block);
            }
        }
    }

    match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => Some(&trimmed[start..=end]),
        _ => None,
    }
}

fn patient_summary(answers: &AnswerRecord) -> String {
    let age = match &answers.age {
        AgeInput::Years(years) => years.to_string(),
        AgeInput::Range(token) if !token.trim().is_empty() => token.trim().to_string(),
        AgeInput::Range(_) => "Not provided".to_string(),
    };
    let sun = answers
        .sun_exposure
        .map(|exposure| exposure.label())
        .unwrap_or("Not assessed");
    let routine = if answers.skincare_routine.is_empty() {
        "Not assessed".to_string()
    } else {
        answers
            .skincare_routine
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    };
    let hormones = answers.hormone_status.as_deref().unwrap_or("Not assessed");

    format!(
        "Analyze this facial photograph and provide a clinical evaluation.\n\n\
         Patient information:\n\
         - Age: {age}\n\
         - Sleep quality: {}\n\
         - Stress level: {}\n\
         - Menstrual status: {}\n\
         - Sun exposure: {sun}\n\
         - Skincare routine: {routine}\n\
         - Hormone status: {hormones}\n\n\
         Provide only the JSON response.",
        answers.sleep_quality.label(),
        answers.stress_level.label(),
        answers.period_status.label(),
    )
}
