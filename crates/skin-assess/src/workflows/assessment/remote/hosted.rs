use serde_json::Value;

use super::{AnalysisClient, AnalysisRequest, RemoteFailure};
use crate::workflows::assessment::contract::validate_payload;
use crate::workflows::assessment::domain::AssessmentResult;

/// Calls a hosted analysis function that already answers with the assessment JSON.
pub struct HostedFunctionClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HostedFunctionClient {
    pub fn new(http: reqwest::Client, endpoint: &str, api_key: Option<String>) -> Self {
        Self {
            http,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl AnalysisClient for HostedFunctionClient {
    async fn invoke(&self, request: &AnalysisRequest) -> Result<AssessmentResult, RemoteFailure> {
        let mut builder = self.http.post(&self.endpoint).json(request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key).header("apikey", key);
        }

        let response = builder.send().await.map_err(|err| {
            if err.is_connect() {
                RemoteFailure::Transport(format!("cannot connect to {}", self.endpoint))
            } else {
                RemoteFailure::Transport(err.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteFailure::Status {
                status: status.as_u16(),
                body,
            });
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|err| RemoteFailure::Parse(err.to_string()))?;

        let mut result = validate_payload(payload)?;
        result.enhanced_image_url = None;
        Ok(result)
    }
}
