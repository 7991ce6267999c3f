//! Clients for the remote skin analysis.
//!
//! Every failure mode comes back as a [`RemoteFailure`] value; nothing here retries.

mod hosted;
mod vision;

pub use hosted::HostedFunctionClient;
pub use vision::{extract_json_block, VisionCompletionClient};

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::contract::ContractViolation;
use super::domain::{AnswerRecord, AssessmentResult};
use crate::config::{AnalysisConfig, AnalysisMode};

/// Connection establishment bound; the orchestrator owns the overall deadline.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Body sent to the analysis endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    pub image_url: String,
    pub questionnaire_data: AnswerRecord,
}

#[derive(Debug, thiserror::Error)]
pub enum RemoteFailure {
    #[error("analysis endpoint unreachable: {0}")]
    Transport(String),
    #[error("analysis endpoint returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("analysis response is not valid JSON: {0}")]
    Parse(String),
    #[error("analysis response carried no completion choices")]
    MissingChoices,
    #[error("analysis response rejected: {0}")]
    Contract(#[from] ContractViolation),
    #[error("analysis did not finish within {0}s")]
    Timeout(u64),
    #[error("no analysis credential configured")]
    MissingCredential,
}

impl From<reqwest::Error> for RemoteFailure {
    fn from(err: reqwest::Error) -> Self {
        RemoteFailure::Transport(err.to_string())
    }
}

/// A producer of remote assessments.
pub trait AnalysisClient: Send + Sync {
    fn invoke(
        &self,
        request: &AnalysisRequest,
    ) -> impl Future<Output = Result<AssessmentResult, RemoteFailure>> + Send;
}

/// The client selected by configuration.
pub enum ConfiguredClient {
    Hosted(HostedFunctionClient),
    Direct(VisionCompletionClient),
}

impl ConfiguredClient {
    pub fn from_config(config: &AnalysisConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()?;

        Ok(match config.mode {
            AnalysisMode::Hosted => ConfiguredClient::Hosted(HostedFunctionClient::new(
                http,
                &config.endpoint,
                config.api_key.clone(),
            )),
            AnalysisMode::Direct => ConfiguredClient::Direct(VisionCompletionClient::new(
                http,
                &config.endpoint,
                config.api_key.clone(),
                &config.model,
            )),
        })
    }

    pub fn endpoint(&self) -> &str {
        match self {
            ConfiguredClient::Hosted(client) => client.endpoint(),
            ConfiguredClient::Direct(client) => client.endpoint(),
        }
    }
}

impl AnalysisClient for ConfiguredClient {
    async fn invoke(&self, request: &AnalysisRequest) -> Result<AssessmentResult, RemoteFailure> {
        match self {
            ConfiguredClient::Hosted(client) => client.invoke(request).await,
            ConfiguredClient::Direct(client) => client.invoke(request).await,
        }
    }
}
