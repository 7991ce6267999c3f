//! Skin-age assessment funnel: questionnaire intake, remote photo analysis with a
//! questionnaire-only fallback, and the result pages that read the session handoff.

pub mod contract;
pub mod domain;
pub mod fallback;
pub mod funnel;
pub mod import;
pub mod orchestrator;
pub mod questionnaire;
pub mod remote;
pub mod router;
pub mod store;

#[cfg(test)]
mod tests;

pub use contract::{validate_payload, ContractViolation};
pub use domain::{
    AgeInput, AnswerRecord, AssessmentResult, ClinicalMetric, ClinicalMetrics, ErrorInfo,
    Finding, MetricCategory, PeriodStatus, SleepQuality, StressLevel, SunExposure,
};
pub use fallback::{FallbackScorer, ScoringWeights};
pub use funnel::{FunnelNavigator, FunnelPage, PageResolution, PageView, ProjectionPoint};
pub use import::{ImportError, QuestionnaireImporter};
pub use orchestrator::AssessmentOrchestrator;
pub use questionnaire::{ImageReference, QuestionnaireSubmission, ValidationError};
pub use remote::{
    AnalysisClient, AnalysisRequest, ConfiguredClient, HostedFunctionClient, RemoteFailure,
    VisionCompletionClient,
};
pub use router::assessment_router;
pub use store::{MemorySessionStore, SessionHandoff, SessionId, SessionStore, StoreError, StoreKey};
