use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::response::Response;
use serde_json::Value;

use crate::workflows::assessment::domain::{
    AgeInput, AnswerRecord, AssessmentResult, ClinicalMetric, ClinicalMetrics, Finding,
    MetricCategory, PeriodStatus, SleepQuality, StressLevel, SunExposure,
};
use crate::workflows::assessment::questionnaire::ImageReference;
use crate::workflows::assessment::remote::{AnalysisClient, AnalysisRequest, RemoteFailure};
use crate::workflows::assessment::store::{
    MemorySessionStore, SessionId, SessionStore, StoreError, StoreKey,
};
use crate::workflows::assessment::AssessmentOrchestrator;

pub(super) const IMAGE: &str = "data:image/jpeg;base64,/9j/4AAQSkZJRg";

pub(super) fn session() -> SessionId {
    SessionId("sess-test".to_string())
}

pub(super) fn image() -> ImageReference {
    ImageReference::parse(IMAGE).expect("valid image reference")
}

/// Scenario 1 answers: every accelerating factor present.
pub(super) fn stressed_answers() -> AnswerRecord {
    AnswerRecord {
        age: AgeInput::Years(42),
        sleep_quality: SleepQuality::Poor,
        stress_level: StressLevel::High,
        period_status: PeriodStatus::Irregular,
        skincare_routine: BTreeSet::from(["Basic cleanser and moisturizer".to_string()]),
        sun_exposure: Some(SunExposure::High),
        hormone_status: None,
    }
}

pub(super) fn remote_result() -> AssessmentResult {
    AssessmentResult {
        assessment_confidence: 0.92,
        chronological_age: 42,
        assessed_skin_age: 47,
        aging_acceleration: 5,
        primary_concern: "periorbital_volume_loss".to_string(),
        clinical_metrics: ClinicalMetrics {
            volume_integrity: ClinicalMetric {
                score: 6.4,
                category: MetricCategory::Monitor,
                description: "Midface volume mildly reduced".to_string(),
            },
            dermal_density: ClinicalMetric {
                score: 7.8,
                category: MetricCategory::Normal,
                description: "Firmness within age norms".to_string(),
            },
            additional: BTreeMap::new(),
        },
        findings: vec![Finding {
            area: "periorbital_region".to_string(),
            observation: "Hollowing beneath both eyes".to_string(),
            lifestyle_factor: "Poor sleep".to_string(),
            biological_factor: "Fat pad descent".to_string(),
        }],
        recommendations: vec!["Nightly retinoid".to_string()],
        enhanced_image_url: None,
        error_info: None,
    }
}

/// How a [`ScriptedClient`] answers every call.
pub(super) enum Script {
    Succeed(AssessmentResult),
    FailStatus(u16),
    Delay(Duration, AssessmentResult),
}

pub(super) struct ScriptedClient {
    script: Script,
    calls: AtomicUsize,
}

impl ScriptedClient {
    pub(super) fn new(script: Script) -> Self {
        Self {
            script,
            calls: AtomicUsize::new(0),
        }
    }

    pub(super) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl AnalysisClient for ScriptedClient {
    async fn invoke(&self, _request: &AnalysisRequest) -> Result<AssessmentResult, RemoteFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            Script::Succeed(result) => Ok(result.clone()),
            Script::FailStatus(status) => Err(RemoteFailure::Status {
                status: *status,
                body: "edge function crashed".to_string(),
            }),
            Script::Delay(delay, result) => {
                tokio::time::sleep(*delay).await;
                Ok(result.clone())
            }
        }
    }
}

/// A store whose backend is gone.
pub(super) struct UnavailableStore;

impl SessionStore for UnavailableStore {
    fn put(&self, _session: &SessionId, _key: StoreKey, _value: String) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("storage quota exceeded".to_string()))
    }

    fn get(&self, _session: &SessionId, _key: StoreKey) -> Result<Option<String>, StoreError> {
        Err(StoreError::Unavailable("storage quota exceeded".to_string()))
    }

    fn clear(&self, _session: &SessionId) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("storage quota exceeded".to_string()))
    }
}

pub(super) fn orchestrator(
    script: Script,
) -> (
    Arc<AssessmentOrchestrator<ScriptedClient, MemorySessionStore>>,
    Arc<ScriptedClient>,
) {
    orchestrator_with_timeout(script, Duration::from_secs(5))
}

pub(super) fn orchestrator_with_timeout(
    script: Script,
    timeout: Duration,
) -> (
    Arc<AssessmentOrchestrator<ScriptedClient, MemorySessionStore>>,
    Arc<ScriptedClient>,
) {
    let client = Arc::new(ScriptedClient::new(script));
    let store = Arc::new(MemorySessionStore::default());
    let orchestrator = Arc::new(AssessmentOrchestrator::new(
        Arc::clone(&client),
        store,
        timeout,
    ));
    (orchestrator, client)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
