use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{info, warn};

use super::domain::{AnswerRecord, AssessmentResult, ErrorInfo};
use super::fallback::FallbackScorer;
use super::questionnaire::ImageReference;
use super::remote::{AnalysisClient, AnalysisRequest, RemoteFailure};
use super::store::{SessionHandoff, SessionId, SessionStore};

type Gate = Arc<tokio::sync::Mutex<()>>;

/// Produces exactly one assessment per submission, remote when possible and scored locally
/// otherwise, and hands it to the result pages through the session store.
pub struct AssessmentOrchestrator<C, S> {
    shared: Arc<Shared<C, S>>,
}

struct Shared<C, S> {
    client: Arc<C>,
    handoff: SessionHandoff<S>,
    scorer: FallbackScorer,
    timeout: Duration,
    gates: Mutex<HashMap<SessionId, Gate>>,
}

impl<C, S> AssessmentOrchestrator<C, S>
where
    C: AnalysisClient + 'static,
    S: SessionStore + 'static,
{
    pub fn new(client: Arc<C>, store: Arc<S>, timeout: Duration) -> Self {
        Self::with_scorer(client, store, timeout, FallbackScorer::standard())
    }

    pub fn with_scorer(
        client: Arc<C>,
        store: Arc<S>,
        timeout: Duration,
        scorer: FallbackScorer,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                client,
                handoff: SessionHandoff::new(store),
                scorer,
                timeout,
                gates: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn handoff(&self) -> &SessionHandoff<S> {
        &self.shared.handoff
    }

    pub fn timeout(&self) -> Duration {
        self.shared.timeout
    }

    /// Never fails: a remote problem of any kind turns into a fallback assessment carrying
    /// `error_info`. A caller arriving while the same session is already being assessed waits
    /// and receives the result that run published.
    ///
    /// The run lives on its own task, so a caller that goes away does not cancel it: the
    /// result is still published and the session gate released.
    pub async fn obtain_assessment(
        &self,
        session: &SessionId,
        image: &ImageReference,
        answers: &AnswerRecord,
    ) -> AssessmentResult {
        let shared = Arc::clone(&self.shared);
        let run = {
            let session = session.clone();
            let image = image.clone();
            let answers = answers.clone();
            tokio::spawn(async move {
                let gate = shared.gate_for(&session);
                let result = shared.run_gated(&gate, &session, &image, &answers).await;
                shared.release(&session, &gate);
                result
            })
        };

        match run.await {
            Ok(result) => result,
            Err(error) => {
                warn!(
                    session = session.as_str(),
                    error = %error,
                    "assessment task aborted; scoring questionnaire instead"
                );
                let mut fallback = self.shared.scorer.score(answers);
                fallback.error_info = Some(ErrorInfo::remote_failure(error.to_string()));
                fallback
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn pending_gates(&self) -> usize {
        self.shared.gates().len()
    }
}

impl<C, S> Shared<C, S>
where
    C: AnalysisClient,
    S: SessionStore,
{
    async fn run_gated(
        &self,
        gate: &tokio::sync::Mutex<()>,
        session: &SessionId,
        image: &ImageReference,
        answers: &AnswerRecord,
    ) -> AssessmentResult {
        let _permit = match gate.try_lock() {
            Ok(permit) => permit,
            Err(_) => {
                info!(
                    session = session.as_str(),
                    "assessment already running for session; waiting"
                );
                let permit = gate.lock().await;
                match self.handoff.assessment(session) {
                    Ok(Some(published)) => return published,
                    Ok(None) => {}
                    Err(error) => warn!(
                        session = session.as_str(),
                        error = %error,
                        "could not read published assessment; running again"
                    ),
                }
                permit
            }
        };

        let result = self.assess(session, image, answers).await;

        if let Err(error) = self
            .handoff
            .publish(session, image.as_str(), answers, &result)
        {
            warn!(
                session = session.as_str(),
                error = %error,
                "failed to publish assessment to session store"
            );
        }

        result
    }

    async fn assess(
        &self,
        session: &SessionId,
        image: &ImageReference,
        answers: &AnswerRecord,
    ) -> AssessmentResult {
        let request = AnalysisRequest {
            image_url: image.as_str().to_string(),
            questionnaire_data: answers.clone(),
        };

        let outcome = match tokio::time::timeout(self.timeout, self.client.invoke(&request)).await
        {
            Ok(outcome) => outcome,
            Err(_) => Err(RemoteFailure::Timeout(self.timeout.as_secs())),
        };

        match outcome {
            Ok(mut result) => {
                result.enhanced_image_url = None;
                info!(
                    session = session.as_str(),
                    confidence = result.assessment_confidence,
                    skin_age = result.assessed_skin_age,
                    "remote analysis accepted"
                );
                result
            }
            Err(failure) => {
                warn!(
                    session = session.as_str(),
                    error = %failure,
                    "remote analysis failed; scoring questionnaire instead"
                );
                let mut fallback = self.scorer.score(answers);
                fallback.error_info = Some(ErrorInfo::remote_failure(failure.to_string()));
                fallback
            }
        }
    }

    fn gates(&self) -> MutexGuard<'_, HashMap<SessionId, Gate>> {
        self.gates.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn gate_for(&self, session: &SessionId) -> Gate {
        Arc::clone(self.gates().entry(session.clone()).or_default())
    }

    fn release(&self, session: &SessionId, gate: &Gate) {
        let mut gates = self.gates();
        // The map and this caller are the only holders once nobody else is queued.
        let idle = gates
            .get(session)
            .is_some_and(|current| Arc::ptr_eq(current, gate) && Arc::strong_count(gate) == 2);
        if idle {
            gates.remove(session);
        }
    }
}
