use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{delete, get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::funnel::{FunnelNavigator, FunnelPage, PageResolution};
use super::orchestrator::AssessmentOrchestrator;
use super::questionnaire::{ImageReference, QuestionnaireSubmission, ValidationError};
use super::remote::AnalysisClient;
use super::store::{SessionId, SessionStore};

static SESSION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_session_id() -> SessionId {
    let id = SESSION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    let stamp = chrono::Utc::now().timestamp_millis();
    SessionId(format!("sess-{stamp}-{id:06}"))
}

/// Photo plus questionnaire as posted by the entry page.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentSubmission {
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub questionnaire_data: QuestionnaireSubmission,
}

pub struct AssessmentState<C, S> {
    orchestrator: Arc<AssessmentOrchestrator<C, S>>,
    navigator: Arc<FunnelNavigator<S>>,
}

impl<C, S> Clone for AssessmentState<C, S> {
    fn clone(&self) -> Self {
        Self {
            orchestrator: Arc::clone(&self.orchestrator),
            navigator: Arc::clone(&self.navigator),
        }
    }
}

/// Router exposing submission, page resolution, and session reset.
pub fn assessment_router<C, S>(
    orchestrator: Arc<AssessmentOrchestrator<C, S>>,
    sales_page_url: impl Into<String>,
) -> Router
where
    C: AnalysisClient + 'static,
    S: SessionStore + 'static,
{
    let navigator = Arc::new(FunnelNavigator::new(
        orchestrator.handoff().clone(),
        sales_page_url,
    ));
    let state = AssessmentState {
        orchestrator,
        navigator,
    };

    Router::new()
        .route("/api/v1/assessments", post(submit_handler::<C, S>))
        .route(
            "/api/v1/sessions/:session_id/pages/:page",
            get(page_handler::<C, S>),
        )
        .route("/api/v1/sessions/:session_id", delete(reset_handler::<C, S>))
        .with_state(state)
}

pub(crate) async fn submit_handler<C, S>(
    State(state): State<AssessmentState<C, S>>,
    axum::Json(submission): axum::Json<AssessmentSubmission>,
) -> Response
where
    C: AnalysisClient + 'static,
    S: SessionStore + 'static,
{
    let image = match ImageReference::parse(&submission.image_url) {
        Ok(image) => image,
        Err(error) => return validation_response(&error),
    };
    let answers = match submission.questionnaire_data.into_answers() {
        Ok(answers) => answers,
        Err(error) => return validation_response(&error),
    };
    let session = submission
        .session_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .map(SessionId)
        .unwrap_or_else(next_session_id);

    let assessment = state
        .orchestrator
        .obtain_assessment(&session, &image, &answers)
        .await;

    let payload = json!({
        "session_id": session.0,
        "next": FunnelPage::Results.path(),
        "assessment": assessment,
    });
    (StatusCode::OK, axum::Json(payload)).into_response()
}

pub(crate) async fn page_handler<C, S>(
    State(state): State<AssessmentState<C, S>>,
    Path((session_id, page)): Path<(String, String)>,
) -> Response
where
    C: AnalysisClient + 'static,
    S: SessionStore + 'static,
{
    let Some(page) = FunnelPage::from_slug(&page) else {
        let payload = json!({
            "error": format!("unknown page '{page}'"),
        });
        return (StatusCode::NOT_FOUND, axum::Json(payload)).into_response();
    };

    match state.navigator.resolve(&SessionId(session_id), page) {
        Ok(PageResolution::Start { next }) => {
            let payload = json!({
                "page": FunnelPage::Entry,
                "next": next.path(),
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Ok(PageResolution::Render(view)) => (StatusCode::OK, axum::Json(*view)).into_response(),
        Ok(PageResolution::Redirect(target)) => Redirect::to(target.path()).into_response(),
        Err(error) => {
            let payload = json!({
                "error": error.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn reset_handler<C, S>(
    State(state): State<AssessmentState<C, S>>,
    Path(session_id): Path<String>,
) -> Response
where
    C: AnalysisClient + 'static,
    S: SessionStore + 'static,
{
    match state
        .orchestrator
        .handoff()
        .reset(&SessionId(session_id))
    {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => {
            let payload = json!({
                "error": error.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

fn validation_response(error: &ValidationError) -> Response {
    let payload = json!({
        "error": error.to_string(),
        "field": error.field(),
    });
    (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
}
