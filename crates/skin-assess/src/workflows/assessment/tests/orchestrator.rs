use super::common::*;
use std::sync::Arc;
use std::time::Duration;

use crate::workflows::assessment::contract;
use crate::workflows::assessment::domain::{REMOTE_FAILURE, STRESS_MANAGEMENT};
use crate::workflows::assessment::fallback;
use crate::workflows::assessment::AssessmentOrchestrator;

#[tokio::test]
async fn remote_success_is_returned_and_published() {
    let (orchestrator, client) = orchestrator(Script::Succeed(remote_result()));

    let result = orchestrator
        .obtain_assessment(&session(), &image(), &stressed_answers())
        .await;

    assert_eq!(result, remote_result());
    assert!(!result.fallback_used());
    assert_eq!(client.calls(), 1);

    let handoff = orchestrator.handoff();
    assert_eq!(
        handoff.assessment(&session()).expect("store readable"),
        Some(remote_result())
    );
    assert_eq!(
        handoff.answers(&session()).expect("store readable"),
        Some(stressed_answers())
    );
    assert_eq!(
        handoff
            .uploaded_image(&session())
            .expect("store readable")
            .as_deref(),
        Some(IMAGE)
    );
}

#[tokio::test]
async fn remote_error_status_falls_back_with_error_info() {
    let (orchestrator, client) = orchestrator(Script::FailStatus(500));

    let result = orchestrator
        .obtain_assessment(&session(), &image(), &stressed_answers())
        .await;

    assert_eq!(client.calls(), 1);
    assert!(result.fallback_used());
    let info = result.error_info.as_ref().expect("error info attached");
    assert_eq!(info.kind, REMOTE_FAILURE);
    assert!(info.message.contains("500"));
    contract::check(&result).expect("fallback is structurally valid");

    assert_eq!(result.primary_concern, STRESS_MANAGEMENT);
    assert_eq!(result.assessed_skin_age, 56);
    let mut expected = fallback::score(&stressed_answers());
    expected.error_info = result.error_info.clone();
    assert_eq!(result, expected);
}

#[tokio::test]
async fn slow_remote_times_out_into_fallback() {
    let (orchestrator, _client) = orchestrator_with_timeout(
        Script::Delay(Duration::from_secs(5), remote_result()),
        Duration::from_millis(50),
    );

    let result = orchestrator
        .obtain_assessment(&session(), &image(), &stressed_answers())
        .await;

    assert!(result.fallback_used());
    let message = &result.error_info.as_ref().expect("error info").message;
    assert!(message.contains("did not finish"), "unexpected message: {message}");
}

#[tokio::test]
async fn concurrent_submissions_for_one_session_share_a_single_run() {
    let (orchestrator, client) = orchestrator(Script::Delay(
        Duration::from_millis(50),
        remote_result(),
    ));
    let answers = stressed_answers();
    let image = image();
    let session = session();

    let (first, second) = tokio::join!(
        orchestrator.obtain_assessment(&session, &image, &answers),
        orchestrator.obtain_assessment(&session, &image, &answers),
    );

    assert_eq!(client.calls(), 1);
    assert_eq!(first, second);
    assert_eq!(orchestrator.pending_gates(), 0);
}

#[tokio::test]
async fn different_sessions_each_get_their_own_run() {
    let (orchestrator, client) = orchestrator(Script::Delay(
        Duration::from_millis(20),
        remote_result(),
    ));
    let answers = stressed_answers();
    let image = image();
    let first_session = session();
    let second_session = crate::workflows::assessment::SessionId("sess-other".to_string());

    tokio::join!(
        orchestrator.obtain_assessment(&first_session, &image, &answers),
        orchestrator.obtain_assessment(&second_session, &image, &answers),
    );

    assert_eq!(client.calls(), 2);
}

#[tokio::test]
async fn resubmission_after_completion_overwrites_prior_result() {
    let (orchestrator, client) = orchestrator(Script::Succeed(remote_result()));

    orchestrator
        .obtain_assessment(&session(), &image(), &stressed_answers())
        .await;
    let mut calmer = stressed_answers();
    calmer.sun_exposure = None;
    orchestrator
        .obtain_assessment(&session(), &image(), &calmer)
        .await;

    assert_eq!(client.calls(), 2);
    assert_eq!(
        orchestrator.handoff().answers(&session()).expect("store readable"),
        Some(calmer)
    );
}

#[tokio::test]
async fn store_failure_still_returns_the_assessment() {
    let client = Arc::new(ScriptedClient::new(Script::FailStatus(503)));
    let orchestrator = AssessmentOrchestrator::new(
        Arc::clone(&client),
        Arc::new(UnavailableStore),
        Duration::from_secs(1),
    );

    let result = orchestrator
        .obtain_assessment(&session(), &image(), &stressed_answers())
        .await;

    assert!(result.fallback_used());
    assert_eq!(client.calls(), 1);
}

#[tokio::test]
async fn abandoned_caller_does_not_cancel_the_run() {
    let (orchestrator, client) = orchestrator(Script::Delay(
        Duration::from_millis(200),
        remote_result(),
    ));

    let abandoned = tokio::time::timeout(
        Duration::from_millis(20),
        orchestrator.obtain_assessment(&session(), &image(), &stressed_answers()),
    )
    .await;
    assert!(abandoned.is_err());

    tokio::time::sleep(Duration::from_millis(400)).await;

    assert_eq!(client.calls(), 1);
    assert_eq!(orchestrator.pending_gates(), 0);
    assert_eq!(
        orchestrator.handoff().assessment(&session()).expect("store readable"),
        Some(remote_result())
    );
}

#[tokio::test]
async fn remote_enhanced_image_is_dropped() {
    let mut enhanced = remote_result();
    enhanced.enhanced_image_url = Some("https://cdn.example.com/enhanced.jpg".to_string());
    let (orchestrator, _client) = orchestrator(Script::Succeed(enhanced));

    let result = orchestrator
        .obtain_assessment(&session(), &image(), &stressed_answers())
        .await;

    assert!(result.enhanced_image_url.is_none());
    assert_eq!(result, remote_result());
}
