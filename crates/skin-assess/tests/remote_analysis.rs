//! Remote analysis clients exercised against local stand-ins for the hosted function and the
//! chat-completions endpoint.

mod common {
    use std::collections::BTreeSet;

    use axum::Router;
    use serde_json::{json, Value};

    use skin_assess::workflows::assessment::{
        AgeInput, AnalysisRequest, AnswerRecord, PeriodStatus, SleepQuality, StressLevel,
        SunExposure,
    };

    pub(super) async fn spawn(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind local listener");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("server runs");
        });
        format!("http://{addr}")
    }

    pub(super) fn request() -> AnalysisRequest {
        AnalysisRequest {
            image_url: "https://cdn.example.com/uploads/face.jpg".to_string(),
            questionnaire_data: AnswerRecord {
                age: AgeInput::Years(44),
                sleep_quality: SleepQuality::Fair,
                stress_level: StressLevel::Moderate,
                period_status: PeriodStatus::Irregular,
                skincare_routine: BTreeSet::from(["Vitamin C or antioxidant serums".to_string()]),
                sun_exposure: Some(SunExposure::Moderate),
                hormone_status: None,
            },
        }
    }

    pub(super) fn assessment_payload() -> Value {
        json!({
            "assessment_confidence": 0.88,
            "chronological_age": 44,
            "assessed_skin_age": 48,
            "aging_acceleration": 4,
            "primary_concern": "midface_volume_loss",
            "clinical_metrics": {
                "volume_integrity": {"score": 6.1, "category": "monitor", "description": "volume"},
                "dermal_density": {"score": 7.6, "category": "normal", "description": "density"}
            },
            "findings": [{
                "area": "midface",
                "observation": "Flattening of the malar fat pad",
                "lifestyle_factor": "Moderate stress",
                "biological_factor": "Collagen turnover slows"
            }],
            "recommendations": ["Daily SPF 30+", "Peptide moisturizer"],
            "enhanced_image_url": "https://cdn.example.com/enhanced/face.jpg",
            "model_version": "face-v3"
        })
    }

    /// A port nothing listens on.
    pub(super) async fn closed_endpoint() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind local listener");
        let addr = listener.local_addr().expect("local addr");
        drop(listener);
        format!("http://{addr}/analyze")
    }
}

mod hosted {
    use super::common::*;
    use std::sync::{Arc, Mutex};

    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    use skin_assess::workflows::assessment::{
        AnalysisClient, ContractViolation, HostedFunctionClient, RemoteFailure,
    };

    #[derive(Default, Clone)]
    struct Captured {
        body: Arc<Mutex<Option<Value>>>,
        api_key: Arc<Mutex<Option<String>>>,
    }

    async fn serve_payload(status: StatusCode, payload: Value) -> (String, Captured) {
        let captured = Captured::default();
        let seen = captured.clone();
        let router = Router::new().route(
            "/functions/v1/analyze-face",
            post(move |headers: HeaderMap, Json(body): Json<Value>| {
                let seen = seen.clone();
                let payload = payload.clone();
                async move {
                    *seen.body.lock().expect("lock") = Some(body);
                    *seen.api_key.lock().expect("lock") = headers
                        .get("apikey")
                        .and_then(|value| value.to_str().ok())
                        .map(str::to_string);
                    (status, Json(payload))
                }
            }),
        );
        let base = spawn(router).await;
        (format!("{base}/functions/v1/analyze-face"), captured)
    }

    #[tokio::test]
    async fn valid_payload_becomes_assessment() {
        let (endpoint, captured) = serve_payload(StatusCode::OK, assessment_payload()).await;
        let client = HostedFunctionClient::new(
            reqwest::Client::new(),
            &endpoint,
            Some("anon-key".to_string()),
        );

        let result = client.invoke(&request()).await.expect("remote succeeds");

        assert_eq!(result.assessed_skin_age, 48);
        assert!(result.enhanced_image_url.is_none());
        let body = captured.body.lock().expect("lock").clone().expect("request captured");
        assert_eq!(body["imageUrl"], "https://cdn.example.com/uploads/face.jpg");
        assert_eq!(body["questionnaireData"]["sleepQuality"], "fair");
        assert_eq!(body["questionnaireData"]["sunExposure"], "moderate");
        assert_eq!(
            captured.api_key.lock().expect("lock").as_deref(),
            Some("anon-key")
        );
    }

    #[tokio::test]
    async fn error_status_is_reported_with_body() {
        let (endpoint, _) = serve_payload(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({"error": "OpenAI API key not configured"}),
        )
        .await;
        let client = HostedFunctionClient::new(reqwest::Client::new(), &endpoint, None);

        match client.invoke(&request()).await {
            Err(RemoteFailure::Status { status, body }) => {
                assert_eq!(status, 500);
                assert!(body.contains("not configured"));
            }
            other => panic!("expected status failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn payload_missing_required_fields_is_a_contract_failure() {
        let mut payload = assessment_payload();
        payload.as_object_mut().expect("object").remove("findings");
        let (endpoint, _) = serve_payload(StatusCode::OK, payload).await;
        let client = HostedFunctionClient::new(reqwest::Client::new(), &endpoint, None);

        assert!(matches!(
            client.invoke(&request()).await,
            Err(RemoteFailure::Contract(ContractViolation::MissingField("findings")))
        ));
    }

    #[tokio::test]
    async fn non_json_body_is_a_parse_failure() {
        let router = Router::new().route(
            "/analyze",
            post(|| async { (StatusCode::OK, "<html>gateway</html>") }),
        );
        let base = spawn(router).await;
        let client =
            HostedFunctionClient::new(reqwest::Client::new(), &format!("{base}/analyze"), None);

        assert!(matches!(
            client.invoke(&request()).await,
            Err(RemoteFailure::Parse(_))
        ));
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_transport_failure() {
        let client =
            HostedFunctionClient::new(reqwest::Client::new(), &closed_endpoint().await, None);

        assert!(matches!(
            client.invoke(&request()).await,
            Err(RemoteFailure::Transport(_))
        ));
    }
}

mod vision {
    use super::common::*;
    use std::sync::{Arc, Mutex};

    use axum::http::{header, HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};

    use skin_assess::workflows::assessment::{
        AnalysisClient, RemoteFailure, VisionCompletionClient,
    };

    async fn serve_completion(
        status: StatusCode,
        response: Value,
    ) -> (String, Arc<Mutex<Option<(Value, Option<String>)>>>) {
        let captured = Arc::new(Mutex::new(None));
        let seen = Arc::clone(&captured);
        let router = Router::new().route(
            "/v1/chat/completions",
            post(move |headers: HeaderMap, Json(body): Json<Value>| {
                let seen = Arc::clone(&seen);
                let response = response.clone();
                async move {
                    let auth = headers
                        .get(header::AUTHORIZATION)
                        .and_then(|value| value.to_str().ok())
                        .map(str::to_string);
                    *seen.lock().expect("lock") = Some((body, auth));
                    (status, Json(response))
                }
            }),
        );
        let base = spawn(router).await;
        (format!("{base}/v1/chat/completions"), captured)
    }

    fn client(endpoint: &str) -> VisionCompletionClient {
        VisionCompletionClient::new(
            reqwest::Client::new(),
            endpoint,
            Some("sk-local".to_string()),
            "gpt-4o",
        )
    }

    #[tokio::test]
    async fn fenced_completion_is_unwrapped_and_validated() {
        let content = format!(
            "Here is the evaluation.\n```json\n{}\n```",
            assessment_payload()
        );
        let (endpoint, captured) = serve_completion(
            StatusCode::OK,
            json!({"choices": [{"message": {"role": "assistant", "content": content}}]}),
        )
        .await;

        let result = client(&endpoint)
            .invoke(&request())
            .await
            .expect("completion accepted");

        assert_eq!(result.primary_concern, "midface_volume_loss");
        assert!(result.enhanced_image_url.is_none());

        let (body, auth) = captured.lock().expect("lock").clone().expect("request captured");
        assert_eq!(auth.as_deref(), Some("Bearer sk-local"));
        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(
            body["messages"][1]["content"][0]["image_url"]["url"],
            "https://cdn.example.com/uploads/face.jpg"
        );
    }

    #[tokio::test]
    async fn empty_choices_are_reported() {
        let (endpoint, _) = serve_completion(StatusCode::OK, json!({"choices": []})).await;

        assert!(matches!(
            client(&endpoint).invoke(&request()).await,
            Err(RemoteFailure::MissingChoices)
        ));
    }

    #[tokio::test]
    async fn rejected_credential_is_a_status_failure() {
        let (endpoint, _) = serve_completion(
            StatusCode::UNAUTHORIZED,
            json!({"error": {"message": "Incorrect API key provided"}}),
        )
        .await;

        assert!(matches!(
            client(&endpoint).invoke(&request()).await,
            Err(RemoteFailure::Status { status: 401, .. })
        ));
    }

    #[tokio::test]
    async fn prose_without_json_is_a_parse_failure() {
        let (endpoint, _) = serve_completion(
            StatusCode::OK,
            json!({"choices": [{"message": {"content": "I cannot assess this image."}}]}),
        )
        .await;

        assert!(matches!(
            client(&endpoint).invoke(&request()).await,
            Err(RemoteFailure::Parse(_))
        ));
    }
}
