//! ApiClient against a stub backend served by axum on a loopback port.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

use quill_client::{ApiClient, Backend, ClientConfig, ClientError};
use quill_types::api::{Credentials, GenerateRequest, ScheduleRequest};
use quill_types::models::{BrandTone, Channel, Platform};

type Recorded = Arc<Mutex<Vec<Value>>>;

async fn serve(api: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = Router::new().nest("/api/v1", api);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/api/v1", addr)
}

fn client(base_url: String) -> ApiClient {
    ApiClient::new(ClientConfig {
        base_url,
        timeout: Duration::from_secs(5),
        generation_timeout: Duration::from_secs(5),
    })
    .unwrap()
}

fn credentials() -> Credentials {
    Credentials {
        email: "ana@acme.io".into(),
        password: "hunter22".into(),
    }
}

async fn login_ok() -> impl IntoResponse {
    (
        [(header::SET_COOKIE, "sid=abc123; Path=/; HttpOnly")],
        Json(json!({
            "success": true,
            "data": { "_id": "u1", "email": "ana@acme.io", "isOnboarded": false }
        })),
    )
}

async fn profile_needs_cookie(headers: HeaderMap) -> impl IntoResponse {
    let has_session = headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("sid=abc123"));

    if has_session {
        (
            StatusCode::OK,
            Json(json!({ "success": true, "data": { "email": "ana@acme.io", "isOnboarded": true } })),
        )
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "success": false, "message": "Not authenticated" })),
        )
    }
}

#[tokio::test]
async fn login_cookie_is_sent_on_later_calls() {
    let api = Router::new()
        .route("/auth/login", post(login_ok))
        .route("/auth/profile", get(profile_needs_cookie));
    let client = client(serve(api).await);

    let user = client.login(&credentials()).await.unwrap();
    assert_eq!(user.id.as_deref(), Some("u1"));
    assert!(!user.is_onboarded);

    let profile = client.fetch_profile().await.unwrap();
    assert!(profile.is_onboarded);
}

#[tokio::test]
async fn login_survives_unfamiliar_brand_values() {
    let api = Router::new().route(
        "/auth/login",
        post(|| async {
            Json(json!({
                "success": true,
                "data": {
                    "email": "ana@acme.io",
                    "isOnboarded": true,
                    "brandProfile": { "brandTone": "Casual", "platforms": ["tiktok", "twitter"] }
                },
                "user": { "email": "stale@acme.io" }
            }))
        }),
    );
    let client = client(serve(api).await);

    let user = client.login(&credentials()).await.unwrap();
    assert_eq!(user.email, "ana@acme.io");
    assert_eq!(user.brand_profile.brand_tone, BrandTone::Professional);
    assert_eq!(user.brand_profile.platforms, vec![Platform::Twitter]);
}

#[tokio::test]
async fn rejection_carries_server_message() {
    let api = Router::new().route(
        "/auth/login",
        post(|| async {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "message": "Invalid credentials" })),
            )
        }),
    );
    let client = client(serve(api).await);

    match client.login(&credentials()).await {
        Err(ClientError::Rejected { status, message }) => {
            assert_eq!(status, 401);
            assert_eq!(message, "Invalid credentials");
        }
        other => panic!("expected rejection, got {:?}", other.map(|u| u.email)),
    }
}

#[tokio::test]
async fn schedule_success_is_flag_or_status() {
    let recorded: Recorded = Arc::default();

    async fn record(State(recorded): State<Recorded>, Json(body): Json<Value>) -> impl IntoResponse {
        let taken = body["contentId"] == "taken";
        recorded.lock().unwrap().push(body);
        if taken {
            (StatusCode::OK, Json(json!({ "success": false, "message": "Slot taken" })))
        } else {
            (StatusCode::CREATED, Json(json!({})))
        }
    }

    let api = Router::new()
        .route("/content/schedule", post(record))
        .with_state(recorded.clone());
    let client = client(serve(api).await);

    let mut request = ScheduleRequest {
        content_id: "c1".into(),
        scheduled_at: "2026-03-02T09:00:00Z".parse().unwrap(),
        platform: Platform::Instagram,
    };
    client.schedule(&request).await.unwrap();

    request.content_id = "taken".into();
    let err = client.schedule(&request).await.unwrap_err();
    assert_eq!(err.user_message(), "Slot taken");

    let bodies = recorded.lock().unwrap();
    assert_eq!(bodies[0]["contentId"], "c1");
    assert_eq!(bodies[0]["platform"], "instagram");
    assert!(bodies[0]["scheduledAt"].is_string());
}

#[tokio::test]
async fn generate_unwraps_job_payload() {
    let api = Router::new().route(
        "/content/generate",
        post(|Json(body): Json<Value>| async move {
            if body["prompt"] == "empty" {
                Json(json!({ "success": true, "job": {} }))
            } else {
                Json(json!({
                    "success": true,
                    "job": { "generatedContent": { "twitter": [{ "text": "A" }, { "text": "B" }] } }
                }))
            }
        }),
    );
    let client = client(serve(api).await);

    let content = client
        .generate(&GenerateRequest {
            prompt: "eco bottle".into(),
        })
        .await
        .unwrap();
    assert!(content.channel(Channel::Twitter).is_some());

    let missing = client
        .generate(&GenerateRequest {
            prompt: "empty".into(),
        })
        .await;
    assert!(matches!(missing, Err(ClientError::MissingPayload("generatedContent"))));
}

#[tokio::test]
async fn unknown_campaign_reads_as_none() {
    let api = Router::new().route(
        "/campaign/{id}",
        get(|Path(id): Path<String>| async move {
            if id == "c1" {
                (
                    StatusCode::OK,
                    Json(json!({ "success": true, "data": { "_id": "c1", "prompt": "launch" } })),
                )
            } else {
                (StatusCode::NOT_FOUND, Json(json!({ "message": "Campaign not found" })))
            }
        }),
    );
    let client = client(serve(api).await);

    let found = client.campaign("c1").await.unwrap().unwrap();
    assert_eq!(found.prompt, "launch");
    assert!(client.campaign("nope").await.unwrap().is_none());
}

#[tokio::test]
async fn history_tolerates_missing_data() {
    let api = Router::new().route("/content/history", get(|| async { Json(json!({ "success": true })) }));
    let client = client(serve(api).await);

    assert!(client.history().await.unwrap().is_empty());
}

#[tokio::test]
async fn history_keeps_campaigns_with_unfamiliar_values() {
    let api = Router::new().route(
        "/content/history",
        get(|| async {
            Json(json!({
                "success": true,
                "data": [
                    { "_id": "c1", "status": "scheduled" },
                    { "_id": "c2", "status": "pending", "platforms": ["tiktok"] }
                ]
            }))
        }),
    );
    let client = client(serve(api).await);

    let history = client.history().await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].status, None);
    assert!(history[1].platforms.is_empty());
}

#[tokio::test]
async fn every_request_is_tagged() {
    let api = Router::new().route(
        "/auth/logout",
        post(|headers: HeaderMap| async move {
            if headers.contains_key("x-request-id") {
                StatusCode::NO_CONTENT
            } else {
                StatusCode::BAD_REQUEST
            }
        }),
    );
    let client = client(serve(api).await);

    client.logout().await.unwrap();
}

#[tokio::test]
async fn slow_backend_times_out() {
    let api = Router::new().route(
        "/content/history",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(3)).await;
            Json(json!({ "data": [] }))
        }),
    );
    let client = ApiClient::new(ClientConfig {
        base_url: serve(api).await,
        timeout: Duration::from_millis(100),
        generation_timeout: Duration::from_millis(100),
    })
    .unwrap();

    let err = client.history().await.unwrap_err();
    assert!(matches!(err, ClientError::Timeout(_)));
}

#[tokio::test]
async fn cancel_all_aborts_in_flight_calls() {
    let api = Router::new().route(
        "/content/history",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(3)).await;
            Json(json!({ "data": [] }))
        }),
    );
    let client = client(serve(api).await);

    let in_flight = {
        let client = client.clone();
        tokio::spawn(async move { client.history().await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    client.cancel_all();

    let result = in_flight.await.unwrap();
    assert!(matches!(result, Err(ClientError::Cancelled)));
}
