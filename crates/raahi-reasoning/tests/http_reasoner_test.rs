use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{http::StatusCode, routing::post, Json, Router};
use raahi_reasoning::{HttpReasoner, Reasoner, ReasoningError};
use raahi_types::{Intent, TripState, UserInfo};
use serde_json::{json, Value};

async fn spawn_backend(status: StatusCode, content: Value, seen: Arc<Mutex<Vec<Value>>>) -> String {
    let router = Router::new().route(
        "/v1/chat/completions",
        post(move |Json(body): Json<Value>| {
            let seen = seen.clone();
            let content = content.clone();
            async move {
                seen.lock().unwrap().push(body);
                (
                    status,
                    Json(json!({ "choices": [{ "message": { "role": "assistant", "content": content } }] })),
                )
            }
        }),
    );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}/v1/chat/completions", addr)
}

fn current() -> TripState {
    TripState::initial(UserInfo::new("u1", "Asha", "9999999999"))
}

#[tokio::test]
async fn test_reason_returns_candidate_state() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let content = json!({
        "intent": "ask_source",
        "agentResponse": "Where should I pick you up?",
        "source": "", "destination": "", "tripType": "not_decided",
        "tripStartDate": "", "tripEndDate": "",
        "preferences": { "vehicleType": "none", "language": "en" },
        "user": { "id": "u1", "name": "Asha", "phone": "9999999999" }
    })
    .to_string();
    let url = spawn_backend(StatusCode::OK, Value::String(content), seen.clone()).await;

    let reasoner = HttpReasoner::new(url, "test-model", Some("k".into()), Duration::from_secs(5)).unwrap();
    let next = reasoner
        .reason("I want to book a cab", &current(), "SUV costs 18rs/km.")
        .await
        .expect("reasoning should succeed");

    assert_eq!(next.intent, Intent::AskSource);
    assert_eq!(next.agent_response, "Where should I pick you up?");

    let requests = seen.lock().unwrap();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request["model"], "test-model");
    assert_eq!(request["temperature"], 0.0);
    assert_eq!(request["response_format"]["type"], "json_object");
    let turn = request["messages"][1]["content"].as_str().unwrap();
    assert!(turn.contains("I want to book a cab"));
    assert!(turn.contains("SUV costs 18rs/km."));
}

#[tokio::test]
async fn test_backend_error_status() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let url = spawn_backend(StatusCode::SERVICE_UNAVAILABLE, Value::Null, seen).await;
    let reasoner = HttpReasoner::new(url, "m", None, Duration::from_secs(5)).unwrap();

    match reasoner.reason("Hello", &current(), "").await {
        Err(ReasoningError::Status { status, .. }) => assert_eq!(status, 503),
        other => panic!("expected status error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_null_content_is_empty_response() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let url = spawn_backend(StatusCode::OK, Value::Null, seen).await;
    let reasoner = HttpReasoner::new(url, "m", None, Duration::from_secs(5)).unwrap();

    assert!(matches!(
        reasoner.reason("Hello", &current(), "").await,
        Err(ReasoningError::EmptyResponse)
    ));
}

#[tokio::test]
async fn test_unreachable_backend() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let reasoner = HttpReasoner::new(
        format!("http://{}/v1/chat/completions", addr),
        "m",
        None,
        Duration::from_secs(2),
    )
    .unwrap();
    assert!(matches!(
        reasoner.reason("Hello", &current(), "").await,
        Err(ReasoningError::Request(_))
    ));
}
