mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use common::{body_json, multipart_body, setup_app, Setup, BOUNDARY};
use raahi_session::load_session;
use tower::ServiceExt;

fn transcribe_request(body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/transcribe")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_transcribe_runs_turn_and_persists() {
    let app = setup_app(Setup::default());
    let body = multipart_body(
        &[("name", "Asha"), ("phone", "9999999999"), ("id", "u1")],
        Some(("audio/webm", b"fake-webm")),
    );

    let response = app
        .router
        .clone()
        .oneshot(transcribe_request(body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["tripState"]["intent"], "greet");
    assert_eq!(json["tripState"]["tripType"], "not_decided");
    assert_eq!(json["tripState"]["preferences"]["language"], "xx");
    assert_eq!(json["tripState"]["tripCreated"], false);
    assert_eq!(json["tripState"]["user"]["phone"], "9999999999");
    assert_eq!(json["tripState"]["user"]["name"], "Asha");

    let conn = app.pool.get().unwrap();
    let stored = load_session(&conn, "9999999999", raahi_session::now_ms())
        .unwrap()
        .expect("session should be stored");
    assert_eq!(stored.agent_response, "Namaste!");
}

#[tokio::test]
async fn test_transcribe_requires_file() {
    let app = setup_app(Setup::default());
    let body = multipart_body(&[("phone", "9999999999")], None);

    let response = app.router.oneshot(transcribe_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "Audio file is required");
}

#[tokio::test]
async fn test_transcribe_requires_phone() {
    let app = setup_app(Setup::default());
    let body = multipart_body(&[("name", "Asha")], Some(("audio/webm", b"fake-webm")));

    let response = app.router.oneshot(transcribe_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["error"], "Phone required");
}

#[tokio::test]
async fn test_turn_failure_is_500_and_persists_nothing() {
    let app = setup_app(Setup {
        reasoning_fails: true,
        ..Default::default()
    });
    let body = multipart_body(
        &[("phone", "9999999999")],
        Some(("audio/webm", b"fake-webm")),
    );

    let response = app.router.oneshot(transcribe_request(body)).await.unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert!(json["error"].as_str().unwrap().contains("503"));

    let conn = app.pool.get().unwrap();
    assert!(load_session(&conn, "9999999999", raahi_session::now_ms())
        .unwrap()
        .is_none());
}
