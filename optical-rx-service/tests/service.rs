mod common;

use axum::http::StatusCode;
use common::TestApp;
use optical_rx_service::config::RxConfig;
use optical_rx_service::services::{MockVisionProvider, OcrService};
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn liveness_routes() {
    let app = TestApp::new();

    let (status, root) = app.get("/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(root["status"], "healthy");
    assert_eq!(root["service"], "Optical Rx Now API");
    assert_eq!(root["mode"], "full");

    let (status, api) = app.get("/api/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(api["version"].is_string());

    let (status, _) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.get("/ready").await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.get("/api/does-not-exist").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn phi_routes_vanish_in_analytics_only_mode() {
    let mut config = RxConfig::in_memory();
    config.features.phi_endpoints_enabled = false;
    let app = TestApp::with_config(config);

    let (_, root) = app.get("/").await;
    assert_eq!(root["mode"], "analytics-only");

    for uri in [
        "/api/family-members",
        "/api/prescriptions",
        "/api/stats",
        "/api/subscription",
        "/api/user-emails",
        "/api/alerts",
    ] {
        let (status, _) = app.get(uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{} should be unmounted", uri);
    }

    let (status, _) = app.get("/api/affiliates").await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app
        .post(
            "/api/analytics/track",
            json!({ "device_id": "d", "event_type": "app_open" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn ocr_without_key_asks_for_manual_entry() {
    let app = TestApp::new();
    let (status, body) = app
        .post(
            "/api/ocr/extract-expiry",
            json!({ "image_base64": "data:image/png;base64,aGVsbG8=" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("manual entry"));
}

#[tokio::test]
async fn ocr_rejects_bad_payloads() {
    let app = TestApp::new();
    for payload in ["", "%%%"] {
        let (status, _) = app
            .post("/api/ocr/extract-expiry", json!({ "image_base64": payload }))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

#[tokio::test]
async fn ocr_returns_parsed_date() {
    let ocr = OcrService::new(Some(Arc::new(MockVisionProvider::answering(
        "Expiration: March 15, 2026",
    ))));
    let app = TestApp::with_ocr(RxConfig::in_memory(), ocr);

    let (status, body) = app
        .post("/api/ocr/extract-expiry", json!({ "image_base64": "aGVsbG8=" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["expiry_date"], "2026-03-15");
    assert_eq!(body["raw_text"], "Expiration: March 15, 2026");
}

#[tokio::test]
async fn responses_carry_request_id_and_security_headers() {
    let app = TestApp::new();
    let request = axum::http::Request::builder()
        .uri("/")
        .header("x-request-id", "req-123")
        .body(axum::body::Body::empty())
        .unwrap();

    use tower::util::ServiceExt;
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.headers().get("x-request-id").unwrap(), "req-123");
    assert_eq!(
        response.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );
}

#[tokio::test]
async fn malformed_account_header_is_rejected() {
    let app = TestApp::new();
    let (status, _) = app
        .request(
            "GET",
            "/api/family-members",
            None,
            &[("x-account-id", "bad account!")],
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
