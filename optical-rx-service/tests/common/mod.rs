#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use optical_rx_service::{
    build_router, config::RxConfig, services::MemoryStore, services::OcrService, AppState,
};
use serde_json::Value;
use std::sync::Arc;
use tower::util::ServiceExt;

pub const ADMIN_KEY: &str = optical_rx_service::config::DEFAULT_ADMIN_KEY;

pub struct TestApp {
    pub router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(RxConfig::in_memory())
    }

    pub fn with_config(config: RxConfig) -> Self {
        Self::with_ocr(config, OcrService::disabled())
    }

    pub fn with_ocr(config: RxConfig, ocr: OcrService) -> Self {
        let state = AppState::new(config, Arc::new(MemoryStore::new()), ocr);
        Self {
            router: build_router(state),
        }
    }

    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request("GET", uri, None, &[]).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request("POST", uri, Some(body), &[]).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request("PUT", uri, Some(body), &[]).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.request("DELETE", uri, None, &[]).await
    }

    pub async fn admin(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.request(method, uri, body, &[("x-admin-key", ADMIN_KEY)])
            .await
    }

    pub async fn create_member(&self, name: &str) -> String {
        let (status, body) = self
            .post(
                "/api/family-members",
                serde_json::json!({ "name": name, "relationship": "self" }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "create member failed: {}", body);
        body["id"].as_str().unwrap().to_string()
    }

    pub async fn create_prescription(&self, member_id: &str, expiry_date: Option<&str>) -> Value {
        let mut payload = serde_json::json!({
            "family_member_id": member_id,
            "rx_type": "eyeglass",
            "image_base64": "aGVsbG8=",
        });
        if let Some(expiry) = expiry_date {
            payload["expiry_date"] = Value::String(expiry.to_string());
        }
        let (status, body) = self.post("/api/prescriptions", payload).await;
        assert_eq!(status, StatusCode::OK, "create prescription failed: {}", body);
        body
    }
}

/// `YYYY-MM-DD`, `days` from today (UTC).
pub fn days_from_today(days: i64) -> String {
    (chrono::Utc::now().date_naive() + chrono::Duration::days(days)).to_string()
}
