mod common;

use axum::http::StatusCode;
use common::{days_from_today, TestApp};
use serde_json::json;

#[tokio::test]
async fn registering_an_email_schedules_existing_prescriptions() {
    let app = TestApp::new();
    let member = app.create_member("Ana").await;
    app.create_prescription(&member, Some(&days_from_today(45)))
        .await;

    let (status, email) = app
        .post("/api/user-emails", json!({ "email": "Ana@Example.com" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(email["email"], "ana@example.com");

    let (_, alerts) = app.get("/api/alerts").await;
    let alerts = alerts.as_array().unwrap();
    assert_eq!(alerts.len(), 5);

    let dates: Vec<&str> = alerts
        .iter()
        .map(|a| a["alert_date"].as_str().unwrap())
        .collect();
    let mut sorted = dates.clone();
    sorted.sort();
    assert_eq!(dates, sorted);
}

#[tokio::test]
async fn scheduling_twice_is_idempotent() {
    let app = TestApp::new();
    app.post("/api/user-emails", json!({ "email": "ana@example.com" }))
        .await;
    let member = app.create_member("Ana").await;
    let rx = app
        .create_prescription(&member, Some(&days_from_today(45)))
        .await;
    let id = rx["id"].as_str().unwrap();

    let (status, first) = app
        .post(&format!("/api/prescriptions/{}/alerts", id), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["created"], 0);
    assert_eq!(first["alerts"].as_array().unwrap().len(), 5);

    let (_, second) = app
        .post(&format!("/api/prescriptions/{}/alerts", id), json!({}))
        .await;
    assert_eq!(second["created"], 0);
    assert_eq!(second["alerts"], first["alerts"]);
}

#[tokio::test]
async fn past_offsets_are_skipped() {
    let app = TestApp::new();
    app.post("/api/user-emails", json!({ "email": "ana@example.com" }))
        .await;
    let member = app.create_member("Ana").await;
    let rx = app
        .create_prescription(&member, Some(&days_from_today(3)))
        .await;

    let (_, alerts) = app
        .get(&format!("/api/alerts?prescription_id={}", rx["id"].as_str().unwrap()))
        .await;
    let offsets: Vec<i64> = alerts
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["days_before"].as_i64().unwrap())
        .collect();
    assert_eq!(offsets, vec![1, 0]);
}

#[tokio::test]
async fn duplicate_and_invalid_emails() {
    let app = TestApp::new();
    let (status, _) = app
        .post("/api/user-emails", json!({ "email": "ana@example.com" }))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .post("/api/user-emails", json!({ "email": "ana@example.com" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post("/api/user-emails", json!({ "email": "not-an-email" }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn pending_alerts_and_mark_sent() {
    let app = TestApp::new();
    app.post("/api/user-emails", json!({ "email": "ana@example.com" }))
        .await;
    let member = app.create_member("Ana").await;
    app.create_prescription(&member, Some(&days_from_today(0)))
        .await;

    let (status, pending) = app.get("/api/alerts/pending").await;
    assert_eq!(status, StatusCode::OK);
    let pending = pending.as_array().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0]["days_before"], 0);

    let alert_id = pending[0]["id"].as_str().unwrap();
    let (status, sent) = app
        .post(&format!("/api/alerts/{}/sent", alert_id), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sent["sent"], true);
    assert!(sent["sent_at"].is_string());

    let (_, pending) = app.get("/api/alerts/pending").await;
    assert!(pending.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn removing_an_email_drops_its_unsent_alerts() {
    let app = TestApp::new();
    let (_, email) = app
        .post("/api/user-emails", json!({ "email": "ana@example.com" }))
        .await;
    let member = app.create_member("Ana").await;
    app.create_prescription(&member, Some(&days_from_today(45)))
        .await;

    let (status, _) = app
        .delete(&format!("/api/user-emails/{}", email["id"].as_str().unwrap()))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, alerts) = app.get("/api/alerts").await;
    assert!(alerts.as_array().unwrap().is_empty());
    let (_, emails) = app.get("/api/user-emails").await;
    assert!(emails.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn deleting_a_prescription_removes_its_alerts() {
    let app = TestApp::new();
    app.post("/api/user-emails", json!({ "email": "ana@example.com" }))
        .await;
    let member = app.create_member("Ana").await;
    let rx = app
        .create_prescription(&member, Some(&days_from_today(45)))
        .await;

    app.delete(&format!("/api/prescriptions/{}", rx["id"].as_str().unwrap()))
        .await;
    let (_, alerts) = app.get("/api/alerts").await;
    assert!(alerts.as_array().unwrap().is_empty());
}
