mod common;

use axum::http::StatusCode;
use common::{days_from_today, TestApp};
use serde_json::json;

#[tokio::test]
async fn unknown_member_is_a_client_error() {
    let app = TestApp::new();
    let (status, _) = app
        .post(
            "/api/prescriptions",
            json!({
                "family_member_id": uuid::Uuid::new_v4().to_string(),
                "rx_type": "contact",
                "image_base64": "aGVsbG8=",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .post(
            "/api/prescriptions",
            json!({
                "family_member_id": "nope",
                "rx_type": "contact",
                "image_base64": "aGVsbG8=",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn expiry_defaults_to_one_year_after_date_taken() {
    let app = TestApp::new();
    let member = app.create_member("Ana").await;

    let (status, body) = app
        .post(
            "/api/prescriptions",
            json!({
                "family_member_id": member,
                "rx_type": "eyeglass",
                "image_base64": "aGVsbG8=",
                "date_taken": "2024-02-29",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["date_taken"], "2024-02-29");
    assert_eq!(body["expiry_date"], "2025-02-28");
    assert_eq!(body["notes"], "");
}

#[tokio::test]
async fn malformed_date_is_bad_request() {
    let app = TestApp::new();
    let member = app.create_member("Ana").await;

    let (status, body) = app
        .post(
            "/api/prescriptions",
            json!({
                "family_member_id": member,
                "rx_type": "eyeglass",
                "image_base64": "aGVsbG8=",
                "expiry_date": "12/31/2025",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("expiry_date"));
}

#[tokio::test]
async fn filter_update_and_delete() {
    let app = TestApp::new();
    let ana = app.create_member("Ana").await;
    let bo = app.create_member("Bo").await;
    let rx = app.create_prescription(&ana, None).await;
    app.create_prescription(&bo, None).await;

    let (_, filtered) = app
        .get(&format!("/api/prescriptions?family_member_id={}", ana))
        .await;
    assert_eq!(filtered.as_array().unwrap().len(), 1);

    let id = rx["id"].as_str().unwrap();
    let (status, updated) = app
        .put(
            &format!("/api/prescriptions/{}", id),
            json!({ "notes": "new lenses", "rx_type": "contact" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["notes"], "new lenses");
    assert_eq!(updated["rx_type"], "contact");

    let (status, _) = app
        .put(&format!("/api/prescriptions/{}", id), json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.delete(&format!("/api/prescriptions/{}", id)).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app.get(&format!("/api/prescriptions/{}", id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn stats_count_by_type() {
    let app = TestApp::new();
    let member = app.create_member("Ana").await;
    app.create_prescription(&member, None).await;
    app.post(
        "/api/prescriptions",
        json!({
            "family_member_id": member,
            "rx_type": "contact",
            "image_base64": "aGVsbG8=",
        }),
    )
    .await;

    let (status, stats) = app.get("/api/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["family_members"], 1);
    assert_eq!(stats["total_prescriptions"], 2);
    assert_eq!(stats["eyeglass_prescriptions"], 1);
    assert_eq!(stats["contact_prescriptions"], 1);
}

#[tokio::test]
async fn changing_expiry_reschedules_alerts() {
    let app = TestApp::new();
    let member = app.create_member("Ana").await;
    app.post("/api/user-emails", json!({ "email": "ana@example.com" }))
        .await;

    let rx = app
        .create_prescription(&member, Some(&days_from_today(60)))
        .await;
    let id = rx["id"].as_str().unwrap();

    let new_expiry = days_from_today(90);
    let (status, _) = app
        .put(
            &format!("/api/prescriptions/{}", id),
            json!({ "expiry_date": new_expiry }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, alerts) = app
        .get(&format!("/api/alerts?prescription_id={}", id))
        .await;
    let alerts = alerts.as_array().unwrap();
    assert_eq!(alerts.len(), 5);
    assert!(alerts.iter().all(|a| a["expiry_date"] == new_expiry.as_str()));
}

#[tokio::test]
async fn renewed_expiry_gets_every_offset_after_a_sent_alert() {
    let app = TestApp::new();
    let member = app.create_member("Ana").await;
    app.post("/api/user-emails", json!({ "email": "ana@example.com" }))
        .await;

    let today = days_from_today(0);
    let rx = app.create_prescription(&member, Some(&today)).await;
    let id = rx["id"].as_str().unwrap();

    let (_, pending) = app.get("/api/alerts/pending").await;
    let due = pending.as_array().unwrap();
    assert_eq!(due.len(), 1);
    let alert_id = due[0]["id"].as_str().unwrap();
    let (status, _) = app
        .post(&format!("/api/alerts/{}/sent", alert_id), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);

    let renewed = days_from_today(365);
    let (status, _) = app
        .put(
            &format!("/api/prescriptions/{}", id),
            json!({ "expiry_date": renewed }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, alerts) = app
        .get(&format!("/api/alerts?prescription_id={}", id))
        .await;
    let alerts = alerts.as_array().unwrap();

    let mut offsets: Vec<i64> = alerts
        .iter()
        .filter(|a| a["expiry_date"] == renewed.as_str())
        .map(|a| a["days_before"].as_i64().unwrap())
        .collect();
    offsets.sort();
    assert_eq!(offsets, vec![0, 1, 7, 14, 30]);

    // The sent alert for the old expiry is kept as history.
    assert!(alerts
        .iter()
        .any(|a| a["expiry_date"] == today.as_str() && a["sent"] == true));
}
