mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn free_tier_allows_two_members() {
    let app = TestApp::new();
    app.create_member("Ana").await;
    app.create_member("Bo").await;

    let (status, body) = app
        .post(
            "/api/family-members",
            json!({ "name": "Cy", "relationship": "child" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"].as_str().unwrap().contains("at most 2"));
}

#[tokio::test]
async fn free_tier_allows_five_prescriptions() {
    let app = TestApp::new();
    let member = app.create_member("Ana").await;
    for _ in 0..5 {
        app.create_prescription(&member, None).await;
    }

    let (status, _) = app
        .post(
            "/api/prescriptions",
            json!({
                "family_member_id": member,
                "rx_type": "eyeglass",
                "image_base64": "aGVsbG8=",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, usage) = app.get("/api/subscription/usage").await;
    assert_eq!(usage["is_premium"], false);
    assert_eq!(usage["prescriptions"]["current"], 5);
    assert_eq!(usage["prescriptions"]["limit"], 5);
    assert_eq!(usage["can_add_prescription"], false);
    assert_eq!(usage["can_add_family_member"], true);
}

#[tokio::test]
async fn premium_lifts_limits_and_cancel_restores_them() {
    let app = TestApp::new();
    let (status, sub) = app
        .post(
            "/api/subscription/upgrade",
            json!({ "subscription_type": "monthly" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sub["is_premium"], true);
    assert_eq!(sub["subscription_type"], "monthly");
    assert!(sub["expires_at"].is_string());

    for name in ["Ana", "Bo", "Cy"] {
        app.create_member(name).await;
    }

    let (_, usage) = app.get("/api/subscription/usage").await;
    assert_eq!(usage["family_members"]["current"], 3);
    assert!(usage["family_members"]["limit"].is_null());

    let (_, sub) = app.post("/api/subscription/cancel", json!({})).await;
    assert_eq!(sub["is_premium"], false);

    let (status, _) = app
        .post(
            "/api/family-members",
            json!({ "name": "Di", "relationship": "child" }),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn default_subscription_is_free() {
    let app = TestApp::new();
    let (status, sub) = app.get("/api/subscription").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(sub["is_premium"], false);
    assert!(sub["subscription_type"].is_null());
    assert!(sub["expires_at"].is_null());
}

#[tokio::test]
async fn limits_are_counted_per_account() {
    let app = TestApp::new();
    app.create_member("Ana").await;
    app.create_member("Bo").await;

    let (status, _) = app
        .request(
            "POST",
            "/api/family-members",
            Some(json!({ "name": "Cy", "relationship": "self" })),
            &[("x-account-id", "second-household")],
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn unknown_plan_is_rejected() {
    let app = TestApp::new();
    let (status, _) = app
        .post(
            "/api/subscription/upgrade",
            json!({ "subscription_type": "lifetime" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}
