mod common;

use axum::http::StatusCode;
use common::TestApp;
use optical_rx_service::config::RxConfig;
use serde_json::json;

#[tokio::test]
async fn track_then_dashboard() {
    let app = TestApp::new();
    for (device, platform, event) in [
        ("device-1", "ios", "app_open"),
        ("device-1", "ios", "ad_click"),
        ("device-2", "android", "affiliate_click"),
    ] {
        let (status, body) = app
            .post(
                "/api/analytics/track",
                json!({
                    "device_id": device,
                    "event_type": event,
                    "platform": platform,
                    "app_version": "1.2.0",
                }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "tracked");
    }

    let (status, dashboard) = app.admin("GET", "/api/analytics/dashboard", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(dashboard["summary"]["total_downloads"], 2);
    assert_eq!(dashboard["summary"]["daily_active_users"], 2);
    assert_eq!(dashboard["summary"]["new_users_this_week"], 2);
    assert_eq!(dashboard["platforms"]["ios"], 1);
    assert_eq!(dashboard["platforms"]["android"], 1);
    assert_eq!(dashboard["engagement"]["ad_clicks_30d"], 1);
    assert_eq!(dashboard["engagement"]["affiliate_clicks_30d"], 1);

    let breakdown = dashboard["daily_breakdown"].as_array().unwrap();
    assert_eq!(breakdown.len(), 7);
    assert_eq!(breakdown[6]["active_users"], 2);
    assert!(breakdown[0]["date"].as_str().unwrap() < breakdown[6]["date"].as_str().unwrap());

    // No PHI counts leak into the dashboard.
    assert!(dashboard.get("family_members").is_none());
    assert!(dashboard.get("total_prescriptions").is_none());
}

#[tokio::test]
async fn unknown_event_type_is_rejected() {
    let app = TestApp::new();
    let (status, _) = app
        .post(
            "/api/analytics/track",
            json!({ "device_id": "device-1", "event_type": "purchase" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn ingest_is_rate_limited_per_ip() {
    let mut config = RxConfig::in_memory();
    config.analytics.rate_limit_per_min = 3;
    let app = TestApp::with_config(config);
    let body = json!({ "device_id": "device-1", "event_type": "app_open" });

    for _ in 0..3 {
        let (status, _) = app
            .request(
                "POST",
                "/api/analytics/track",
                Some(body.clone()),
                &[("x-forwarded-for", "203.0.113.7")],
            )
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, _) = app
        .request(
            "POST",
            "/api/analytics/track",
            Some(body.clone()),
            &[("x-forwarded-for", "203.0.113.7")],
        )
        .await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);

    let (status, _) = app
        .request(
            "POST",
            "/api/analytics/track",
            Some(body),
            &[("x-forwarded-for", "198.51.100.1")],
        )
        .await;
    assert_eq!(status, StatusCode::OK);
}
