use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::EventType;

#[derive(Debug, Deserialize, Validate)]
pub struct TrackEventRequest {
    #[validate(length(min = 1, max = 128, message = "device_id must be 1-128 characters"))]
    pub device_id: String,
    pub event_type: EventType,
    #[validate(length(max = 32))]
    pub platform: Option<String>,
    #[validate(length(max = 32))]
    pub app_version: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub struct TrackResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct DashboardSummary {
    pub total_downloads: u64,
    pub daily_active_users: u64,
    pub weekly_active_users: u64,
    pub monthly_active_users: u64,
    pub new_users_this_week: u64,
    pub new_users_this_month: u64,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct PlatformBreakdown {
    pub ios: u64,
    pub android: u64,
    pub web: u64,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Engagement {
    pub ad_clicks_30d: u64,
    pub affiliate_clicks_30d: u64,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct DailyStats {
    pub date: NaiveDate,
    pub active_users: u64,
    pub new_users: u64,
}

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub summary: DashboardSummary,
    pub platforms: PlatformBreakdown,
    pub engagement: Engagement,
    pub daily_breakdown: Vec<DailyStats>,
    pub generated_at: DateTime<Utc>,
}
