use chrono::{DateTime, NaiveDate, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

pub const UNKNOWN_PLATFORM: &str = "unknown";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    AppOpen,
    AdClick,
    AffiliateClick,
}

impl EventType {
    pub fn as_str(self) -> &'static str {
        match self {
            EventType::AppOpen => "app_open",
            EventType::AdClick => "ad_click",
            EventType::AffiliateClick => "affiliate_click",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row per installed app instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub object_id: Option<ObjectId>,
    pub device_id: String,
    pub platform: String,
    #[serde(default)]
    pub app_version: Option<String>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub first_seen: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub last_active: DateTime<Utc>,
}

/// Append-only event log entry, bucketed by UTC day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub object_id: Option<ObjectId>,
    pub device_id: String,
    pub event_type: EventType,
    pub platform: String,
    #[serde(default)]
    pub app_version: Option<String>,
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub timestamp: DateTime<Utc>,
    pub date: NaiveDate,
}

/// Device upsert input. `platform`/`app_version` only overwrite when present.
#[derive(Debug, Clone)]
pub struct DeviceActivity {
    pub device_id: String,
    pub platform: Option<String>,
    pub app_version: Option<String>,
    pub seen_at: DateTime<Utc>,
}

/// Conjunctive device filter; `None` fields do not constrain.
#[derive(Debug, Clone, Default)]
pub struct DeviceFilter {
    pub active_since: Option<DateTime<Utc>>,
    pub first_seen_from: Option<DateTime<Utc>>,
    pub first_seen_before: Option<DateTime<Utc>>,
    pub platform: Option<String>,
}

impl DeviceFilter {
    pub fn matches(&self, device: &Device) -> bool {
        self.active_since.map_or(true, |t| device.last_active >= t)
            && self.first_seen_from.map_or(true, |t| device.first_seen >= t)
            && self.first_seen_before.map_or(true, |t| device.first_seen < t)
            && self
                .platform
                .as_deref()
                .map_or(true, |p| device.platform == p)
    }
}
