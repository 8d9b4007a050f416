//! Rolling analytics computed on demand from the device and event tables.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use service_core::error::AppError;

use super::metrics::record_event_tracked;
use super::store::RxStore;
use crate::dtos::analytics::{
    DailyStats, DashboardResponse, DashboardSummary, Engagement, PlatformBreakdown,
    TrackEventRequest,
};
use crate::models::{
    analytics::UNKNOWN_PLATFORM, AnalyticsEvent, DeviceActivity, DeviceFilter, EventType,
};

pub const DAILY_BREAKDOWN_DAYS: i64 = 7;

/// Record one event and refresh the device row.
pub async fn track(store: &dyn RxStore, request: TrackEventRequest) -> Result<(), AppError> {
    let now = Utc::now();
    let platform = request
        .platform
        .map(|p| p.trim().to_lowercase())
        .filter(|p| !p.is_empty());

    store
        .record_device_activity(&DeviceActivity {
            device_id: request.device_id.clone(),
            platform: platform.clone(),
            app_version: request.app_version.clone(),
            seen_at: now,
        })
        .await?;

    let platform = platform.unwrap_or_else(|| UNKNOWN_PLATFORM.to_string());
    store
        .insert_event(&AnalyticsEvent {
            object_id: None,
            device_id: request.device_id,
            event_type: request.event_type,
            platform: platform.clone(),
            app_version: request.app_version,
            metadata: request.metadata,
            timestamp: now,
            date: now.date_naive(),
        })
        .await?;

    record_event_tracked(request.event_type, &platform);
    Ok(())
}

/// Midnight UTC at the start of `date`.
fn start_of(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(chrono::NaiveTime::MIN).and_utc()
}

/// Days of the breakdown, oldest first, ending at `today`.
pub fn breakdown_days(today: NaiveDate) -> Vec<NaiveDate> {
    (0..DAILY_BREAKDOWN_DAYS)
        .rev()
        .map(|offset| today - Duration::days(offset))
        .collect()
}

fn active_since(since: DateTime<Utc>) -> DeviceFilter {
    DeviceFilter {
        active_since: Some(since),
        ..Default::default()
    }
}

fn new_since(since: DateTime<Utc>) -> DeviceFilter {
    DeviceFilter {
        first_seen_from: Some(since),
        ..Default::default()
    }
}

fn on_platform(platform: &str) -> DeviceFilter {
    DeviceFilter {
        platform: Some(platform.to_string()),
        ..Default::default()
    }
}

/// Every window is anchored at `now`; nothing is pre-aggregated.
pub async fn build_dashboard(
    store: &dyn RxStore,
    now: DateTime<Utc>,
) -> Result<DashboardResponse, AppError> {
    let day_ago = now - Duration::days(1);
    let week_ago = now - Duration::days(7);
    let month_ago = now - Duration::days(30);

    let summary = DashboardSummary {
        total_downloads: store.count_devices(&DeviceFilter::default()).await?,
        daily_active_users: store.count_devices(&active_since(day_ago)).await?,
        weekly_active_users: store.count_devices(&active_since(week_ago)).await?,
        monthly_active_users: store.count_devices(&active_since(month_ago)).await?,
        new_users_this_week: store.count_devices(&new_since(week_ago)).await?,
        new_users_this_month: store.count_devices(&new_since(month_ago)).await?,
    };

    let platforms = PlatformBreakdown {
        ios: store.count_devices(&on_platform("ios")).await?,
        android: store.count_devices(&on_platform("android")).await?,
        web: store.count_devices(&on_platform("web")).await?,
    };

    let engagement = Engagement {
        ad_clicks_30d: store.count_events(EventType::AdClick, month_ago).await?,
        affiliate_clicks_30d: store
            .count_events(EventType::AffiliateClick, month_ago)
            .await?,
    };

    let mut daily_breakdown = Vec::with_capacity(DAILY_BREAKDOWN_DAYS as usize);
    for date in breakdown_days(now.date_naive()) {
        let new_users = store
            .count_devices(&DeviceFilter {
                first_seen_from: Some(start_of(date)),
                first_seen_before: Some(start_of(date + Duration::days(1))),
                ..Default::default()
            })
            .await?;
        daily_breakdown.push(DailyStats {
            date,
            active_users: store.count_active_devices_on(date).await?,
            new_users,
        });
    }

    Ok(DashboardResponse {
        summary,
        platforms,
        engagement,
        daily_breakdown,
        generated_at: now,
    })
}
