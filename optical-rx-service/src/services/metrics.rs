//! Metrics collection for optical-rx-service.
//!
//! HTTP request metrics come from the shared middleware; the counters here
//! cover analytics ingest, the limit gate and the OCR bridge.

use metrics::counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

use crate::models::EventType;

pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder. Safe to call more than once.
pub fn init_metrics() {
    if METRICS_HANDLE.get().is_some() {
        return;
    }
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            let _ = METRICS_HANDLE.set(handle);
        }
        Err(e) => tracing::warn!("Failed to install Prometheus recorder: {}", e),
    }
}

/// Get metrics output in Prometheus text format.
pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string())
}

/// Platform label restricted to a closed set; anything else is `other`.
pub fn platform_label(platform: &str) -> &'static str {
    match platform {
        "ios" => "ios",
        "android" => "android",
        "web" => "web",
        _ => "other",
    }
}

pub fn record_event_tracked(event_type: EventType, platform: &str) {
    counter!(
        "analytics_events_tracked_total",
        "event_type" => event_type.as_str(),
        "platform" => platform_label(platform)
    )
    .increment(1);
}

pub fn record_limit_rejection(resource: &'static str) {
    counter!("limit_gate_rejections_total", "resource" => resource).increment(1);
}

pub fn record_ocr_request(outcome: &'static str) {
    counter!("ocr_requests_total", "outcome" => outcome).increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_label_is_bounded() {
        assert_eq!(platform_label("ios"), "ios");
        assert_eq!(platform_label("android"), "android");
        assert_eq!(platform_label("web"), "web");
        assert_eq!(platform_label("unknown"), "other");
        assert_eq!(platform_label("x".repeat(32).as_str()), "other");
    }
}
