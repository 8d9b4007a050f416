//! HTTP handlers for optical-rx-service.

pub mod affiliates;
pub mod alerts;
pub mod analytics;
pub mod family;
pub mod health;
pub mod ocr;
pub mod prescriptions;
pub mod subscription;

use service_core::error::AppError;
use uuid::Uuid;

/// Identifiers are UUIDs; anything else is rejected before touching the store.
pub(crate) fn parse_id(kind: &str, raw: &str) -> Result<String, AppError> {
    Uuid::parse_str(raw.trim())
        .map(|id| id.to_string())
        .map_err(|_| AppError::bad_request(format!("Invalid {} id: '{}'", kind, raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_must_be_uuids() {
        let id = Uuid::new_v4().to_string();
        assert_eq!(parse_id("family member", &id).unwrap(), id);
        assert!(parse_id("family member", "42").is_err());
        assert!(parse_id("prescription", "").is_err());
    }
}
