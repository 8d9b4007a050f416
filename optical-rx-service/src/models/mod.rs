pub mod affiliate;
pub mod alert;
pub mod analytics;
pub mod family_member;
pub mod prescription;
pub mod subscription;

pub use affiliate::{Affiliate, AffiliateCategory, AffiliateFields};
pub use alert::{ExpiryAlert, UserEmail};
pub use analytics::{AnalyticsEvent, Device, DeviceActivity, DeviceFilter, EventType};
pub use family_member::FamilyMember;
pub use prescription::{Prescription, RxType};
pub use subscription::{PlanType, UserSubscription};

/// Account used when a request carries no `X-Account-Id`.
pub const DEFAULT_ACCOUNT_ID: &str = "default_user";

pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

// Helper module for optional DateTime<Utc> as BSON DateTime
pub(crate) mod opt_chrono_datetime_as_bson_datetime {
    use chrono::{DateTime, Utc};
    use mongodb::bson;
    use serde::{self, Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(date: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(dt) => {
                let bson_dt = bson::DateTime::from_chrono(*dt);
                bson_dt.serialize(serializer)
            }
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let opt: Option<bson::DateTime> = Option::deserialize(deserializer)?;
        Ok(opt.map(|dt| dt.to_chrono()))
    }
}
