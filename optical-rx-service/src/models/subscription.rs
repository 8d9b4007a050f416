use chrono::{DateTime, Duration, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use super::opt_chrono_datetime_as_bson_datetime;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlanType {
    Monthly,
    Yearly,
}

impl PlanType {
    pub fn duration(self) -> Duration {
        match self {
            PlanType::Monthly => Duration::days(30),
            PlanType::Yearly => Duration::days(365),
        }
    }
}

/// Per-account subscription state gating the free-tier limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSubscription {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub object_id: Option<ObjectId>,
    pub account_id: String,
    pub is_premium: bool,
    #[serde(default)]
    pub subscription_type: Option<PlanType>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "opt_chrono_datetime_as_bson_datetime"
    )]
    pub subscribed_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "opt_chrono_datetime_as_bson_datetime"
    )]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl UserSubscription {
    pub fn free(account_id: String) -> Self {
        Self {
            object_id: None,
            account_id,
            is_premium: false,
            subscription_type: None,
            subscribed_at: None,
            expires_at: None,
            updated_at: Utc::now(),
        }
    }

    pub fn upgrade(&mut self, plan: PlanType, now: DateTime<Utc>) {
        self.is_premium = true;
        self.subscription_type = Some(plan);
        self.subscribed_at = Some(now);
        self.expires_at = Some(now + plan.duration());
        self.updated_at = now;
    }

    pub fn cancel(&mut self, now: DateTime<Utc>) {
        self.is_premium = false;
        self.subscription_type = None;
        self.subscribed_at = None;
        self.expires_at = None;
        self.updated_at = now;
    }

    /// Premium flag honouring the expiry timestamp.
    pub fn is_premium_active(&self, now: DateTime<Utc>) -> bool {
        self.is_premium && self.expires_at.map_or(true, |expires| expires > now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_record_is_free() {
        let sub = UserSubscription::free("acct".to_string());
        assert!(!sub.is_premium_active(Utc::now()));
        assert!(sub.subscription_type.is_none());
    }

    #[test]
    fn upgrade_sets_plan_window() {
        let now = Utc::now();
        let mut sub = UserSubscription::free("acct".to_string());
        sub.upgrade(PlanType::Yearly, now);

        assert!(sub.is_premium_active(now));
        assert_eq!(sub.expires_at, Some(now + Duration::days(365)));
    }

    #[test]
    fn lapsed_premium_is_treated_as_free() {
        let now = Utc::now();
        let mut sub = UserSubscription::free("acct".to_string());
        sub.upgrade(PlanType::Monthly, now - Duration::days(31));

        assert!(sub.is_premium);
        assert!(!sub.is_premium_active(now));
    }

    #[test]
    fn cancel_clears_plan() {
        let now = Utc::now();
        let mut sub = UserSubscription::free("acct".to_string());
        sub.upgrade(PlanType::Monthly, now);
        sub.cancel(now);

        assert!(!sub.is_premium);
        assert!(sub.expires_at.is_none());
    }
}
