use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{PlanType, UserSubscription};

#[derive(Debug, Deserialize)]
pub struct UpgradeRequest {
    pub subscription_type: PlanType,
}

#[derive(Debug, Serialize)]
pub struct SubscriptionResponse {
    pub is_premium: bool,
    pub subscription_type: Option<PlanType>,
    pub subscribed_at: Option<DateTime<Utc>>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl SubscriptionResponse {
    /// A lapsed premium record is reported as the free tier.
    pub fn from_record(sub: UserSubscription, now: DateTime<Utc>) -> Self {
        if sub.is_premium_active(now) {
            Self {
                is_premium: true,
                subscription_type: sub.subscription_type,
                subscribed_at: sub.subscribed_at,
                expires_at: sub.expires_at,
            }
        } else {
            Self {
                is_premium: false,
                subscription_type: None,
                subscribed_at: None,
                expires_at: None,
            }
        }
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct UsageCount {
    pub current: u64,
    /// `None` (JSON null) means unlimited.
    pub limit: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct UsageResponse {
    pub is_premium: bool,
    pub family_members: UsageCount,
    pub prescriptions: UsageCount,
    pub can_add_family_member: bool,
    pub can_add_prescription: bool,
}
