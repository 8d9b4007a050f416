//! Free-tier creation limits.
//!
//! Count-then-compare: two concurrent creations can both pass. Accepted for
//! per-account usage where writes come from one user.

use chrono::Utc;
use service_core::error::AppError;

use super::metrics::record_limit_rejection;
use super::store::RxStore;
use crate::dtos::subscription::{UsageCount, UsageResponse};
use crate::models::UserSubscription;

pub const FREE_FAMILY_MEMBER_LIMIT: u64 = 2;
pub const FREE_PRESCRIPTION_LIMIT: u64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitedResource {
    FamilyMember,
    Prescription,
}

impl LimitedResource {
    pub fn free_limit(self) -> u64 {
        match self {
            LimitedResource::FamilyMember => FREE_FAMILY_MEMBER_LIMIT,
            LimitedResource::Prescription => FREE_PRESCRIPTION_LIMIT,
        }
    }

    fn label(self) -> &'static str {
        match self {
            LimitedResource::FamilyMember => "family_members",
            LimitedResource::Prescription => "prescriptions",
        }
    }

    fn noun(self) -> &'static str {
        match self {
            LimitedResource::FamilyMember => "family members",
            LimitedResource::Prescription => "prescriptions",
        }
    }
}

/// `None` means unlimited.
pub fn limit_for(resource: LimitedResource, premium: bool) -> Option<u64> {
    if premium {
        None
    } else {
        Some(resource.free_limit())
    }
}

pub fn can_add(current: u64, limit: Option<u64>) -> bool {
    limit.map_or(true, |limit| current < limit)
}

/// Pure gate: error when one more row would exceed the limit.
pub fn check_limit(
    resource: LimitedResource,
    current: u64,
    premium: bool,
) -> Result<(), AppError> {
    let limit = limit_for(resource, premium);
    if can_add(current, limit) {
        return Ok(());
    }
    record_limit_rejection(resource.label());
    Err(AppError::forbidden(format!(
        "Free tier limit reached: at most {} {}. Upgrade to premium for unlimited {}.",
        resource.free_limit(),
        resource.noun(),
        resource.noun()
    )))
}

/// The account's subscription, or the default free record.
pub async fn subscription_for(
    store: &dyn RxStore,
    account_id: &str,
) -> Result<UserSubscription, AppError> {
    Ok(store
        .find_subscription(account_id)
        .await?
        .unwrap_or_else(|| UserSubscription::free(account_id.to_string())))
}

async fn is_premium(store: &dyn RxStore, account_id: &str) -> Result<bool, AppError> {
    Ok(subscription_for(store, account_id)
        .await?
        .is_premium_active(Utc::now()))
}

async fn current_count(
    store: &dyn RxStore,
    account_id: &str,
    resource: LimitedResource,
) -> Result<u64, AppError> {
    match resource {
        LimitedResource::FamilyMember => store.count_members(account_id).await,
        LimitedResource::Prescription => store.count_prescriptions(account_id, None).await,
    }
}

pub async fn ensure_can_create(
    store: &dyn RxStore,
    account_id: &str,
    resource: LimitedResource,
) -> Result<(), AppError> {
    let premium = is_premium(store, account_id).await?;
    let current = current_count(store, account_id, resource).await?;
    check_limit(resource, current, premium)
}

pub async fn usage(store: &dyn RxStore, account_id: &str) -> Result<UsageResponse, AppError> {
    let premium = is_premium(store, account_id).await?;
    let members = UsageCount {
        current: current_count(store, account_id, LimitedResource::FamilyMember).await?,
        limit: limit_for(LimitedResource::FamilyMember, premium),
    };
    let prescriptions = UsageCount {
        current: current_count(store, account_id, LimitedResource::Prescription).await?,
        limit: limit_for(LimitedResource::Prescription, premium),
    };

    Ok(UsageResponse {
        is_premium: premium,
        can_add_family_member: can_add(members.current, members.limit),
        can_add_prescription: can_add(prescriptions.current, prescriptions.limit),
        family_members: members,
        prescriptions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn free_tier_allows_up_to_limit() {
        assert!(check_limit(LimitedResource::FamilyMember, 0, false).is_ok());
        assert!(check_limit(LimitedResource::FamilyMember, 1, false).is_ok());
        let err = check_limit(LimitedResource::FamilyMember, 2, false).unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);

        assert!(check_limit(LimitedResource::Prescription, 4, false).is_ok());
        assert!(check_limit(LimitedResource::Prescription, 5, false).is_err());
    }

    #[test]
    fn premium_is_unlimited() {
        assert!(check_limit(LimitedResource::Prescription, 500, true).is_ok());
        assert_eq!(limit_for(LimitedResource::Prescription, true), None);
    }

    #[test]
    fn rejection_names_the_limit() {
        let err = check_limit(LimitedResource::Prescription, 5, false).unwrap_err();
        assert!(err.to_string().contains("at most 5 prescriptions"));
    }
}
