//! Storage seam. Handlers and services only ever talk to `dyn RxStore`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use service_core::error::AppError;

use crate::models::{
    Affiliate, AnalyticsEvent, DeviceActivity, DeviceFilter, EventType, ExpiryAlert,
    FamilyMember, Prescription, RxType, UserEmail, UserSubscription,
};

/// Which alerts a bulk delete removes.
#[derive(Debug, Clone)]
pub enum AlertScope {
    /// Every alert, sent or not, for these prescriptions.
    Prescriptions(Vec<String>),
    UnsentForPrescription(String),
    UnsentForEmail(String),
}

#[async_trait]
pub trait RxStore: Send + Sync {
    async fn health_check(&self) -> Result<(), AppError>;

    // Family members
    async fn insert_member(&self, member: &FamilyMember) -> Result<(), AppError>;
    async fn list_members(&self, account_id: &str) -> Result<Vec<FamilyMember>, AppError>;
    async fn find_member(&self, account_id: &str, id: &str)
        -> Result<Option<FamilyMember>, AppError>;
    async fn replace_member(&self, member: &FamilyMember) -> Result<bool, AppError>;
    async fn delete_member(&self, account_id: &str, id: &str) -> Result<bool, AppError>;
    async fn count_members(&self, account_id: &str) -> Result<u64, AppError>;

    // Prescriptions
    async fn insert_prescription(&self, rx: &Prescription) -> Result<(), AppError>;
    async fn list_prescriptions(
        &self,
        account_id: &str,
        family_member_id: Option<&str>,
    ) -> Result<Vec<Prescription>, AppError>;
    async fn find_prescription(
        &self,
        account_id: &str,
        id: &str,
    ) -> Result<Option<Prescription>, AppError>;
    async fn replace_prescription(&self, rx: &Prescription) -> Result<bool, AppError>;
    async fn delete_prescription(&self, account_id: &str, id: &str) -> Result<bool, AppError>;
    /// Removes every prescription of a member, returning the removed ids.
    async fn delete_member_prescriptions(
        &self,
        account_id: &str,
        family_member_id: &str,
    ) -> Result<Vec<String>, AppError>;
    async fn count_prescriptions(
        &self,
        account_id: &str,
        rx_type: Option<RxType>,
    ) -> Result<u64, AppError>;

    // Subscriptions
    async fn find_subscription(&self, account_id: &str)
        -> Result<Option<UserSubscription>, AppError>;
    async fn save_subscription(&self, sub: &UserSubscription) -> Result<(), AppError>;

    // Analytics
    async fn record_device_activity(&self, activity: &DeviceActivity) -> Result<(), AppError>;
    async fn insert_event(&self, event: &AnalyticsEvent) -> Result<(), AppError>;
    async fn count_devices(&self, filter: &DeviceFilter) -> Result<u64, AppError>;
    async fn count_events(
        &self,
        event_type: EventType,
        since: DateTime<Utc>,
    ) -> Result<u64, AppError>;
    /// Distinct devices with at least one event in the given day bucket.
    async fn count_active_devices_on(&self, date: NaiveDate) -> Result<u64, AppError>;

    // Affiliates
    /// Ordered by `order`, ties by creation time.
    async fn list_affiliates(&self, active_only: bool) -> Result<Vec<Affiliate>, AppError>;
    async fn count_affiliates(&self) -> Result<u64, AppError>;
    async fn insert_affiliates(&self, partners: &[Affiliate]) -> Result<(), AppError>;
    /// Insert the partners whose `id` is not stored yet; returns how many were added.
    async fn seed_affiliates(&self, partners: &[Affiliate]) -> Result<u64, AppError>;
    async fn find_affiliate(&self, id: &str) -> Result<Option<Affiliate>, AppError>;
    async fn replace_affiliate(&self, partner: &Affiliate) -> Result<bool, AppError>;
    async fn delete_affiliate(&self, id: &str) -> Result<bool, AppError>;

    // Registered emails
    async fn list_emails(&self, account_id: &str) -> Result<Vec<UserEmail>, AppError>;
    async fn find_email(&self, account_id: &str, email: &str)
        -> Result<Option<UserEmail>, AppError>;
    async fn insert_email(&self, email: &UserEmail) -> Result<(), AppError>;
    async fn delete_email(&self, account_id: &str, id: &str)
        -> Result<Option<UserEmail>, AppError>;

    // Expiry alerts
    /// Ordered by `alert_date`.
    async fn list_alerts(
        &self,
        account_id: &str,
        prescription_id: Option<&str>,
    ) -> Result<Vec<ExpiryAlert>, AppError>;
    async fn insert_alerts(&self, alerts: &[ExpiryAlert]) -> Result<(), AppError>;
    /// Unsent alerts due on or before `today`.
    async fn list_due_alerts(
        &self,
        account_id: &str,
        today: NaiveDate,
    ) -> Result<Vec<ExpiryAlert>, AppError>;
    async fn mark_alert_sent(
        &self,
        account_id: &str,
        id: &str,
        sent_at: DateTime<Utc>,
    ) -> Result<Option<ExpiryAlert>, AppError>;
    async fn delete_alerts(&self, account_id: &str, scope: AlertScope) -> Result<u64, AppError>;
}
