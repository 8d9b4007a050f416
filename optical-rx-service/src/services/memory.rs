//! In-process store for local runs and tests.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use service_core::error::AppError;
use std::collections::HashSet;
use tokio::sync::RwLock;

use super::store::{AlertScope, RxStore};
use crate::models::{
    affiliate::sort_for_display, analytics::UNKNOWN_PLATFORM, Affiliate, AnalyticsEvent, Device,
    DeviceActivity, DeviceFilter, EventType, ExpiryAlert, FamilyMember, Prescription, RxType,
    UserEmail, UserSubscription,
};

#[derive(Default)]
struct Tables {
    members: Vec<FamilyMember>,
    prescriptions: Vec<Prescription>,
    subscriptions: Vec<UserSubscription>,
    devices: Vec<Device>,
    events: Vec<AnalyticsEvent>,
    affiliates: Vec<Affiliate>,
    emails: Vec<UserEmail>,
    alerts: Vec<ExpiryAlert>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn replace_where<T: Clone>(rows: &mut [T], row: &T, matches: impl Fn(&T) -> bool) -> bool {
    match rows.iter_mut().find(|r| matches(&**r)) {
        Some(slot) => {
            *slot = row.clone();
            true
        }
        None => false,
    }
}

fn remove_where<T>(rows: &mut Vec<T>, matches: impl Fn(&T) -> bool) -> u64 {
    let before = rows.len();
    rows.retain(|r| !matches(r));
    (before - rows.len()) as u64
}

#[async_trait]
impl RxStore for MemoryStore {
    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }

    async fn insert_member(&self, member: &FamilyMember) -> Result<(), AppError> {
        self.tables.write().await.members.push(member.clone());
        Ok(())
    }

    async fn list_members(&self, account_id: &str) -> Result<Vec<FamilyMember>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .members
            .iter()
            .filter(|m| m.account_id == account_id)
            .cloned()
            .collect())
    }

    async fn find_member(
        &self,
        account_id: &str,
        id: &str,
    ) -> Result<Option<FamilyMember>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .members
            .iter()
            .find(|m| m.account_id == account_id && m.id == id)
            .cloned())
    }

    async fn replace_member(&self, member: &FamilyMember) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        Ok(replace_where(&mut tables.members, member, |m| {
            m.account_id == member.account_id && m.id == member.id
        }))
    }

    async fn delete_member(&self, account_id: &str, id: &str) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        Ok(remove_where(&mut tables.members, |m| m.account_id == account_id && m.id == id) > 0)
    }

    async fn count_members(&self, account_id: &str) -> Result<u64, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.members.iter().filter(|m| m.account_id == account_id).count() as u64)
    }

    async fn insert_prescription(&self, rx: &Prescription) -> Result<(), AppError> {
        self.tables.write().await.prescriptions.push(rx.clone());
        Ok(())
    }

    async fn list_prescriptions(
        &self,
        account_id: &str,
        family_member_id: Option<&str>,
    ) -> Result<Vec<Prescription>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .prescriptions
            .iter()
            .filter(|rx| rx.account_id == account_id)
            .filter(|rx| family_member_id.map_or(true, |m| rx.family_member_id == m))
            .cloned()
            .collect())
    }

    async fn find_prescription(
        &self,
        account_id: &str,
        id: &str,
    ) -> Result<Option<Prescription>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .prescriptions
            .iter()
            .find(|rx| rx.account_id == account_id && rx.id == id)
            .cloned())
    }

    async fn replace_prescription(&self, rx: &Prescription) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        Ok(replace_where(&mut tables.prescriptions, rx, |r| {
            r.account_id == rx.account_id && r.id == rx.id
        }))
    }

    async fn delete_prescription(&self, account_id: &str, id: &str) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        Ok(remove_where(&mut tables.prescriptions, |rx| {
            rx.account_id == account_id && rx.id == id
        }) > 0)
    }

    async fn delete_member_prescriptions(
        &self,
        account_id: &str,
        family_member_id: &str,
    ) -> Result<Vec<String>, AppError> {
        let mut tables = self.tables.write().await;
        let owned = |rx: &Prescription| {
            rx.account_id == account_id && rx.family_member_id == family_member_id
        };
        let ids = tables
            .prescriptions
            .iter()
            .filter(|&rx| owned(rx))
            .map(|rx| rx.id.clone())
            .collect();
        remove_where(&mut tables.prescriptions, owned);
        Ok(ids)
    }

    async fn count_prescriptions(
        &self,
        account_id: &str,
        rx_type: Option<RxType>,
    ) -> Result<u64, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .prescriptions
            .iter()
            .filter(|rx| rx.account_id == account_id)
            .filter(|rx| rx_type.map_or(true, |t| rx.rx_type == t))
            .count() as u64)
    }

    async fn find_subscription(
        &self,
        account_id: &str,
    ) -> Result<Option<UserSubscription>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .subscriptions
            .iter()
            .find(|s| s.account_id == account_id)
            .cloned())
    }

    async fn save_subscription(&self, sub: &UserSubscription) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        if !replace_where(&mut tables.subscriptions, sub, |s| s.account_id == sub.account_id) {
            tables.subscriptions.push(sub.clone());
        }
        Ok(())
    }

    async fn record_device_activity(&self, activity: &DeviceActivity) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        match tables
            .devices
            .iter_mut()
            .find(|d| d.device_id == activity.device_id)
        {
            Some(device) => {
                device.last_active = activity.seen_at;
                if let Some(platform) = &activity.platform {
                    device.platform = platform.clone();
                }
                if activity.app_version.is_some() {
                    device.app_version = activity.app_version.clone();
                }
            }
            None => tables.devices.push(Device {
                object_id: None,
                device_id: activity.device_id.clone(),
                platform: activity
                    .platform
                    .clone()
                    .unwrap_or_else(|| UNKNOWN_PLATFORM.to_string()),
                app_version: activity.app_version.clone(),
                first_seen: activity.seen_at,
                last_active: activity.seen_at,
            }),
        }
        Ok(())
    }

    async fn insert_event(&self, event: &AnalyticsEvent) -> Result<(), AppError> {
        self.tables.write().await.events.push(event.clone());
        Ok(())
    }

    async fn count_devices(&self, filter: &DeviceFilter) -> Result<u64, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.devices.iter().filter(|d| filter.matches(d)).count() as u64)
    }

    async fn count_events(
        &self,
        event_type: EventType,
        since: DateTime<Utc>,
    ) -> Result<u64, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .events
            .iter()
            .filter(|e| e.event_type == event_type && e.timestamp >= since)
            .count() as u64)
    }

    async fn count_active_devices_on(&self, date: NaiveDate) -> Result<u64, AppError> {
        let tables = self.tables.read().await;
        let devices: HashSet<&str> = tables
            .events
            .iter()
            .filter(|e| e.date == date)
            .map(|e| e.device_id.as_str())
            .collect();
        Ok(devices.len() as u64)
    }

    async fn list_affiliates(&self, active_only: bool) -> Result<Vec<Affiliate>, AppError> {
        let tables = self.tables.read().await;
        let mut partners: Vec<Affiliate> = tables
            .affiliates
            .iter()
            .filter(|a| !active_only || a.is_active)
            .cloned()
            .collect();
        sort_for_display(&mut partners);
        Ok(partners)
    }

    async fn count_affiliates(&self) -> Result<u64, AppError> {
        Ok(self.tables.read().await.affiliates.len() as u64)
    }

    async fn insert_affiliates(&self, partners: &[Affiliate]) -> Result<(), AppError> {
        self.tables
            .write()
            .await
            .affiliates
            .extend(partners.iter().cloned());
        Ok(())
    }

    async fn seed_affiliates(&self, partners: &[Affiliate]) -> Result<u64, AppError> {
        let mut tables = self.tables.write().await;
        let mut added = 0;
        for partner in partners {
            if !tables.affiliates.iter().any(|a| a.id == partner.id) {
                tables.affiliates.push(partner.clone());
                added += 1;
            }
        }
        Ok(added)
    }

    async fn find_affiliate(&self, id: &str) -> Result<Option<Affiliate>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables.affiliates.iter().find(|a| a.id == id).cloned())
    }

    async fn replace_affiliate(&self, partner: &Affiliate) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        Ok(replace_where(&mut tables.affiliates, partner, |a| a.id == partner.id))
    }

    async fn delete_affiliate(&self, id: &str) -> Result<bool, AppError> {
        let mut tables = self.tables.write().await;
        Ok(remove_where(&mut tables.affiliates, |a| a.id == id) > 0)
    }

    async fn list_emails(&self, account_id: &str) -> Result<Vec<UserEmail>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .emails
            .iter()
            .filter(|e| e.account_id == account_id && e.is_active)
            .cloned()
            .collect())
    }

    async fn find_email(
        &self,
        account_id: &str,
        email: &str,
    ) -> Result<Option<UserEmail>, AppError> {
        let tables = self.tables.read().await;
        Ok(tables
            .emails
            .iter()
            .find(|e| e.account_id == account_id && e.email == email)
            .cloned())
    }

    async fn insert_email(&self, email: &UserEmail) -> Result<(), AppError> {
        self.tables.write().await.emails.push(email.clone());
        Ok(())
    }

    async fn delete_email(
        &self,
        account_id: &str,
        id: &str,
    ) -> Result<Option<UserEmail>, AppError> {
        let mut tables = self.tables.write().await;
        let position = tables
            .emails
            .iter()
            .position(|e| e.account_id == account_id && e.id == id);
        Ok(position.map(|idx| tables.emails.remove(idx)))
    }

    async fn list_alerts(
        &self,
        account_id: &str,
        prescription_id: Option<&str>,
    ) -> Result<Vec<ExpiryAlert>, AppError> {
        let tables = self.tables.read().await;
        let mut alerts: Vec<ExpiryAlert> = tables
            .alerts
            .iter()
            .filter(|a| a.account_id == account_id)
            .filter(|a| prescription_id.map_or(true, |p| a.prescription_id == p))
            .cloned()
            .collect();
        alerts.sort_by_key(|a| a.alert_date);
        Ok(alerts)
    }

    async fn insert_alerts(&self, alerts: &[ExpiryAlert]) -> Result<(), AppError> {
        let mut tables = self.tables.write().await;
        for alert in alerts {
            if tables.alerts.iter().any(|a| a.key() == alert.key()) {
                return Err(AppError::StoreError(anyhow::anyhow!(
                    "duplicate alert for prescription {} ({} days before)",
                    alert.prescription_id,
                    alert.days_before
                )));
            }
        }
        tables.alerts.extend(alerts.iter().cloned());
        Ok(())
    }

    async fn list_due_alerts(
        &self,
        account_id: &str,
        today: NaiveDate,
    ) -> Result<Vec<ExpiryAlert>, AppError> {
        let tables = self.tables.read().await;
        let mut alerts: Vec<ExpiryAlert> = tables
            .alerts
            .iter()
            .filter(|a| a.account_id == account_id && !a.sent && a.alert_date <= today)
            .cloned()
            .collect();
        alerts.sort_by_key(|a| a.alert_date);
        Ok(alerts)
    }

    async fn mark_alert_sent(
        &self,
        account_id: &str,
        id: &str,
        sent_at: DateTime<Utc>,
    ) -> Result<Option<ExpiryAlert>, AppError> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .alerts
            .iter_mut()
            .find(|a| a.account_id == account_id && a.id == id)
            .map(|alert| {
                alert.sent = true;
                alert.sent_at = Some(sent_at);
                alert.clone()
            }))
    }

    async fn delete_alerts(&self, account_id: &str, scope: AlertScope) -> Result<u64, AppError> {
        let mut tables = self.tables.write().await;
        let removed = match scope {
            AlertScope::Prescriptions(ids) => remove_where(&mut tables.alerts, |a| {
                a.account_id == account_id && ids.contains(&a.prescription_id)
            }),
            AlertScope::UnsentForPrescription(id) => remove_where(&mut tables.alerts, |a| {
                a.account_id == account_id && !a.sent && a.prescription_id == id
            }),
            AlertScope::UnsentForEmail(email) => remove_where(&mut tables.alerts, |a| {
                a.account_id == account_id && !a.sent && a.email == email
            }),
        };
        Ok(removed)
    }
}
