//! Expiry alert scheduling.
//!
//! Alerts are inert rows: for every active registered email, one alert at each
//! offset before the prescription expires. Past dates and alerts already
//! stored for the same expiry date, email and offset are skipped, so rerunning
//! the scheduler creates nothing new.

use chrono::{Duration, NaiveDate, Utc};
use service_core::error::AppError;
use std::collections::HashSet;

use super::store::{AlertScope, RxStore};
use crate::models::{new_id, ExpiryAlert, Prescription};

/// Days before expiry at which an alert fires.
pub const ALERT_OFFSETS_DAYS: [i32; 5] = [30, 14, 7, 1, 0];

/// New alerts to store. Pure: no I/O, deterministic apart from generated ids.
pub fn plan_alerts(
    rx: &Prescription,
    emails: &[String],
    existing: &[ExpiryAlert],
    today: NaiveDate,
) -> Vec<ExpiryAlert> {
    let mut taken: HashSet<(String, i32)> = existing
        .iter()
        .filter(|a| a.prescription_id == rx.id && a.expiry_date == rx.expiry_date)
        .map(|a| (a.email.clone(), a.days_before))
        .collect();

    let now = Utc::now();
    let mut planned = Vec::new();

    for email in emails {
        for days_before in ALERT_OFFSETS_DAYS {
            let alert_date = rx.expiry_date - Duration::days(i64::from(days_before));
            if alert_date < today {
                continue;
            }
            if !taken.insert((email.clone(), days_before)) {
                continue;
            }
            planned.push(ExpiryAlert {
                object_id: None,
                id: new_id(),
                account_id: rx.account_id.clone(),
                prescription_id: rx.id.clone(),
                email: email.clone(),
                days_before,
                alert_date,
                expiry_date: rx.expiry_date,
                sent: false,
                sent_at: None,
                created_at: now,
            });
        }
    }

    planned
}

/// Schedule alerts for one prescription against the account's active emails.
/// Returns the number of alerts created.
pub async fn schedule_for_prescription(
    store: &dyn RxStore,
    rx: &Prescription,
    today: NaiveDate,
) -> Result<usize, AppError> {
    let emails: Vec<String> = store
        .list_emails(&rx.account_id)
        .await?
        .into_iter()
        .map(|e| e.email)
        .collect();
    if emails.is_empty() {
        return Ok(0);
    }

    let existing = store.list_alerts(&rx.account_id, Some(&rx.id)).await?;
    let planned = plan_alerts(rx, &emails, &existing, today);
    store.insert_alerts(&planned).await?;

    if !planned.is_empty() {
        tracing::info!(
            prescription_id = %rx.id,
            created = planned.len(),
            "Scheduled expiry alerts"
        );
    }
    Ok(planned.len())
}

/// Drop the unsent alerts of a prescription and plan again, e.g. after its
/// expiry date changed. Sent alerts are kept as history.
pub async fn reschedule_for_prescription(
    store: &dyn RxStore,
    rx: &Prescription,
    today: NaiveDate,
) -> Result<usize, AppError> {
    store
        .delete_alerts(
            &rx.account_id,
            AlertScope::UnsentForPrescription(rx.id.clone()),
        )
        .await?;
    schedule_for_prescription(store, rx, today).await
}

/// Schedule alerts for every prescription in the account, e.g. after a new
/// email was registered.
pub async fn schedule_for_account(
    store: &dyn RxStore,
    account_id: &str,
    today: NaiveDate,
) -> Result<usize, AppError> {
    let mut created = 0;
    for rx in store.list_prescriptions(account_id, None).await? {
        created += schedule_for_prescription(store, &rx, today).await?;
    }
    Ok(created)
}
