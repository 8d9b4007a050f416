use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{ExpiryAlert, UserEmail};

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterEmailRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct UserEmailResponse {
    pub id: String,
    pub email: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<UserEmail> for UserEmailResponse {
    fn from(e: UserEmail) -> Self {
        Self {
            id: e.id,
            email: e.email,
            is_active: e.is_active,
            created_at: e.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AlertQuery {
    pub prescription_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ExpiryAlertResponse {
    pub id: String,
    pub prescription_id: String,
    pub email: String,
    pub days_before: i32,
    pub alert_date: NaiveDate,
    pub expiry_date: NaiveDate,
    pub sent: bool,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<ExpiryAlert> for ExpiryAlertResponse {
    fn from(a: ExpiryAlert) -> Self {
        Self {
            id: a.id,
            prescription_id: a.prescription_id,
            email: a.email,
            days_before: a.days_before,
            alert_date: a.alert_date,
            expiry_date: a.expiry_date,
            sent: a.sent,
            sent_at: a.sent_at,
            created_at: a.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ScheduleAlertsResponse {
    pub created: usize,
    pub alerts: Vec<ExpiryAlertResponse>,
}
