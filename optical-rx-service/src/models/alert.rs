use chrono::{DateTime, NaiveDate, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use super::opt_chrono_datetime_as_bson_datetime;

/// Address opted in to expiry notifications.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserEmail {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub object_id: Option<ObjectId>,
    pub id: String,
    pub account_id: String,
    pub email: String,
    pub is_active: bool,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl UserEmail {
    pub fn new(account_id: String, email: String) -> Self {
        Self {
            object_id: None,
            id: super::new_id(),
            account_id,
            email,
            is_active: true,
            created_at: Utc::now(),
        }
    }
}

/// Inert reminder record. Nothing in this service delivers it; a sender marks it sent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpiryAlert {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub object_id: Option<ObjectId>,
    pub id: String,
    pub account_id: String,
    pub prescription_id: String,
    pub email: String,
    pub days_before: i32,
    pub alert_date: NaiveDate,
    pub expiry_date: NaiveDate,
    pub sent: bool,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "opt_chrono_datetime_as_bson_datetime"
    )]
    pub sent_at: Option<DateTime<Utc>>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
}

impl ExpiryAlert {
    /// Identity used for deduplication.
    pub fn key(&self) -> (&str, &str, i32, NaiveDate) {
        (&self.prescription_id, &self.email, self.days_before, self.expiry_date)
    }
}
