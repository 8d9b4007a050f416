use chrono::{DateTime, NaiveDate, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RxType {
    Eyeglass,
    Contact,
}

impl std::fmt::Display for RxType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RxType::Eyeglass => write!(f, "eyeglass"),
            RxType::Contact => write!(f, "contact"),
        }
    }
}

/// A stored prescription image with its validity window.
///
/// `family_member_id` is checked against the owning account when the row is
/// created; the store itself does not enforce the reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prescription {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub object_id: Option<ObjectId>,
    pub id: String,
    pub account_id: String,
    pub family_member_id: String,
    pub rx_type: RxType,
    pub image_base64: String,
    #[serde(default)]
    pub notes: String,
    pub date_taken: NaiveDate,
    pub expiry_date: NaiveDate,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl Prescription {
    pub fn new(
        account_id: String,
        family_member_id: String,
        rx_type: RxType,
        image_base64: String,
        notes: String,
        date_taken: NaiveDate,
        expiry_date: NaiveDate,
    ) -> Self {
        let now = Utc::now();
        Self {
            object_id: None,
            id: super::new_id(),
            account_id,
            family_member_id,
            rx_type,
            image_base64,
            notes,
            date_taken,
            expiry_date,
            created_at: now,
            updated_at: now,
        }
    }
}
