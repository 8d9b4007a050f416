use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{Prescription, RxType};

/// Dates arrive as `YYYY-MM-DD` strings and are parsed by the handler so a
/// malformed date is a 400 rather than a body rejection.
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePrescriptionRequest {
    #[validate(length(min = 1, message = "family_member_id is required"))]
    pub family_member_id: String,
    pub rx_type: RxType,
    #[validate(length(min = 1, message = "image_base64 is required"))]
    pub image_base64: String,
    pub notes: Option<String>,
    pub date_taken: Option<String>,
    pub expiry_date: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePrescriptionRequest {
    pub rx_type: Option<RxType>,
    #[validate(length(min = 1, message = "image_base64 cannot be empty"))]
    pub image_base64: Option<String>,
    pub notes: Option<String>,
    pub date_taken: Option<String>,
    pub expiry_date: Option<String>,
}

impl UpdatePrescriptionRequest {
    pub fn is_empty(&self) -> bool {
        self.rx_type.is_none()
            && self.image_base64.is_none()
            && self.notes.is_none()
            && self.date_taken.is_none()
            && self.expiry_date.is_none()
    }
}

#[derive(Debug, Deserialize)]
pub struct PrescriptionQuery {
    pub family_member_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PrescriptionResponse {
    pub id: String,
    pub family_member_id: String,
    pub rx_type: RxType,
    pub image_base64: String,
    pub notes: String,
    pub date_taken: NaiveDate,
    pub expiry_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Prescription> for PrescriptionResponse {
    fn from(rx: Prescription) -> Self {
        Self {
            id: rx.id,
            family_member_id: rx.family_member_id,
            rx_type: rx.rx_type,
            image_base64: rx.image_base64,
            notes: rx.notes,
            date_taken: rx.date_taken,
            expiry_date: rx.expiry_date,
            created_at: rx.created_at,
            updated_at: rx.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub family_members: u64,
    pub total_prescriptions: u64,
    pub eyeglass_prescriptions: u64,
    pub contact_prescriptions: u64,
}
