//! Request and response bodies. Stored models carry BSON date helpers, so
//! everything returned to callers goes through these types.

pub mod affiliate;
pub mod alert;
pub mod analytics;
pub mod family;
pub mod ocr;
pub mod prescription;
pub mod subscription;

use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
