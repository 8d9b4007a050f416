//! OCR bridge: ask a vision model for a prescription's expiry date.
//!
//! The model gets the image plus a fixed prompt and answers free text, which
//! is parsed best-effort. Anything short of a parsed date falls back to manual
//! entry; provider failures never surface as HTTP errors.

pub mod gemini;
pub mod mock;
pub mod parse;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use service_core::error::AppError;
use std::sync::Arc;
use thiserror::Error;

use super::metrics::record_ocr_request;
use crate::dtos::ocr::OcrResponse;

pub use gemini::GeminiVisionProvider;
pub use mock::MockVisionProvider;

pub const EXPIRY_PROMPT: &str = "You are reading a photo of an eyeglass or contact lens \
prescription. Find the prescription's expiration date (it may be labelled 'Expires', \
'Expiration', 'Exp', 'Valid until' or 'Good through'). Reply with the date only, in \
YYYY-MM-DD format. If no expiration date is visible, reply with NOT_FOUND.";

pub const MANUAL_ENTRY_MESSAGE: &str =
    "Could not read an expiration date from the image; manual entry required";

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Content filtered")]
    ContentFiltered,

    #[error("Network error: {0}")]
    NetworkError(String),
}

/// Decoded-and-checked image ready for the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    /// Standard base64, without any data-URI prefix.
    pub data: String,
}

impl InlineImage {
    /// Accepts bare base64 or a `data:<mime>;base64,<payload>` URI.
    pub fn from_payload(payload: &str) -> Result<Self, AppError> {
        let payload = payload.trim();
        if payload.is_empty() {
            return Err(AppError::bad_request("image_base64 is required"));
        }

        let (mime_type, data) = match payload.strip_prefix("data:") {
            Some(rest) => {
                let (header, data) = rest
                    .split_once(',')
                    .ok_or_else(|| AppError::bad_request("Malformed data URI"))?;
                let mime = header.strip_suffix(";base64").unwrap_or(header);
                let mime = if mime.is_empty() { "image/jpeg" } else { mime };
                (mime.to_string(), data)
            }
            None => ("image/jpeg".to_string(), payload),
        };

        let data: String = data.chars().filter(|c| !c.is_whitespace()).collect();
        if data.is_empty() {
            return Err(AppError::bad_request("image_base64 is empty"));
        }
        STANDARD
            .decode(&data)
            .map_err(|e| AppError::bad_request(format!("image_base64 is not valid base64: {}", e)))?;

        Ok(Self { mime_type, data })
    }
}

#[async_trait]
pub trait VisionProvider: Send + Sync {
    /// Free-text answer of the model for `prompt` about `image`.
    async fn describe(&self, image: &InlineImage, prompt: &str) -> Result<String, ProviderError>;

    fn name(&self) -> &str;
}

/// Wraps the optional provider; `None` means OCR is not configured.
#[derive(Clone)]
pub struct OcrService {
    provider: Option<Arc<dyn VisionProvider>>,
}

impl OcrService {
    pub fn new(provider: Option<Arc<dyn VisionProvider>>) -> Self {
        Self { provider }
    }

    pub fn disabled() -> Self {
        Self { provider: None }
    }

    pub async fn extract_expiry(&self, image: &InlineImage) -> OcrResponse {
        let Some(provider) = &self.provider else {
            record_ocr_request("disabled");
            return manual_entry(None);
        };

        let text = match provider.describe(image, EXPIRY_PROMPT).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(provider = provider.name(), "OCR provider call failed: {}", e);
                record_ocr_request("provider_error");
                return manual_entry(None);
            }
        };

        match parse::extract_date(&text) {
            Some(date) => {
                record_ocr_request("success");
                OcrResponse {
                    success: true,
                    expiry_date: Some(date.to_string()),
                    message: "Expiration date extracted".to_string(),
                    raw_text: Some(text.trim().to_string()),
                }
            }
            None => {
                record_ocr_request("not_found");
                manual_entry(Some(text.trim().to_string()))
            }
        }
    }
}

fn manual_entry(raw_text: Option<String>) -> OcrResponse {
    OcrResponse {
        success: false,
        expiry_date: None,
        message: MANUAL_ENTRY_MESSAGE.to_string(),
        raw_text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_uri_prefix_is_stripped() {
        let image = InlineImage::from_payload("data:image/png;base64,aGVsbG8=").unwrap();
        assert_eq!(image.mime_type, "image/png");
        assert_eq!(image.data, "aGVsbG8=");
    }

    #[test]
    fn bare_base64_defaults_to_jpeg() {
        let image = InlineImage::from_payload("aGVs\nbG8=").unwrap();
        assert_eq!(image.mime_type, "image/jpeg");
        assert_eq!(image.data, "aGVsbG8=");
    }

    #[test]
    fn empty_or_garbage_payload_is_rejected() {
        assert!(InlineImage::from_payload("").is_err());
        assert!(InlineImage::from_payload("data:image/png;base64,").is_err());
        assert!(InlineImage::from_payload("not base64 at all!").is_err());
    }

    #[tokio::test]
    async fn disabled_service_asks_for_manual_entry() {
        let image = InlineImage::from_payload("aGVsbG8=").unwrap();
        let res = OcrService::disabled().extract_expiry(&image).await;
        assert!(!res.success);
        assert_eq!(res.message, MANUAL_ENTRY_MESSAGE);
    }

    #[tokio::test]
    async fn parsed_answer_is_returned() {
        let service = OcrService::new(Some(Arc::new(MockVisionProvider::answering(
            "Expires 03/15/2026",
        ))));
        let image = InlineImage::from_payload("aGVsbG8=").unwrap();
        let res = service.extract_expiry(&image).await;

        assert!(res.success);
        assert_eq!(res.expiry_date.as_deref(), Some("2026-03-15"));
    }

    #[tokio::test]
    async fn provider_failure_falls_back() {
        let service = OcrService::new(Some(Arc::new(MockVisionProvider::failing())));
        let image = InlineImage::from_payload("aGVsbG8=").unwrap();
        let res = service.extract_expiry(&image).await;

        assert!(!res.success);
        assert!(res.raw_text.is_none());
    }
}
