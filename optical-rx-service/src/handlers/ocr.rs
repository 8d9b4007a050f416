use axum::{extract::State, Json};

use crate::dtos::ocr::{OcrRequest, OcrResponse};
use crate::services::InlineImage;
use crate::startup::AppState;
use service_core::error::AppError;

/// Best-effort expiry extraction. Only a bad payload is an error; provider
/// trouble comes back as `success: false`.
#[tracing::instrument(skip(state, request))]
pub async fn extract_expiry(
    State(state): State<AppState>,
    Json(request): Json<OcrRequest>,
) -> Result<Json<OcrResponse>, AppError> {
    let image = InlineImage::from_payload(&request.image_base64)?;
    Ok(Json(state.ocr.extract_expiry(&image).await))
}
