use axum::{extract::State, Json};
use chrono::Utc;
use validator::Validate;

use crate::dtos::analytics::{DashboardResponse, TrackEventRequest, TrackResponse};
use crate::services::analytics::{build_dashboard, track};
use crate::startup::AppState;
use service_core::error::AppError;

/// Anonymous device ingest. Rate limited per caller IP at the router.
#[tracing::instrument(skip(state, request))]
pub async fn track_event(
    State(state): State<AppState>,
    Json(request): Json<TrackEventRequest>,
) -> Result<Json<TrackResponse>, AppError> {
    request.validate()?;
    track(state.store.as_ref(), request).await?;
    Ok(Json(TrackResponse { status: "tracked" }))
}

#[tracing::instrument(skip(state))]
pub async fn dashboard(State(state): State<AppState>) -> Result<Json<DashboardResponse>, AppError> {
    Ok(Json(build_dashboard(state.store.as_ref(), Utc::now()).await?))
}
