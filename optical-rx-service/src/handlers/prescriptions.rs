use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use validator::Validate;

use crate::dtos::prescription::{
    CreatePrescriptionRequest, PrescriptionQuery, PrescriptionResponse, StatsResponse,
    UpdatePrescriptionRequest,
};
use crate::dtos::MessageResponse;
use crate::handlers::parse_id;
use crate::middleware::AccountId;
use crate::models::{Prescription, RxType};
use crate::services::alerts::{reschedule_for_prescription, schedule_for_prescription};
use crate::services::dates::{add_one_year, parse_date, today};
use crate::services::limits::{ensure_can_create, LimitedResource};
use crate::services::AlertScope;
use crate::startup::AppState;
use service_core::error::AppError;

pub(crate) async fn load_prescription(
    state: &AppState,
    account: &AccountId,
    raw_id: &str,
) -> Result<Prescription, AppError> {
    let id = parse_id("prescription", raw_id)?;
    state
        .store
        .find_prescription(account.as_str(), &id)
        .await?
        .ok_or_else(|| AppError::not_found("Prescription not found"))
}

#[tracing::instrument(skip(state, request))]
pub async fn create_prescription(
    State(state): State<AppState>,
    account: AccountId,
    Json(request): Json<CreatePrescriptionRequest>,
) -> Result<Json<PrescriptionResponse>, AppError> {
    request.validate()?;

    let member_id = parse_id("family member", &request.family_member_id)?;
    let member = state
        .store
        .find_member(account.as_str(), &member_id)
        .await?
        .ok_or_else(|| AppError::bad_request("Family member not found"))?;

    let date_taken = match request.date_taken.as_deref() {
        Some(raw) => parse_date("date_taken", raw)?,
        None => today(),
    };
    let expiry_date = match request.expiry_date.as_deref() {
        Some(raw) => parse_date("expiry_date", raw)?,
        None => add_one_year(date_taken),
    };

    ensure_can_create(state.store.as_ref(), account.as_str(), LimitedResource::Prescription)
        .await?;

    let rx = Prescription::new(
        account.0.clone(),
        member.id,
        request.rx_type,
        request.image_base64,
        request.notes.unwrap_or_default(),
        date_taken,
        expiry_date,
    );
    state.store.insert_prescription(&rx).await?;
    tracing::info!(prescription_id = %rx.id, rx_type = %rx.rx_type, "Prescription created");

    // The prescription stands even if alert scheduling fails.
    if let Err(e) = schedule_for_prescription(state.store.as_ref(), &rx, today()).await {
        tracing::warn!(prescription_id = %rx.id, "Failed to schedule expiry alerts: {}", e);
    }

    Ok(Json(rx.into()))
}

#[tracing::instrument(skip(state))]
pub async fn list_prescriptions(
    State(state): State<AppState>,
    account: AccountId,
    Query(query): Query<PrescriptionQuery>,
) -> Result<Json<Vec<PrescriptionResponse>>, AppError> {
    let member_id = query
        .family_member_id
        .as_deref()
        .map(|raw| parse_id("family member", raw))
        .transpose()?;

    let prescriptions = state
        .store
        .list_prescriptions(account.as_str(), member_id.as_deref())
        .await?;
    Ok(Json(prescriptions.into_iter().map(Into::into).collect()))
}

#[tracing::instrument(skip(state))]
pub async fn get_prescription(
    State(state): State<AppState>,
    account: AccountId,
    Path(id): Path<String>,
) -> Result<Json<PrescriptionResponse>, AppError> {
    Ok(Json(load_prescription(&state, &account, &id).await?.into()))
}

#[tracing::instrument(skip(state, request))]
pub async fn update_prescription(
    State(state): State<AppState>,
    account: AccountId,
    Path(id): Path<String>,
    Json(request): Json<UpdatePrescriptionRequest>,
) -> Result<Json<PrescriptionResponse>, AppError> {
    if request.is_empty() {
        return Err(AppError::bad_request("No fields to update"));
    }
    request.validate()?;

    let mut rx = load_prescription(&state, &account, &id).await?;
    let previous_expiry = rx.expiry_date;

    if let Some(rx_type) = request.rx_type {
        rx.rx_type = rx_type;
    }
    if let Some(image) = request.image_base64 {
        rx.image_base64 = image;
    }
    if let Some(notes) = request.notes {
        rx.notes = notes;
    }
    if let Some(raw) = request.date_taken.as_deref() {
        rx.date_taken = parse_date("date_taken", raw)?;
    }
    if let Some(raw) = request.expiry_date.as_deref() {
        rx.expiry_date = parse_date("expiry_date", raw)?;
    }
    rx.updated_at = Utc::now();

    if !state.store.replace_prescription(&rx).await? {
        return Err(AppError::not_found("Prescription not found"));
    }

    if rx.expiry_date != previous_expiry {
        reschedule_for_prescription(state.store.as_ref(), &rx, today()).await?;
    }

    Ok(Json(rx.into()))
}

#[tracing::instrument(skip(state))]
pub async fn delete_prescription(
    State(state): State<AppState>,
    account: AccountId,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let rx = load_prescription(&state, &account, &id).await?;

    state
        .store
        .delete_alerts(account.as_str(), AlertScope::Prescriptions(vec![rx.id.clone()]))
        .await?;
    state
        .store
        .delete_prescription(account.as_str(), &rx.id)
        .await?;

    Ok(Json(MessageResponse::new("Prescription deleted")))
}

#[tracing::instrument(skip(state))]
pub async fn stats(
    State(state): State<AppState>,
    account: AccountId,
) -> Result<Json<StatsResponse>, AppError> {
    let account_id = account.as_str();
    Ok(Json(StatsResponse {
        family_members: state.store.count_members(account_id).await?,
        total_prescriptions: state.store.count_prescriptions(account_id, None).await?,
        eyeglass_prescriptions: state
            .store
            .count_prescriptions(account_id, Some(RxType::Eyeglass))
            .await?,
        contact_prescriptions: state
            .store
            .count_prescriptions(account_id, Some(RxType::Contact))
            .await?,
    }))
}
