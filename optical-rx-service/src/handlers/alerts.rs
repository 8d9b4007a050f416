use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::Utc;
use validator::Validate;

use crate::dtos::alert::{
    AlertQuery, ExpiryAlertResponse, RegisterEmailRequest, ScheduleAlertsResponse,
    UserEmailResponse,
};
use crate::dtos::MessageResponse;
use crate::handlers::parse_id;
use crate::handlers::prescriptions::load_prescription;
use crate::middleware::AccountId;
use crate::models::UserEmail;
use crate::services::alerts::{schedule_for_account, schedule_for_prescription};
use crate::services::dates::today;
use crate::services::AlertScope;
use crate::startup::AppState;
use service_core::error::AppError;

#[tracing::instrument(skip(state))]
pub async fn list_emails(
    State(state): State<AppState>,
    account: AccountId,
) -> Result<Json<Vec<UserEmailResponse>>, AppError> {
    let emails = state.store.list_emails(account.as_str()).await?;
    Ok(Json(emails.into_iter().map(Into::into).collect()))
}

#[tracing::instrument(skip(state, request))]
pub async fn register_email(
    State(state): State<AppState>,
    account: AccountId,
    Json(request): Json<RegisterEmailRequest>,
) -> Result<Json<UserEmailResponse>, AppError> {
    request.validate()?;
    let address = request.email.trim().to_lowercase();

    if state
        .store
        .find_email(account.as_str(), &address)
        .await?
        .is_some()
    {
        return Err(AppError::bad_request("Email already registered"));
    }

    let email = UserEmail::new(account.0.clone(), address);
    state.store.insert_email(&email).await?;

    let scheduled = schedule_for_account(state.store.as_ref(), account.as_str(), today()).await?;
    tracing::info!(email_id = %email.id, scheduled, "Email registered for expiry alerts");

    Ok(Json(email.into()))
}

#[tracing::instrument(skip(state))]
pub async fn delete_email(
    State(state): State<AppState>,
    account: AccountId,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_id("email", &id)?;
    let removed = state
        .store
        .delete_email(account.as_str(), &id)
        .await?
        .ok_or_else(|| AppError::not_found("Email not found"))?;

    let dropped = state
        .store
        .delete_alerts(account.as_str(), AlertScope::UnsentForEmail(removed.email))
        .await?;
    tracing::info!(email_id = %id, dropped_alerts = dropped, "Email unregistered");

    Ok(Json(MessageResponse::new("Email removed")))
}

#[tracing::instrument(skip(state))]
pub async fn schedule_prescription_alerts(
    State(state): State<AppState>,
    account: AccountId,
    Path(id): Path<String>,
) -> Result<Json<ScheduleAlertsResponse>, AppError> {
    let rx = load_prescription(&state, &account, &id).await?;
    let created = schedule_for_prescription(state.store.as_ref(), &rx, today()).await?;
    let alerts = state
        .store
        .list_alerts(account.as_str(), Some(&rx.id))
        .await?;

    Ok(Json(ScheduleAlertsResponse {
        created,
        alerts: alerts.into_iter().map(Into::into).collect(),
    }))
}

#[tracing::instrument(skip(state))]
pub async fn list_alerts(
    State(state): State<AppState>,
    account: AccountId,
    Query(query): Query<AlertQuery>,
) -> Result<Json<Vec<ExpiryAlertResponse>>, AppError> {
    let prescription_id = query
        .prescription_id
        .as_deref()
        .map(|raw| parse_id("prescription", raw))
        .transpose()?;

    let alerts = state
        .store
        .list_alerts(account.as_str(), prescription_id.as_deref())
        .await?;
    Ok(Json(alerts.into_iter().map(Into::into).collect()))
}

#[tracing::instrument(skip(state))]
pub async fn pending_alerts(
    State(state): State<AppState>,
    account: AccountId,
) -> Result<Json<Vec<ExpiryAlertResponse>>, AppError> {
    let alerts = state
        .store
        .list_due_alerts(account.as_str(), today())
        .await?;
    Ok(Json(alerts.into_iter().map(Into::into).collect()))
}

#[tracing::instrument(skip(state))]
pub async fn mark_sent(
    State(state): State<AppState>,
    account: AccountId,
    Path(id): Path<String>,
) -> Result<Json<ExpiryAlertResponse>, AppError> {
    let id = parse_id("alert", &id)?;
    let alert = state
        .store
        .mark_alert_sent(account.as_str(), &id, Utc::now())
        .await?
        .ok_or_else(|| AppError::not_found("Alert not found"))?;
    Ok(Json(alert.into()))
}
