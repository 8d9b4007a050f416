use axum::{extract::State, Json};
use chrono::Utc;

use crate::dtos::subscription::{SubscriptionResponse, UpgradeRequest, UsageResponse};
use crate::middleware::AccountId;
use crate::services::limits::{subscription_for, usage};
use crate::startup::AppState;
use service_core::error::AppError;

#[tracing::instrument(skip(state))]
pub async fn get_subscription(
    State(state): State<AppState>,
    account: AccountId,
) -> Result<Json<SubscriptionResponse>, AppError> {
    let sub = subscription_for(state.store.as_ref(), account.as_str()).await?;
    Ok(Json(SubscriptionResponse::from_record(sub, Utc::now())))
}

#[tracing::instrument(skip(state))]
pub async fn upgrade(
    State(state): State<AppState>,
    account: AccountId,
    Json(request): Json<UpgradeRequest>,
) -> Result<Json<SubscriptionResponse>, AppError> {
    let now = Utc::now();
    let mut sub = subscription_for(state.store.as_ref(), account.as_str()).await?;
    sub.upgrade(request.subscription_type, now);
    state.store.save_subscription(&sub).await?;

    tracing::info!(plan = ?request.subscription_type, "Subscription upgraded");
    Ok(Json(SubscriptionResponse::from_record(sub, now)))
}

#[tracing::instrument(skip(state))]
pub async fn cancel(
    State(state): State<AppState>,
    account: AccountId,
) -> Result<Json<SubscriptionResponse>, AppError> {
    let now = Utc::now();
    let mut sub = subscription_for(state.store.as_ref(), account.as_str()).await?;
    sub.cancel(now);
    state.store.save_subscription(&sub).await?;

    tracing::info!("Subscription cancelled");
    Ok(Json(SubscriptionResponse::from_record(sub, now)))
}

#[tracing::instrument(skip(state))]
pub async fn get_usage(
    State(state): State<AppState>,
    account: AccountId,
) -> Result<Json<UsageResponse>, AppError> {
    Ok(Json(usage(state.store.as_ref(), account.as_str()).await?))
}
