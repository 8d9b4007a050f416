use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use validator::Validate;

use crate::dtos::family::{
    CreateFamilyMemberRequest, DeleteFamilyMemberResponse, FamilyMemberResponse,
    UpdateFamilyMemberRequest,
};
use crate::handlers::parse_id;
use crate::middleware::AccountId;
use crate::models::FamilyMember;
use crate::services::limits::{ensure_can_create, LimitedResource};
use crate::services::AlertScope;
use crate::startup::AppState;
use service_core::error::AppError;

async fn load_member(
    state: &AppState,
    account: &AccountId,
    raw_id: &str,
) -> Result<FamilyMember, AppError> {
    let id = parse_id("family member", raw_id)?;
    state
        .store
        .find_member(account.as_str(), &id)
        .await?
        .ok_or_else(|| AppError::not_found("Family member not found"))
}

#[tracing::instrument(skip(state, request))]
pub async fn create_member(
    State(state): State<AppState>,
    account: AccountId,
    Json(request): Json<CreateFamilyMemberRequest>,
) -> Result<Json<FamilyMemberResponse>, AppError> {
    request.validate()?;

    let name = request.name.trim();
    if name.is_empty() {
        return Err(AppError::bad_request("Name cannot be blank"));
    }

    ensure_can_create(state.store.as_ref(), account.as_str(), LimitedResource::FamilyMember)
        .await?;

    let member = FamilyMember::new(
        account.0.clone(),
        name.to_string(),
        request.relationship.trim().to_string(),
    );
    state.store.insert_member(&member).await?;

    tracing::info!(member_id = %member.id, "Family member created");
    Ok(Json(member.into()))
}

#[tracing::instrument(skip(state))]
pub async fn list_members(
    State(state): State<AppState>,
    account: AccountId,
) -> Result<Json<Vec<FamilyMemberResponse>>, AppError> {
    let members = state.store.list_members(account.as_str()).await?;
    Ok(Json(members.into_iter().map(Into::into).collect()))
}

#[tracing::instrument(skip(state))]
pub async fn get_member(
    State(state): State<AppState>,
    account: AccountId,
    Path(id): Path<String>,
) -> Result<Json<FamilyMemberResponse>, AppError> {
    Ok(Json(load_member(&state, &account, &id).await?.into()))
}

#[tracing::instrument(skip(state, request))]
pub async fn update_member(
    State(state): State<AppState>,
    account: AccountId,
    Path(id): Path<String>,
    Json(request): Json<UpdateFamilyMemberRequest>,
) -> Result<Json<FamilyMemberResponse>, AppError> {
    if request.is_empty() {
        return Err(AppError::bad_request("No fields to update"));
    }
    request.validate()?;

    let mut member = load_member(&state, &account, &id).await?;
    if let Some(name) = request.name {
        member.name = name.trim().to_string();
    }
    if let Some(relationship) = request.relationship {
        member.relationship = relationship.trim().to_string();
    }
    member.updated_at = Utc::now();

    if !state.store.replace_member(&member).await? {
        return Err(AppError::not_found("Family member not found"));
    }
    Ok(Json(member.into()))
}

/// Removes the member, its prescriptions and their alerts. The three deletes
/// are not atomic; they run children first so a failure part way never leaves
/// prescriptions pointing at a missing member.
#[tracing::instrument(skip(state))]
pub async fn delete_member(
    State(state): State<AppState>,
    account: AccountId,
    Path(id): Path<String>,
) -> Result<Json<DeleteFamilyMemberResponse>, AppError> {
    let member = load_member(&state, &account, &id).await?;
    let account_id = account.as_str();

    let prescription_ids: Vec<String> = state
        .store
        .list_prescriptions(account_id, Some(&member.id))
        .await?
        .into_iter()
        .map(|rx| rx.id)
        .collect();

    if !prescription_ids.is_empty() {
        state
            .store
            .delete_alerts(account_id, AlertScope::Prescriptions(prescription_ids))
            .await?;
    }
    let deleted = state
        .store
        .delete_member_prescriptions(account_id, &member.id)
        .await?;
    state.store.delete_member(account_id, &member.id).await?;

    tracing::info!(
        member_id = %member.id,
        deleted_prescriptions = deleted.len(),
        "Family member deleted"
    );
    Ok(Json(DeleteFamilyMemberResponse {
        message: "Family member deleted".to_string(),
        deleted_prescriptions: deleted.len() as u64,
    }))
}
