use axum::{
    extract::{Path, State},
    Json,
};
use validator::Validate;

use crate::dtos::affiliate::{AffiliateRequest, AffiliateResponse, PartnersResponse};
use crate::dtos::MessageResponse;
use crate::handlers::parse_id;
use crate::models::{Affiliate, AffiliateCategory, AffiliateFields};
use crate::services::RxStore;
use crate::startup::AppState;
use service_core::error::AppError;

#[allow(clippy::too_many_arguments)]
fn partner(
    id: &str,
    name: &str,
    description: &str,
    url: &str,
    category: AffiliateCategory,
    discount: &str,
    is_featured: bool,
    order: i32,
) -> Affiliate {
    let mut partner = Affiliate::new(AffiliateFields {
        name: name.to_string(),
        description: description.to_string(),
        url: url.to_string(),
        category,
        discount: discount.to_string(),
        commission: None,
        is_featured,
        is_active: true,
        order,
    });
    partner.id = id.to_string();
    partner
}

/// Directory shipped with a fresh install. Ids are fixed so seeding is idempotent.
pub fn default_partners() -> Vec<Affiliate> {
    vec![
        partner(
            "3f1c2b8e-5a4d-4c1e-9b7a-0d6e2f41a001",
            "Zenni Optical",
            "Affordable prescription glasses starting at $6.95",
            "https://www.zennioptical.com",
            AffiliateCategory::Eyeglasses,
            "Up to 50% off",
            true,
            1,
        ),
        partner(
            "3f1c2b8e-5a4d-4c1e-9b7a-0d6e2f41a002",
            "Warby Parker",
            "Designer eyewear with free home try-on",
            "https://www.warbyparker.com",
            AffiliateCategory::Both,
            "Free shipping",
            true,
            2,
        ),
        partner(
            "3f1c2b8e-5a4d-4c1e-9b7a-0d6e2f41a003",
            "EyeBuyDirect",
            "Quality glasses at low prices",
            "https://www.eyebuydirect.com",
            AffiliateCategory::Eyeglasses,
            "20% off first order",
            false,
            3,
        ),
        partner(
            "3f1c2b8e-5a4d-4c1e-9b7a-0d6e2f41a004",
            "1-800 Contacts",
            "Contact lenses delivered to your door",
            "https://www.1800contacts.com",
            AffiliateCategory::Contacts,
            "Price match guarantee",
            false,
            4,
        ),
        partner(
            "3f1c2b8e-5a4d-4c1e-9b7a-0d6e2f41a005",
            "GlassesUSA",
            "Premium frames and lenses online",
            "https://www.glassesusa.com",
            AffiliateCategory::Both,
            "Up to 60% off frames",
            false,
            5,
        ),
    ]
}

/// Seed the directory on first access when it is empty.
async fn ensure_seeded(store: &dyn RxStore) -> Result<(), AppError> {
    if store.count_affiliates().await? == 0 {
        let added = store.seed_affiliates(&default_partners()).await?;
        if added > 0 {
            tracing::info!(count = added, "Seeded default affiliate partners");
        }
    }
    Ok(())
}

fn validated_fields(request: AffiliateRequest) -> Result<AffiliateFields, AppError> {
    request.validate()?;
    if request.name.trim().is_empty() {
        return Err(AppError::bad_request("Name cannot be blank"));
    }
    if !request.has_http_scheme() {
        return Err(AppError::bad_request("URL must start with http:// or https://"));
    }
    Ok(request.into())
}

#[tracing::instrument(skip(state))]
pub async fn list_active(State(state): State<AppState>) -> Result<Json<PartnersResponse>, AppError> {
    ensure_seeded(state.store.as_ref()).await?;
    let partners = state.store.list_affiliates(true).await?;
    Ok(Json(PartnersResponse {
        partners: partners.into_iter().map(Into::into).collect(),
    }))
}

#[tracing::instrument(skip(state))]
pub async fn list_all(State(state): State<AppState>) -> Result<Json<PartnersResponse>, AppError> {
    ensure_seeded(state.store.as_ref()).await?;
    let partners = state.store.list_affiliates(false).await?;
    Ok(Json(PartnersResponse {
        partners: partners.into_iter().map(Into::into).collect(),
    }))
}

#[tracing::instrument(skip(state, request))]
pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<AffiliateRequest>,
) -> Result<Json<AffiliateResponse>, AppError> {
    let partner = Affiliate::new(validated_fields(request)?);
    state
        .store
        .insert_affiliates(std::slice::from_ref(&partner))
        .await?;

    tracing::info!(affiliate_id = %partner.id, name = %partner.name, "Affiliate created");
    Ok(Json(partner.into()))
}

#[tracing::instrument(skip(state, request))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<AffiliateRequest>,
) -> Result<Json<AffiliateResponse>, AppError> {
    let id = parse_id("affiliate", &id)?;
    let fields = validated_fields(request)?;

    let mut partner = state
        .store
        .find_affiliate(&id)
        .await?
        .ok_or_else(|| AppError::not_found("Affiliate not found"))?;
    partner.replace_fields(fields);

    if !state.store.replace_affiliate(&partner).await? {
        return Err(AppError::not_found("Affiliate not found"));
    }
    Ok(Json(partner.into()))
}

#[tracing::instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_id("affiliate", &id)?;
    if !state.store.delete_affiliate(&id).await? {
        return Err(AppError::not_found("Affiliate not found"));
    }
    tracing::info!(affiliate_id = %id, "Affiliate deleted");
    Ok(Json(MessageResponse::new("Affiliate deleted")))
}
