use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use service_core::{error::AppError, utils::secrets_match};

use crate::startup::AppState;

pub const ADMIN_KEY_HEADER: &str = "x-admin-key";

/// Gate for dashboard and affiliate mutation routes.
pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let provided = request
        .headers()
        .get(ADMIN_KEY_HEADER)
        .and_then(|v| v.to_str().ok());

    match provided {
        Some(key) if secrets_match(state.config.admin_key(), key) => Ok(next.run(request).await),
        Some(_) => {
            tracing::warn!(path = %request.uri().path(), "Rejected invalid admin key");
            Err(AppError::forbidden("Invalid admin key"))
        }
        None => Err(AppError::forbidden("Admin key required")),
    }
}
