use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use service_core::error::AppError;

use crate::models::DEFAULT_ACCOUNT_ID;

pub const ACCOUNT_ID_HEADER: &str = "x-account-id";

const MAX_ACCOUNT_ID_LEN: usize = 128;

/// Account scope of a request, from `X-Account-Id`. Requests without the
/// header share the legacy single-tenant account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountId(pub String);

impl AccountId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_valid_account_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_ACCOUNT_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '@'))
}

#[async_trait]
impl<S> FromRequestParts<S> for AccountId
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(ACCOUNT_ID_HEADER) else {
            return Ok(AccountId(DEFAULT_ACCOUNT_ID.to_string()));
        };

        let id = value
            .to_str()
            .map(str::trim)
            .map_err(|_| AppError::bad_request("Invalid X-Account-Id header"))?;

        if !is_valid_account_id(id) {
            return Err(AppError::bad_request("Invalid X-Account-Id header"));
        }
        Ok(AccountId(id.to_string()))
    }
}
