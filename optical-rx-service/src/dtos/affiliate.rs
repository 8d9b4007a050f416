use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{Affiliate, AffiliateCategory, AffiliateFields};

fn default_active() -> bool {
    true
}

/// Body for both create and full-replacement update.
#[derive(Debug, Deserialize, Validate)]
pub struct AffiliateRequest {
    #[validate(length(min = 1, max = 100, message = "Name is required"))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[validate(url(message = "URL must be a valid http(s) URL"))]
    pub url: String,
    pub category: AffiliateCategory,
    #[serde(default)]
    pub discount: String,
    pub commission: Option<String>,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub order: i32,
}

impl AffiliateRequest {
    pub fn has_http_scheme(&self) -> bool {
        let url = self.url.trim().to_ascii_lowercase();
        url.starts_with("http://") || url.starts_with("https://")
    }
}

impl From<AffiliateRequest> for AffiliateFields {
    fn from(req: AffiliateRequest) -> Self {
        Self {
            name: req.name.trim().to_string(),
            description: req.description,
            url: req.url.trim().to_string(),
            category: req.category,
            discount: req.discount,
            commission: req.commission,
            is_featured: req.is_featured,
            is_active: req.is_active,
            order: req.order,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AffiliateResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub url: String,
    pub category: AffiliateCategory,
    pub discount: String,
    pub commission: Option<String>,
    pub is_featured: bool,
    pub is_active: bool,
    pub order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Affiliate> for AffiliateResponse {
    fn from(a: Affiliate) -> Self {
        Self {
            id: a.id,
            name: a.name,
            description: a.description,
            url: a.url,
            category: a.category,
            discount: a.discount,
            commission: a.commission,
            is_featured: a.is_featured,
            is_active: a.is_active,
            order: a.order,
            created_at: a.created_at,
            updated_at: a.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PartnersResponse {
    pub partners: Vec<AffiliateResponse>,
}
