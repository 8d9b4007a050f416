use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AffiliateCategory {
    Eyeglasses,
    Contacts,
    Both,
}

/// Directory entry for an eyewear retailer. `order` is a sort key, not unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Affiliate {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub object_id: Option<ObjectId>,
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub url: String,
    pub category: AffiliateCategory,
    #[serde(default)]
    pub discount: String,
    #[serde(default)]
    pub commission: Option<String>,
    #[serde(default)]
    pub is_featured: bool,
    pub is_active: bool,
    pub order: i32,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

/// Caller-editable partner fields.
#[derive(Debug, Clone)]
pub struct AffiliateFields {
    pub name: String,
    pub description: String,
    pub url: String,
    pub category: AffiliateCategory,
    pub discount: String,
    pub commission: Option<String>,
    pub is_featured: bool,
    pub is_active: bool,
    pub order: i32,
}

impl Affiliate {
    pub fn new(fields: AffiliateFields) -> Self {
        let now = Utc::now();
        Self {
            object_id: None,
            id: super::new_id(),
            name: fields.name,
            description: fields.description,
            url: fields.url,
            category: fields.category,
            discount: fields.discount,
            commission: fields.commission,
            is_featured: fields.is_featured,
            is_active: fields.is_active,
            order: fields.order,
            created_at: now,
            updated_at: now,
        }
    }

    /// Full replacement of the editable fields; identity and creation time survive.
    pub fn replace_fields(&mut self, fields: AffiliateFields) {
        self.name = fields.name;
        self.description = fields.description;
        self.url = fields.url;
        self.category = fields.category;
        self.discount = fields.discount;
        self.commission = fields.commission;
        self.is_featured = fields.is_featured;
        self.is_active = fields.is_active;
        self.order = fields.order;
        self.updated_at = Utc::now();
    }
}

/// Sort by `order`, ties by creation time.
pub fn sort_for_display(partners: &mut [Affiliate]) {
    partners.sort_by(|a, b| a.order.cmp(&b.order).then(a.created_at.cmp(&b.created_at)));
}
