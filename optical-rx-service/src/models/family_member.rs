use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// A person whose prescriptions are tracked. Owns zero or more prescriptions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FamilyMember {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub object_id: Option<ObjectId>,
    pub id: String,
    pub account_id: String,
    pub name: String,
    pub relationship: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub updated_at: DateTime<Utc>,
}

impl FamilyMember {
    pub fn new(account_id: String, name: String, relationship: String) -> Self {
        let now = Utc::now();
        Self {
            object_id: None,
            id: super::new_id(),
            account_id,
            name,
            relationship,
            created_at: now,
            updated_at: now,
        }
    }
}
