use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::FamilyMember;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateFamilyMemberRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 50, message = "Relationship must be 1-50 characters"))]
    pub relationship: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateFamilyMemberRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 50, message = "Relationship must be 1-50 characters"))]
    pub relationship: Option<String>,
}

impl UpdateFamilyMemberRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.relationship.is_none()
    }
}

#[derive(Debug, Serialize)]
pub struct FamilyMemberResponse {
    pub id: String,
    pub name: String,
    pub relationship: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<FamilyMember> for FamilyMemberResponse {
    fn from(member: FamilyMember) -> Self {
        Self {
            id: member.id,
            name: member.name,
            relationship: member.relationship,
            created_at: member.created_at,
            updated_at: member.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteFamilyMemberResponse {
    pub message: String,
    pub deleted_prescriptions: u64,
}
