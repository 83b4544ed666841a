use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddGroupUserRequest {
    pub email: String,
}

/// Public projection of a user row; never carries the password hash.
#[derive(Debug, Serialize, FromRow, ToSchema)]
pub struct StaffUser {
    pub id: Uuid,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct StaffUserList {
    #[schema(value_type = Vec<StaffUser>)]
    pub items: Vec<StaffUser>,
}
