use std::str::FromStr;

use axum::{extract::FromRequestParts, http::header};
use jsonwebtoken::{DecodingKey, Validation, decode};
use uuid::Uuid;

use crate::{dto::auth::Claims, error::AppError};

/// Staff roles as an explicit enum; the stored role column and JWT claims
/// carry the lowercase string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Manager,
    DeliveryCrew,
    Customer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::DeliveryCrew => "delivery_crew",
            Role::Customer => "customer",
        }
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "delivery_crew" => Ok(Role::DeliveryCrew),
            "customer" => Ok(Role::Customer),
            _ => Err(AppError::Unauthorized),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Role,
}

pub fn ensure_admin(user: &AuthUser) -> Result<(), AppError> {
    if user.role != Role::Admin {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

/// Manager-or-above gate used by the staff-management and order-admin paths.
pub fn ensure_manager(user: &AuthUser) -> Result<(), AppError> {
    match user.role {
        Role::Admin | Role::Manager => Ok(()),
        _ => Err(AppError::Forbidden),
    }
}

/// Any staff role, delivery crew included.
pub fn ensure_staff(user: &AuthUser) -> Result<(), AppError> {
    match user.role {
        Role::Admin | Role::Manager | Role::DeliveryCrew => Ok(()),
        Role::Customer => Err(AppError::Forbidden),
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;
    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(header::AUTHORIZATION)
            .ok_or(AppError::Unauthorized)?;

        let auth_str = auth_header.to_str().map_err(|_| AppError::Unauthorized)?;

        if !auth_str.starts_with("Bearer ") {
            return Err(AppError::Unauthorized);
        }
        let token = auth_str.trim_start_matches("Bearer ").trim();

        let secret = std::env::var("JWT_SECRET")
            .map_err(|_| AppError::Internal(anyhow::anyhow!("JWT_SECRET is not set")))?;

        let decoded = decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|_| AppError::Unauthorized)?;

        let user_id =
            Uuid::parse_str(&decoded.claims.sub).map_err(|_| AppError::Unauthorized)?;
        let role = Role::from_str(&decoded.claims.role)?;

        Ok(AuthUser { user_id, role })
    }
}
