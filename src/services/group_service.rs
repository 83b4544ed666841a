use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::groups::{AddGroupUserRequest, StaffUser, StaffUserList},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, Role, ensure_manager},
    response::{ApiResponse, Meta},
    state::AppState,
};

fn group_label(role: Role) -> &'static str {
    match role {
        Role::Manager => "Managers",
        Role::DeliveryCrew => "Delivery crew",
        _ => "Users",
    }
}

pub async fn list_group(
    state: &AppState,
    user: &AuthUser,
    role: Role,
) -> AppResult<ApiResponse<StaffUserList>> {
    ensure_manager(user)?;

    let items = sqlx::query_as::<_, StaffUser>(
        "SELECT id, email, role, created_at FROM users WHERE role = $1 ORDER BY email",
    )
    .bind(role.as_str())
    .fetch_all(&state.pool)
    .await?;

    Ok(ApiResponse::success(
        group_label(role),
        StaffUserList { items },
        Some(Meta::empty()),
    ))
}

/// Grants the staff role to an existing user, identified by email.
pub async fn add_to_group(
    state: &AppState,
    user: &AuthUser,
    role: Role,
    payload: AddGroupUserRequest,
) -> AppResult<ApiResponse<StaffUser>> {
    ensure_manager(user)?;

    // Admins sit above the groups API; a grant must never overwrite the
    // admin role.
    let target: Option<StaffUser> = sqlx::query_as(
        "UPDATE users SET role = $1 WHERE email = $2 AND role <> $3 \
         RETURNING id, email, role, created_at",
    )
    .bind(role.as_str())
    .bind(&payload.email)
    .bind(Role::Admin.as_str())
    .fetch_optional(&state.pool)
    .await?;
    let target = match target {
        Some(t) => t,
        None => {
            // Distinguish "no such user" from "user is an admin".
            let existing: Option<(String,)> =
                sqlx::query_as("SELECT role FROM users WHERE email = $1")
                    .bind(&payload.email)
                    .fetch_optional(&state.pool)
                    .await?;
            return Err(match existing {
                Some(_) => {
                    AppError::BadRequest("cannot change an admin's role".to_string())
                }
                None => AppError::NotFound,
            });
        }
    };

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "group_add",
        Some("users"),
        Some(serde_json::json!({ "user_id": target.id, "role": role.as_str() })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        format!("User added to {} group", group_label(role)),
        target,
        Some(Meta::empty()),
    ))
}

/// Demotes the user back to customer. 404 when the user does not currently
/// hold the role.
pub async fn remove_from_group(
    state: &AppState,
    user: &AuthUser,
    role: Role,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_manager(user)?;

    let result = sqlx::query("UPDATE users SET role = $1 WHERE id = $2 AND role = $3")
        .bind(Role::Customer.as_str())
        .bind(id)
        .bind(role.as_str())
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "group_remove",
        Some("users"),
        Some(serde_json::json!({ "user_id": id, "role": role.as_str() })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        format!("User removed from {} group", group_label(role)),
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
