use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get},
};
use uuid::Uuid;

use crate::{
    dto::groups::{AddGroupUserRequest, StaffUser, StaffUserList},
    error::AppResult,
    middleware::auth::{AuthUser, Role},
    response::ApiResponse,
    services::group_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/managers/users", get(list_managers).post(add_manager))
        .route("/managers/users/{id}", delete(remove_manager))
        .route(
            "/delivery-crew/users",
            get(list_delivery_crew).post(add_delivery_crew),
        )
        .route("/delivery-crew/users/{id}", delete(remove_delivery_crew))
}

#[utoipa::path(
    get,
    path = "/api/groups/managers/users",
    responses(
        (status = 200, description = "List managers", body = ApiResponse<StaffUserList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Groups"
)]
pub async fn list_managers(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<StaffUserList>>> {
    let resp = group_service::list_group(&state, &user, Role::Manager).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/groups/managers/users",
    request_body = AddGroupUserRequest,
    responses(
        (status = 200, description = "Grant manager role", body = ApiResponse<StaffUser>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Groups"
)]
pub async fn add_manager(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AddGroupUserRequest>,
) -> AppResult<Json<ApiResponse<StaffUser>>> {
    let resp = group_service::add_to_group(&state, &user, Role::Manager, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/groups/managers/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Revoke manager role"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User is not a manager"),
    ),
    security(("bearer_auth" = [])),
    tag = "Groups"
)]
pub async fn remove_manager(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = group_service::remove_from_group(&state, &user, Role::Manager, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/groups/delivery-crew/users",
    responses(
        (status = 200, description = "List delivery crew", body = ApiResponse<StaffUserList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Groups"
)]
pub async fn list_delivery_crew(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<StaffUserList>>> {
    let resp = group_service::list_group(&state, &user, Role::DeliveryCrew).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/groups/delivery-crew/users",
    request_body = AddGroupUserRequest,
    responses(
        (status = 200, description = "Grant delivery crew role", body = ApiResponse<StaffUser>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Groups"
)]
pub async fn add_delivery_crew(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AddGroupUserRequest>,
) -> AppResult<Json<ApiResponse<StaffUser>>> {
    let resp = group_service::add_to_group(&state, &user, Role::DeliveryCrew, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/groups/delivery-crew/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Revoke delivery crew role"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User is not a crew member"),
    ),
    security(("bearer_auth" = [])),
    tag = "Groups"
)]
pub async fn remove_delivery_crew(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = group_service::remove_from_group(&state, &user, Role::DeliveryCrew, id).await?;
    Ok(Json(resp))
}
