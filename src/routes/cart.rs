use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};

use crate::{
    dto::cart::{AddToCartRequest, CartList, RemoveFromCartRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::CartItem,
    response::ApiResponse,
    routes::params::Pagination,
    services::cart_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/menu-items",
        get(cart_list).post(add_to_cart).delete(remove_from_cart),
    )
}

#[utoipa::path(
    get,
    path = "/api/cart/menu-items",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20")
    ),
    responses(
        (status = 200, description = "List cart items for current user", body = ApiResponse<CartList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn cart_list(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<CartList>>> {
    let resp = cart_service::list_cart(&state, &user, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/cart/menu-items",
    request_body = AddToCartRequest,
    responses(
        (status = 200, description = "Add item to cart", body = ApiResponse<CartItem>),
        (status = 400, description = "Invalid quantity"),
        (status = 404, description = "Menu item not found"),
        (status = 409, description = "Item already in cart"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AddToCartRequest>,
) -> AppResult<Json<ApiResponse<CartItem>>> {
    let resp = cart_service::add_to_cart(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/cart/menu-items",
    request_body = RemoveFromCartRequest,
    responses(
        (status = 200, description = "Remove one item, or clear the cart when the body is omitted or menu_item_id is null"),
        (status = 404, description = "Cart item not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn remove_from_cart(
    State(state): State<AppState>,
    user: AuthUser,
    body: Option<Json<RemoveFromCartRequest>>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    // No body at all means clear the whole cart.
    let payload = body
        .map(|Json(payload)| payload)
        .unwrap_or(RemoveFromCartRequest { menu_item_id: None });
    let resp = cart_service::remove_from_cart(&state, &user, payload).await?;
    Ok(Json(resp))
}
