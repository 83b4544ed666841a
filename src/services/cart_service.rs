use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::cart::{AddToCartRequest, CartItemDto, CartList, RemoveFromCartRequest},
    error::{AppError, AppResult, is_unique_violation},
    middleware::auth::AuthUser,
    models::{CartItem, MenuItem},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

#[derive(FromRow)]
struct CartWithItemRow {
    cart_id: Uuid,
    quantity: i32,
    unit_price_cents: i64,
    price_cents: i64,
    menu_item_id: Uuid,
    title: String,
    item_price_cents: i64,
    featured: bool,
    category_id: Uuid,
    created_at: DateTime<Utc>,
}

pub async fn list_cart(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<CartList>> {
    let (page, limit, offset) = pagination.normalize();
    let rows = sqlx::query_as::<_, CartWithItemRow>(
        r#"
        SELECT ci.id AS cart_id, ci.quantity, ci.unit_price_cents, ci.price_cents,
               m.id AS menu_item_id, m.title, m.price_cents AS item_price_cents,
               m.featured, m.category_id, m.created_at
        FROM cart_items ci
        JOIN menu_items m ON m.id = ci.menu_item_id
        WHERE ci.user_id = $1
        ORDER BY ci.created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user.user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?;

    let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM cart_items WHERE user_id = $1")
        .bind(user.user_id)
        .fetch_one(&state.pool)
        .await?;

    let items = rows
        .into_iter()
        .map(|row| CartItemDto {
            id: row.cart_id,
            menu_item: MenuItem {
                id: row.menu_item_id,
                title: row.title,
                price_cents: row.item_price_cents,
                featured: row.featured,
                category_id: row.category_id,
                created_at: row.created_at,
            },
            quantity: row.quantity,
            unit_price_cents: row.unit_price_cents,
            price_cents: row.price_cents,
        })
        .collect();

    let meta = Meta::new(page, limit, total.0);
    Ok(ApiResponse::success("OK", CartList { items }, Some(meta)))
}

pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartItem>> {
    if payload.quantity <= 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }

    let item: Option<MenuItem> = sqlx::query_as("SELECT * FROM menu_items WHERE id = $1")
        .bind(payload.menu_item_id)
        .fetch_optional(&state.pool)
        .await?;
    let item = match item {
        Some(i) => i,
        None => return Err(AppError::NotFound),
    };

    // Unit price is snapshotted into the row; the row price stays in cents.
    let unit_price_cents = item.price_cents;
    let price_cents = unit_price_cents * payload.quantity as i64;

    // The (user_id, menu_item_id) unique constraint is the source of truth
    // for duplicates; a second insert for the same pair surfaces as 409.
    let cart_item = sqlx::query_as::<_, CartItem>(
        r#"
        INSERT INTO cart_items (id, user_id, menu_item_id, quantity, unit_price_cents, price_cents)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.user_id)
    .bind(payload.menu_item_id)
    .bind(payload.quantity)
    .bind(unit_price_cents)
    .bind(price_cents)
    .fetch_one(&state.pool)
    .await
    .map_err(|err| {
        if is_unique_violation(&err) {
            AppError::Conflict("Item already in cart".to_string())
        } else {
            err.into()
        }
    })?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "cart_add",
        Some("cart_items"),
        Some(serde_json::json!({ "menu_item_id": payload.menu_item_id, "quantity": payload.quantity })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Item added to cart", cart_item, None))
}

pub async fn remove_from_cart(
    state: &AppState,
    user: &AuthUser,
    payload: RemoveFromCartRequest,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let message = match payload.menu_item_id {
        Some(menu_item_id) => {
            let result =
                sqlx::query("DELETE FROM cart_items WHERE menu_item_id = $1 AND user_id = $2")
                    .bind(menu_item_id)
                    .bind(user.user_id)
                    .execute(&state.pool)
                    .await?;

            if result.rows_affected() == 0 {
                return Err(AppError::NotFound);
            }
            "Item removed from cart"
        }
        None => {
            // Clearing an already-empty cart is a no-op, not an error.
            sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
                .bind(user.user_id)
                .execute(&state.pool)
                .await?;
            "All items removed from cart"
        }
    };

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "cart_remove",
        Some("cart_items"),
        Some(serde_json::json!({ "menu_item_id": payload.menu_item_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        message,
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
