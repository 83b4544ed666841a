use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::MenuItem;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    pub menu_item_id: Uuid,
    pub quantity: i32,
}

/// `menu_item_id` absent or null clears the whole cart.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RemoveFromCartRequest {
    #[serde(default)]
    pub menu_item_id: Option<Uuid>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartList {
    pub items: Vec<CartItemDto>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartItemDto {
    pub id: Uuid,
    pub menu_item: MenuItem,
    pub quantity: i32,
    pub unit_price_cents: i64,
    pub price_cents: i64,
}
