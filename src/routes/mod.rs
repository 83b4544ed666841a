use axum::Router;

use crate::state::AppState;

pub mod auth;
pub mod bookings;
pub mod cart;
pub mod doc;
pub mod groups;
pub mod health;
pub mod menu;
pub mod orders;
pub mod params;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/menu-items", menu::menu_router())
        .nest("/categories", menu::category_router())
        .nest("/groups", groups::router())
        .nest("/cart", cart::router())
        .nest("/orders", orders::router())
        .nest("/bookings", bookings::router())
        .nest("/auth", auth::router())
}
