use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{LoginRequest, LoginResponse, RegisterRequest},
        bookings::{BookingList, CreateBookingRequest},
        cart::{AddToCartRequest, CartItemDto, CartList, RemoveFromCartRequest},
        groups::{AddGroupUserRequest, StaffUser, StaffUserList},
        menu::{
            CategoryList, CreateCategoryRequest, CreateMenuItemRequest, MenuItemList,
            UpdateMenuItemRequest,
        },
        orders::{AssignCrewRequest, OrderList, OrderWithItems},
    },
    models::{Booking, CartItem, Category, MenuItem, Order, OrderItem, User},
    response::{ApiResponse, Meta},
    routes::{auth, bookings, cart, groups, health, menu, orders, params},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::login,
        auth::register,
        menu::list_menu_items,
        menu::get_menu_item,
        menu::create_menu_item,
        menu::update_menu_item,
        menu::toggle_featured,
        menu::delete_menu_item,
        menu::list_categories,
        menu::create_category,
        groups::list_managers,
        groups::add_manager,
        groups::remove_manager,
        groups::list_delivery_crew,
        groups::add_delivery_crew,
        groups::remove_delivery_crew,
        cart::cart_list,
        cart::add_to_cart,
        cart::remove_from_cart,
        orders::list_orders,
        orders::place_order,
        orders::get_order,
        orders::toggle_delivered,
        orders::assign_crew,
        orders::delete_order,
        bookings::create_booking,
        bookings::list_bookings
    ),
    components(
        schemas(
            User,
            Category,
            MenuItem,
            CartItem,
            Order,
            OrderItem,
            Booking,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            CreateMenuItemRequest,
            UpdateMenuItemRequest,
            MenuItemList,
            CreateCategoryRequest,
            CategoryList,
            AddGroupUserRequest,
            StaffUser,
            StaffUserList,
            AddToCartRequest,
            RemoveFromCartRequest,
            CartItemDto,
            CartList,
            AssignCrewRequest,
            OrderList,
            OrderWithItems,
            CreateBookingRequest,
            BookingList,
            params::Pagination,
            params::MenuItemQuery,
            params::OrderListQuery,
            params::BookingQuery,
            Meta,
            health::HealthData,
            ApiResponse<health::HealthData>,
            ApiResponse<MenuItem>,
            ApiResponse<MenuItemList>,
            ApiResponse<CartList>,
            ApiResponse<OrderList>,
            ApiResponse<OrderWithItems>,
            ApiResponse<BookingList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Menu", description = "Menu item and category endpoints"),
        (name = "Groups", description = "Staff role management"),
        (name = "Cart", description = "Cart endpoints"),
        (name = "Orders", description = "Order endpoints"),
        (name = "Bookings", description = "Table booking endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
