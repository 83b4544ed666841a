use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};

use crate::{
    dto::bookings::{BookingList, CreateBookingRequest},
    error::AppResult,
    models::Booking,
    response::ApiResponse,
    routes::params::BookingQuery,
    services::booking_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_bookings).post(create_booking))
}

#[utoipa::path(
    post,
    path = "/api/bookings",
    request_body = CreateBookingRequest,
    responses(
        (status = 200, description = "Create booking", body = ApiResponse<Booking>),
        (status = 409, description = "Slot already booked"),
    ),
    tag = "Bookings"
)]
pub async fn create_booking(
    State(state): State<AppState>,
    Json(payload): Json<CreateBookingRequest>,
) -> AppResult<Json<ApiResponse<Booking>>> {
    let resp = booking_service::create_booking(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/bookings",
    params(("date" = Option<String>, Query, description = "Reservation date (YYYY-MM-DD), default today")),
    responses(
        (status = 200, description = "List bookings for a date", body = ApiResponse<BookingList>)
    ),
    tag = "Bookings"
)]
pub async fn list_bookings(
    State(state): State<AppState>,
    Query(query): Query<BookingQuery>,
) -> AppResult<Json<ApiResponse<BookingList>>> {
    let resp = booking_service::list_bookings(&state, query).await?;
    Ok(Json(resp))
}
