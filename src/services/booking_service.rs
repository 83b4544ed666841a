use chrono::Utc;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::bookings::{BookingList, CreateBookingRequest},
    error::{AppError, AppResult, is_unique_violation},
    models::Booking,
    response::{ApiResponse, Meta},
    routes::params::BookingQuery,
    state::AppState,
};

/// Reserves a (date, slot) pair. The pre-check gives a friendly early answer;
/// the unique constraint on (reservation_date, reservation_slot) is what
/// actually guarantees no double booking under concurrent requests.
pub async fn create_booking(
    state: &AppState,
    payload: CreateBookingRequest,
) -> AppResult<ApiResponse<Booking>> {
    let taken: Option<(Uuid,)> = sqlx::query_as(
        "SELECT id FROM bookings WHERE reservation_date = $1 AND reservation_slot = $2",
    )
    .bind(payload.reservation_date)
    .bind(payload.reservation_slot)
    .fetch_optional(&state.pool)
    .await?;
    if taken.is_some() {
        return Err(AppError::Conflict("Slot already booked".to_string()));
    }

    let booking = sqlx::query_as::<_, Booking>(
        r#"
        INSERT INTO bookings (id, first_name, reservation_date, reservation_slot)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&payload.first_name)
    .bind(payload.reservation_date)
    .bind(payload.reservation_slot)
    .fetch_one(&state.pool)
    .await
    .map_err(|err| {
        if is_unique_violation(&err) {
            AppError::Conflict("Slot already booked".to_string())
        } else {
            err.into()
        }
    })?;

    if let Err(err) = log_audit(
        &state.pool,
        None,
        "booking_create",
        Some("bookings"),
        Some(serde_json::json!({
            "booking_id": booking.id,
            "reservation_date": booking.reservation_date,
            "reservation_slot": booking.reservation_slot,
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Booking created", booking, None))
}

pub async fn list_bookings(
    state: &AppState,
    query: BookingQuery,
) -> AppResult<ApiResponse<BookingList>> {
    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());

    let items = sqlx::query_as::<_, Booking>(
        "SELECT * FROM bookings WHERE reservation_date = $1 ORDER BY reservation_slot",
    )
    .bind(date)
    .fetch_all(&state.pool)
    .await?;

    Ok(ApiResponse::success(
        "Bookings",
        BookingList { items },
        Some(Meta::empty()),
    ))
}
