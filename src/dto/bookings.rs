use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Booking;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBookingRequest {
    pub first_name: String,
    pub reservation_date: NaiveDate,
    pub reservation_slot: i32,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct BookingList {
    #[schema(value_type = Vec<Booking>)]
    pub items: Vec<Booking>,
}
