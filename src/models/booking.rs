use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Booking lifecycle. Bookings are created `confirmed` and move only to
/// `cancelled`; rows are never deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "booking_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub number_of_seats: i32,
    /// Event price at reservation time times `number_of_seats`; frozen at
    /// creation, unaffected by later event price changes.
    pub total_amount: Decimal,
    pub status: BookingStatus,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Booking joined with the summary fields of its event, the shape the API
/// returns. The join is an explicit query; there is no association magic
/// between the two tables.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BookingWithEvent {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub number_of_seats: i32,
    pub total_amount: Decimal,
    pub status: BookingStatus,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub event_title: String,
    pub event_location: String,
    pub event_start_time: DateTime<Utc>,
    pub event_price: Decimal,
}
