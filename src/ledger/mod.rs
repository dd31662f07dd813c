//! Seat-inventory ledger.
//!
//! Every seat-count mutation happens here, against an event row locked
//! with `SELECT ... FOR UPDATE` for the whole read-validate-write
//! sequence, inside a transaction the caller owns. The caller commits or
//! rolls back; the ledger itself never retries and never leaves a partial
//! write behind (seat decrement and booking row move together or not at
//! all).

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::PgConnection;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Booking, BookingStatus, Event};

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unavailable(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("Transaction failed: {0}")]
    TransactionFailure(#[from] sqlx::Error),
}

/// Reserve `seats` on an event for `user_id`, creating a confirmed
/// booking and decrementing `available_seats` as one unit of work.
///
/// `conn` must already be inside a transaction. Preconditions are checked
/// in order, first failure wins: event exists and is bookable, no other
/// active booking by this user, enough seats remaining.
pub async fn reserve(
    conn: &mut PgConnection,
    event_id: Uuid,
    user_id: Uuid,
    seats: i32,
    note: Option<String>,
) -> Result<Booking, LedgerError> {
    // Lock the inventory row. Concurrent reservations against the same
    // event queue here, so the seat check below can never act on a count
    // another writer is about to invalidate.
    let event = sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1 FOR UPDATE")
        .bind(event_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| LedgerError::NotFound("Event not found".to_string()))?;

    event.check_bookable(Utc::now())?;

    let duplicate = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (
            SELECT 1 FROM bookings
            WHERE user_id = $1 AND event_id = $2 AND status <> 'cancelled'
        )",
    )
    .bind(user_id)
    .bind(event_id)
    .fetch_one(&mut *conn)
    .await?;
    if duplicate {
        return Err(LedgerError::Conflict(
            "You already have an active booking for this event".to_string(),
        ));
    }

    event.check_seats(seats)?;

    let total_amount = event.price * Decimal::from(seats);

    let booking = sqlx::query_as::<_, Booking>(
        "INSERT INTO bookings (id, user_id, event_id, number_of_seats, total_amount, status, note)
         VALUES ($1, $2, $3, $4, $5, $6, $7)
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(event_id)
    .bind(seats)
    .bind(total_amount)
    .bind(BookingStatus::Confirmed)
    .bind(note)
    .fetch_one(&mut *conn)
    .await?;

    // Write the count computed from the locked read, not a fresh one.
    write_available_seats(&mut *conn, &event, event.available_seats - seats).await?;

    tracing::debug!(
        event_id = %event_id,
        user_id = %user_id,
        seats,
        remaining = event.available_seats - seats,
        "Seats reserved"
    );

    Ok(booking)
}

/// Cancel a booking owned by `user_id`, returning the freed seats to the
/// event's inventory in the same transaction.
pub async fn cancel(
    conn: &mut PgConnection,
    booking_id: Uuid,
    user_id: Uuid,
) -> Result<Booking, LedgerError> {
    // Lock the booking first so a racing double-cancel serializes here.
    let booking = sqlx::query_as::<_, Booking>(
        "SELECT * FROM bookings WHERE id = $1 AND user_id = $2 FOR UPDATE",
    )
    .bind(booking_id)
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| LedgerError::NotFound("Booking not found".to_string()))?;

    if booking.status == BookingStatus::Cancelled {
        return Err(LedgerError::InvalidRequest(
            "Booking is already cancelled".to_string(),
        ));
    }

    let event = sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1 FOR UPDATE")
        .bind(booking.event_id)
        .fetch_one(&mut *conn)
        .await?;

    if !event.cancellable_at(Utc::now()) {
        return Err(LedgerError::InvalidRequest(
            "Cannot cancel a booking for a past event".to_string(),
        ));
    }

    let cancelled = sqlx::query_as::<_, Booking>(
        "UPDATE bookings SET status = 'cancelled', updated_at = now()
         WHERE id = $1
         RETURNING *",
    )
    .bind(booking.id)
    .fetch_one(&mut *conn)
    .await?;

    write_available_seats(
        &mut *conn,
        &event,
        event.available_seats + booking.number_of_seats,
    )
    .await?;

    tracing::debug!(
        booking_id = %booking.id,
        event_id = %event.id,
        restored = booking.number_of_seats,
        "Booking cancelled, seats restored"
    );

    Ok(cancelled)
}

/// Write an absolute seat count computed under the row lock held by the
/// caller.
async fn write_available_seats(
    conn: &mut PgConnection,
    event: &Event,
    new_available: i32,
) -> Result<(), LedgerError> {
    debug_assert!(new_available >= 0 && new_available <= event.total_seats);

    sqlx::query("UPDATE events SET available_seats = $1, updated_at = now() WHERE id = $2")
        .bind(new_available)
        .bind(event.id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}
