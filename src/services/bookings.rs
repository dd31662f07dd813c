//! Booking orchestration. Owns the transaction lifecycle around the
//! ledger: begin, commit on success, roll back on any failure. Also owns
//! the caller-visibility rule for reads: non-admin principals only ever
//! see their own bookings.

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::auth::Principal;
use crate::ledger::{self, LedgerError};
use crate::models::BookingWithEvent;

const BOOKING_WITH_EVENT: &str = "SELECT b.id, b.user_id, b.event_id, b.number_of_seats,
            b.total_amount, b.status, b.note, b.created_at,
            e.title AS event_title, e.location AS event_location,
            e.start_time AS event_start_time, e.price AS event_price
     FROM bookings b
     JOIN events e ON e.id = b.event_id";

/// Store-level aborts (serialization failure, deadlock) get one fresh
/// attempt; everything else is surfaced to the caller as-is.
const MAX_ATTEMPTS: u32 = 2;

#[derive(Clone)]
pub struct BookingService {
    pool: PgPool,
}

impl BookingService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn reserve(
        &self,
        principal: &Principal,
        event_id: Uuid,
        seats: i32,
        note: Option<String>,
    ) -> Result<BookingWithEvent, LedgerError> {
        let mut attempt = 1;
        loop {
            let result = self
                .reserve_once(principal.id, event_id, seats, note.clone())
                .await;
            match result {
                Err(ref e) if attempt < MAX_ATTEMPTS && is_retryable(e) => {
                    tracing::warn!(attempt, event_id = %event_id, "Reservation aborted by the store, retrying");
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    pub async fn cancel(
        &self,
        principal: &Principal,
        booking_id: Uuid,
    ) -> Result<BookingWithEvent, LedgerError> {
        let mut attempt = 1;
        loop {
            let result = self.cancel_once(principal.id, booking_id).await;
            match result {
                Err(ref e) if attempt < MAX_ATTEMPTS && is_retryable(e) => {
                    tracing::warn!(attempt, booking_id = %booking_id, "Cancellation aborted by the store, retrying");
                    attempt += 1;
                }
                other => return other,
            }
        }
    }

    /// Bookings visible to the principal, newest first. Admins see every
    /// booking; everyone else sees their own.
    pub async fn list_for(
        &self,
        principal: &Principal,
    ) -> Result<Vec<BookingWithEvent>, LedgerError> {
        let bookings = if principal.is_admin() {
            sqlx::query_as::<_, BookingWithEvent>(&format!(
                "{BOOKING_WITH_EVENT} ORDER BY b.created_at DESC"
            ))
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query_as::<_, BookingWithEvent>(&format!(
                "{BOOKING_WITH_EVENT} WHERE b.user_id = $1 ORDER BY b.created_at DESC"
            ))
            .bind(principal.id)
            .fetch_all(&self.pool)
            .await?
        };
        Ok(bookings)
    }

    /// A booking that exists but belongs to someone else reads as not
    /// found, so existence is not leaked across principals.
    pub async fn get_for(
        &self,
        principal: &Principal,
        booking_id: Uuid,
    ) -> Result<BookingWithEvent, LedgerError> {
        let booking =
            sqlx::query_as::<_, BookingWithEvent>(&format!("{BOOKING_WITH_EVENT} WHERE b.id = $1"))
                .bind(booking_id)
                .fetch_optional(&self.pool)
                .await?
                .filter(|b| principal.is_admin() || b.user_id == principal.id)
                .ok_or_else(|| LedgerError::NotFound("Booking not found".to_string()))?;
        Ok(booking)
    }

    async fn reserve_once(
        &self,
        user_id: Uuid,
        event_id: Uuid,
        seats: i32,
        note: Option<String>,
    ) -> Result<BookingWithEvent, LedgerError> {
        let mut tx = self.pool.begin().await?;

        let booking = match ledger::reserve(&mut tx, event_id, user_id, seats, note).await {
            Ok(booking) => booking,
            Err(e) => {
                let _ = tx.rollback().await;
                return Err(e);
            }
        };

        let joined = match fetch_joined(&mut tx, booking.id).await {
            Ok(joined) => joined,
            Err(e) => {
                let _ = tx.rollback().await;
                return Err(e);
            }
        };

        tx.commit().await?;
        Ok(joined)
    }

    async fn cancel_once(
        &self,
        user_id: Uuid,
        booking_id: Uuid,
    ) -> Result<BookingWithEvent, LedgerError> {
        let mut tx = self.pool.begin().await?;

        if let Err(e) = ledger::cancel(&mut tx, booking_id, user_id).await {
            let _ = tx.rollback().await;
            return Err(e);
        }

        let joined = match fetch_joined(&mut tx, booking_id).await {
            Ok(joined) => joined,
            Err(e) => {
                let _ = tx.rollback().await;
                return Err(e);
            }
        };

        tx.commit().await?;
        Ok(joined)
    }
}

async fn fetch_joined(
    conn: &mut PgConnection,
    booking_id: Uuid,
) -> Result<BookingWithEvent, LedgerError> {
    let joined =
        sqlx::query_as::<_, BookingWithEvent>(&format!("{BOOKING_WITH_EVENT} WHERE b.id = $1"))
            .bind(booking_id)
            .fetch_one(&mut *conn)
            .await?;
    Ok(joined)
}

fn is_retryable(err: &LedgerError) -> bool {
    match err {
        LedgerError::TransactionFailure(sqlx::Error::Database(db)) => {
            // Postgres serialization_failure / deadlock_detected
            matches!(db.code().as_deref(), Some("40001") | Some("40P01"))
        }
        _ => false,
    }
}
