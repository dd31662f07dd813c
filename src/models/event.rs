use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::ledger::LedgerError;

/// One bookable event, carrying its own seat inventory.
///
/// `available_seats` is only ever written inside a transaction that also
/// writes the booking row driving the change, with the event row locked
/// for the duration. Invariant: `0 <= available_seats <= total_seats`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub location: String,
    pub price: Decimal,
    pub total_seats: i32,
    pub available_seats: i32,
    pub is_active: bool,
    pub start_time: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    /// Pure bookability check, run by the ledger against the row it holds
    /// locked: the event must be active and must not have started.
    pub fn check_bookable(&self, now: DateTime<Utc>) -> Result<(), LedgerError> {
        if !self.is_active {
            return Err(LedgerError::Unavailable(
                "Event is no longer active".to_string(),
            ));
        }
        if self.start_time <= now {
            return Err(LedgerError::Unavailable(
                "Event has already started".to_string(),
            ));
        }
        Ok(())
    }

    /// Pure seat-sufficiency check. The failure message carries the
    /// current availability so a rejected caller knows what is left.
    pub fn check_seats(&self, seats: i32) -> Result<(), LedgerError> {
        if seats > self.available_seats {
            return Err(LedgerError::InvalidRequest(format!(
                "Only {} seats available",
                self.available_seats
            )));
        }
        Ok(())
    }

    /// Whether a booking against this event may still be cancelled. The
    /// cut-off is strict: from the instant the event starts, cancellation
    /// is rejected, whether or not the event has finished.
    pub fn cancellable_at(&self, now: DateTime<Utc>) -> bool {
        self.start_time > now
    }
}
