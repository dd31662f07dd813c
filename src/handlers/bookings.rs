use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::Principal;
use crate::routes::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{created, success};

pub const MAX_SEATS_PER_BOOKING: i32 = 10;
pub const MAX_NOTE_CHARS: usize = 500;

#[derive(Debug, Deserialize)]
pub struct CreateBookingRequest {
    pub event_id: Uuid,
    pub number_of_seats: i32,
    pub note: Option<String>,
}

impl CreateBookingRequest {
    /// Shape checks only; domain preconditions (availability, duplicates,
    /// seat counts) belong to the ledger.
    fn validate(&self) -> Result<(), AppError> {
        if self.number_of_seats < 1 || self.number_of_seats > MAX_SEATS_PER_BOOKING {
            return Err(AppError::ValidationError(format!(
                "number_of_seats must be between 1 and {MAX_SEATS_PER_BOOKING}"
            )));
        }
        if let Some(note) = &self.note {
            if note.chars().count() > MAX_NOTE_CHARS {
                return Err(AppError::ValidationError(format!(
                    "note must be at most {MAX_NOTE_CHARS} characters"
                )));
            }
        }
        Ok(())
    }
}

pub async fn create_booking(
    State(state): State<AppState>,
    principal: Principal,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<Response, AppError> {
    payload.validate()?;

    let booking = state
        .bookings
        .reserve(
            &principal,
            payload.event_id,
            payload.number_of_seats,
            payload.note,
        )
        .await?;

    Ok(created(booking, "Booking confirmed").into_response())
}

pub async fn cancel_booking(
    State(state): State<AppState>,
    principal: Principal,
    Path(booking_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let booking = state.bookings.cancel(&principal, booking_id).await?;

    Ok(success(booking, "Booking cancelled").into_response())
}

pub async fn list_bookings(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Response, AppError> {
    let bookings = state.bookings.list_for(&principal).await?;

    Ok(success(bookings, "Bookings retrieved").into_response())
}

pub async fn get_booking(
    State(state): State<AppState>,
    principal: Principal,
    Path(booking_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let booking = state.bookings.get_for(&principal, booking_id).await?;

    Ok(success(booking, "Booking retrieved").into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(seats: i32, note: Option<String>) -> CreateBookingRequest {
        CreateBookingRequest {
            event_id: Uuid::new_v4(),
            number_of_seats: seats,
            note,
        }
    }

    #[test]
    fn seat_count_bounds() {
        assert!(request(1, None).validate().is_ok());
        assert!(request(10, None).validate().is_ok());
        assert!(request(0, None).validate().is_err());
        assert!(request(11, None).validate().is_err());
        assert!(request(-3, None).validate().is_err());
    }

    #[test]
    fn note_length_bound() {
        assert!(request(2, Some("window seat please".to_string()))
            .validate()
            .is_ok());
        assert!(request(2, Some("x".repeat(500))).validate().is_ok());
        assert!(request(2, Some("x".repeat(501))).validate().is_err());
    }
}
