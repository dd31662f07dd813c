use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::Principal;
use crate::models::Event;
use crate::routes::AppState;
use crate::utils::error::AppError;
use crate::utils::response::{created, success};

#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    pub title: String,
    pub description: Option<String>,
    pub location: String,
    pub price: Decimal,
    pub total_seats: i32,
    pub start_time: DateTime<Utc>,
}

impl CreateEventRequest {
    fn validate(&self) -> Result<(), AppError> {
        if self.title.trim().is_empty() || self.title.len() > 200 {
            return Err(AppError::ValidationError(
                "title must be between 1 and 200 characters".to_string(),
            ));
        }
        if self.location.trim().is_empty() {
            return Err(AppError::ValidationError(
                "location must not be empty".to_string(),
            ));
        }
        if self.price < Decimal::ZERO {
            return Err(AppError::ValidationError(
                "price must not be negative".to_string(),
            ));
        }
        if self.total_seats < 1 {
            return Err(AppError::ValidationError(
                "total_seats must be at least 1".to_string(),
            ));
        }
        if self.start_time <= Utc::now() {
            return Err(AppError::ValidationError(
                "start_time must be in the future".to_string(),
            ));
        }
        Ok(())
    }
}

/// Active events that have not started yet, soonest first.
pub async fn list_events(State(state): State<AppState>) -> Result<Response, AppError> {
    let events = sqlx::query_as::<_, Event>(
        "SELECT * FROM events
         WHERE is_active AND start_time > now()
         ORDER BY start_time",
    )
    .fetch_all(&state.pool)
    .await?;

    Ok(success(events, "Events retrieved").into_response())
}

pub async fn get_event(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> Result<Response, AppError> {
    let event = sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1")
        .bind(event_id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

    Ok(success(event, "Event retrieved").into_response())
}

/// Admin only. The event opens with every seat available.
pub async fn create_event(
    State(state): State<AppState>,
    principal: Principal,
    Json(payload): Json<CreateEventRequest>,
) -> Result<Response, AppError> {
    if !principal.is_admin() {
        return Err(AppError::Forbidden(
            "Only administrators may create events".to_string(),
        ));
    }
    payload.validate()?;

    let event = sqlx::query_as::<_, Event>(
        "INSERT INTO events (id, title, description, location, price, total_seats, available_seats, start_time)
         VALUES ($1, $2, $3, $4, $5, $6, $6, $7)
         RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(&payload.title)
    .bind(&payload.description)
    .bind(&payload.location)
    .bind(payload.price)
    .bind(payload.total_seats)
    .bind(payload.start_time)
    .fetch_one(&state.pool)
    .await?;

    tracing::info!(event_id = %event.id, title = %event.title, "Event created");

    Ok(created(event, "Event created").into_response())
}
