//! Shared fixtures for the integration suite. Each test gets its own
//! database via `#[sqlx::test]`, with migrations already applied.

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use stagepass_server::auth::{Principal, Role};

#[allow(dead_code)]
pub fn user() -> Principal {
    Principal {
        id: Uuid::new_v4(),
        role: Role::User,
    }
}

#[allow(dead_code)]
pub fn admin() -> Principal {
    Principal {
        id: Uuid::new_v4(),
        role: Role::Admin,
    }
}

/// Insert an active event starting three days from now, all seats open.
pub async fn seed_event(pool: &PgPool, total_seats: i32, price: Decimal) -> Uuid {
    let id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO events (id, title, description, location, price, total_seats, available_seats, start_time)
         VALUES ($1, $2, NULL, $3, $4, $5, $5, $6)",
    )
    .bind(id)
    .bind(format!("Event {id}"))
    .bind("Main Hall")
    .bind(price)
    .bind(total_seats)
    .bind(Utc::now() + Duration::days(3))
    .execute(pool)
    .await
    .expect("failed to seed event");
    id
}

pub async fn available_seats(pool: &PgPool, event_id: Uuid) -> i32 {
    sqlx::query_scalar("SELECT available_seats FROM events WHERE id = $1")
        .bind(event_id)
        .fetch_one(pool)
        .await
        .expect("failed to read available_seats")
}

/// The ledger's core invariant: seats taken from the event equal the sum
/// of seats across its non-cancelled bookings.
pub async fn assert_seat_invariant(pool: &PgPool, event_id: Uuid) {
    let (total, available): (i32, i32) =
        sqlx::query_as("SELECT total_seats, available_seats FROM events WHERE id = $1")
            .bind(event_id)
            .fetch_one(pool)
            .await
            .expect("failed to read event");

    let booked: i64 = sqlx::query_scalar::<_, Option<i64>>(
        "SELECT SUM(number_of_seats) FROM bookings WHERE event_id = $1 AND status <> 'cancelled'",
    )
    .bind(event_id)
    .fetch_one(pool)
    .await
    .expect("failed to sum bookings")
    .unwrap_or(0);

    assert_eq!(
        i64::from(total - available),
        booked,
        "seat invariant violated: total={total} available={available} booked={booked}"
    );
}
