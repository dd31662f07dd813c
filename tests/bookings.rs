mod common;

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use stagepass_server::ledger::LedgerError;
use stagepass_server::models::BookingStatus;
use stagepass_server::services::BookingService;

use common::{admin, assert_seat_invariant, available_seats, seed_event, user};

#[sqlx::test]
async fn reserve_and_cancel_walkthrough(pool: PgPool) {
    let service = BookingService::new(pool.clone());
    let event_id = seed_event(&pool, 10, Decimal::new(5000, 2)).await;
    let alice = user();
    let bob = user();

    let booking = service
        .reserve(&alice, event_id, 4, Some("aisle if possible".to_string()))
        .await
        .expect("reservation should succeed");
    assert_eq!(booking.status, BookingStatus::Confirmed);
    assert_eq!(booking.number_of_seats, 4);
    assert_eq!(booking.total_amount, Decimal::new(20000, 2));
    assert_eq!(booking.event_id, event_id);
    assert_eq!(booking.event_price, Decimal::new(5000, 2));
    assert!(!booking.event_title.is_empty());
    assert_eq!(available_seats(&pool, event_id).await, 6);
    assert_seat_invariant(&pool, event_id).await;

    // Bob wants more than what is left; the failure names the remainder.
    let err = service
        .reserve(&bob, event_id, 7, None)
        .await
        .expect_err("overask should fail");
    match err {
        LedgerError::InvalidRequest(msg) => {
            assert!(msg.contains("6 seats available"), "got: {msg}")
        }
        other => panic!("expected InvalidRequest, got {other:?}"),
    }
    assert_eq!(available_seats(&pool, event_id).await, 6);

    let cancelled = service
        .cancel(&alice, booking.id)
        .await
        .expect("cancellation should succeed");
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    assert_eq!(available_seats(&pool, event_id).await, 10);
    assert_seat_invariant(&pool, event_id).await;
}

#[sqlx::test]
async fn second_active_booking_for_same_event_is_a_conflict(pool: PgPool) {
    let service = BookingService::new(pool.clone());
    let event_id = seed_event(&pool, 10, Decimal::new(1500, 2)).await;
    let alice = user();

    let first = service.reserve(&alice, event_id, 2, None).await.unwrap();

    // Plenty of seats left; the duplicate is rejected regardless.
    let err = service.reserve(&alice, event_id, 1, None).await.unwrap_err();
    assert!(matches!(err, LedgerError::Conflict(_)), "got {err:?}");
    assert_eq!(available_seats(&pool, event_id).await, 8);

    // Once the first booking is cancelled, a new one is allowed.
    service.cancel(&alice, first.id).await.unwrap();
    let rebooked = service.reserve(&alice, event_id, 3, None).await.unwrap();
    assert_eq!(rebooked.number_of_seats, 3);
    assert_seat_invariant(&pool, event_id).await;
}

#[sqlx::test]
async fn boundary_exact_fit_succeeds_and_one_over_changes_nothing(pool: PgPool) {
    let service = BookingService::new(pool.clone());
    let event_id = seed_event(&pool, 5, Decimal::new(2000, 2)).await;

    let err = service
        .reserve(&user(), event_id, 6, None)
        .await
        .unwrap_err();
    match err {
        LedgerError::InvalidRequest(msg) => {
            assert!(msg.contains("5 seats available"), "got: {msg}")
        }
        other => panic!("expected InvalidRequest, got {other:?}"),
    }
    assert_eq!(available_seats(&pool, event_id).await, 5);

    service.reserve(&user(), event_id, 5, None).await.unwrap();
    assert_eq!(available_seats(&pool, event_id).await, 0);
    assert_seat_invariant(&pool, event_id).await;
}

#[sqlx::test]
async fn cancellation_restores_inventory_exactly(pool: PgPool) {
    let service = BookingService::new(pool.clone());
    let event_id = seed_event(&pool, 12, Decimal::new(3000, 2)).await;
    let alice = user();

    let booking = service.reserve(&alice, event_id, 3, None).await.unwrap();
    assert_eq!(available_seats(&pool, event_id).await, 9);

    let cancelled = service.cancel(&alice, booking.id).await.unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    assert_eq!(available_seats(&pool, event_id).await, 12);
    assert_seat_invariant(&pool, event_id).await;
}

#[sqlx::test]
async fn double_cancel_is_rejected_without_touching_inventory(pool: PgPool) {
    let service = BookingService::new(pool.clone());
    let event_id = seed_event(&pool, 8, Decimal::new(1000, 2)).await;
    let alice = user();

    let booking = service.reserve(&alice, event_id, 2, None).await.unwrap();
    service.cancel(&alice, booking.id).await.unwrap();
    assert_eq!(available_seats(&pool, event_id).await, 8);

    let err = service.cancel(&alice, booking.id).await.unwrap_err();
    match err {
        LedgerError::InvalidRequest(msg) => {
            assert!(msg.to_lowercase().contains("already cancelled"), "got: {msg}")
        }
        other => panic!("expected InvalidRequest, got {other:?}"),
    }
    assert_eq!(available_seats(&pool, event_id).await, 8);
    assert_seat_invariant(&pool, event_id).await;
}

#[sqlx::test]
async fn cannot_cancel_once_the_event_has_started(pool: PgPool) {
    let service = BookingService::new(pool.clone());
    let event_id = seed_event(&pool, 6, Decimal::new(4500, 2)).await;
    let alice = user();

    let booking = service.reserve(&alice, event_id, 2, None).await.unwrap();

    sqlx::query("UPDATE events SET start_time = now() - interval '1 hour' WHERE id = $1")
        .bind(event_id)
        .execute(&pool)
        .await
        .unwrap();

    let err = service.cancel(&alice, booking.id).await.unwrap_err();
    assert!(matches!(err, LedgerError::InvalidRequest(_)), "got {err:?}");

    // The booking stays confirmed and the seats stay taken.
    let unchanged = service.get_for(&alice, booking.id).await.unwrap();
    assert_eq!(unchanged.status, BookingStatus::Confirmed);
    assert_eq!(available_seats(&pool, event_id).await, 4);
    assert_seat_invariant(&pool, event_id).await;
}

#[sqlx::test]
async fn unbookable_events_are_reported_by_kind(pool: PgPool) {
    let service = BookingService::new(pool.clone());
    let alice = user();

    let err = service
        .reserve(&alice, Uuid::new_v4(), 1, None)
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::NotFound(_)), "got {err:?}");

    let inactive = seed_event(&pool, 10, Decimal::new(1000, 2)).await;
    sqlx::query("UPDATE events SET is_active = FALSE WHERE id = $1")
        .bind(inactive)
        .execute(&pool)
        .await
        .unwrap();
    let err = service.reserve(&alice, inactive, 1, None).await.unwrap_err();
    assert!(matches!(err, LedgerError::Unavailable(_)), "got {err:?}");

    let started = seed_event(&pool, 10, Decimal::new(1000, 2)).await;
    sqlx::query("UPDATE events SET start_time = now() - interval '5 minutes' WHERE id = $1")
        .bind(started)
        .execute(&pool)
        .await
        .unwrap();
    let err = service.reserve(&alice, started, 1, None).await.unwrap_err();
    assert!(matches!(err, LedgerError::Unavailable(_)), "got {err:?}");

    assert_eq!(available_seats(&pool, inactive).await, 10);
    assert_eq!(available_seats(&pool, started).await, 10);
}

#[sqlx::test]
async fn bookings_are_scoped_to_their_owner(pool: PgPool) {
    let service = BookingService::new(pool.clone());
    let event_id = seed_event(&pool, 10, Decimal::new(2500, 2)).await;
    let alice = user();
    let bob = user();

    let booking = service.reserve(&alice, event_id, 2, None).await.unwrap();

    // Another user can neither see nor cancel it; existence is not leaked.
    let err = service.get_for(&bob, booking.id).await.unwrap_err();
    assert!(matches!(err, LedgerError::NotFound(_)), "got {err:?}");
    let err = service.cancel(&bob, booking.id).await.unwrap_err();
    assert!(matches!(err, LedgerError::NotFound(_)), "got {err:?}");
    assert!(service.list_for(&bob).await.unwrap().is_empty());

    let mine = service.list_for(&alice).await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].id, booking.id);

    // Admins see everything.
    let staff = admin();
    assert_eq!(service.list_for(&staff).await.unwrap().len(), 1);
    assert_eq!(
        service.get_for(&staff, booking.id).await.unwrap().id,
        booking.id
    );
}

#[sqlx::test]
async fn total_amount_is_frozen_at_reservation_time(pool: PgPool) {
    let service = BookingService::new(pool.clone());
    let event_id = seed_event(&pool, 10, Decimal::new(5000, 2)).await;
    let alice = user();

    let booking = service.reserve(&alice, event_id, 4, None).await.unwrap();
    assert_eq!(booking.total_amount, Decimal::new(20000, 2));

    sqlx::query("UPDATE events SET price = $1 WHERE id = $2")
        .bind(Decimal::new(8000, 2))
        .bind(event_id)
        .execute(&pool)
        .await
        .unwrap();

    let fetched = service.get_for(&alice, booking.id).await.unwrap();
    assert_eq!(fetched.total_amount, Decimal::new(20000, 2));
    assert_eq!(fetched.event_price, Decimal::new(8000, 2));
}

#[sqlx::test]
async fn note_is_stored_with_the_booking(pool: PgPool) {
    let service = BookingService::new(pool.clone());
    let event_id = seed_event(&pool, 10, Decimal::new(1000, 2)).await;
    let alice = user();

    let booking = service
        .reserve(&alice, event_id, 1, Some("wheelchair access".to_string()))
        .await
        .unwrap();
    let fetched = service.get_for(&alice, booking.id).await.unwrap();
    assert_eq!(fetched.note.as_deref(), Some("wheelchair access"));
}
