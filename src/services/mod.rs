pub mod bookings;

pub use bookings::BookingService;
