pub mod booking;
pub mod event;

pub use booking::{Booking, BookingStatus, BookingWithEvent};
pub use event::Event;
