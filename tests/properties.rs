//! Property tests for the scheduling core.
//!
//! Run with: `cargo test --test properties`

#[path = "properties/fixtures.rs"]
mod fixtures;

#[path = "properties/slots.rs"]
mod slots;

#[path = "properties/lifecycle.rs"]
mod lifecycle;

#[path = "properties/double_booking.rs"]
mod double_booking;
