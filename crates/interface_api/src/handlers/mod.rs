//! Request handlers
//!
//! Handlers validate the body, hand it to the engine and return the
//! engine's result as JSON. No booking rule lives here.

pub mod bookings;
pub mod patterns;
pub mod resources;
pub mod health;
