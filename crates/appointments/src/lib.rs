//! Dermatologist appointments module.
//!
//! Booking and status lifecycle rules, implemented purely as deterministic
//! domain logic (no IO, no HTTP, no storage).

pub mod appointment;

pub use appointment::{Appointment, AppointmentStatus, BookAppointment};
