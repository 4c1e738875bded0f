//! Appointment persistence and status rules

pub mod ports;
pub mod service;

pub use service::AppointmentService;
