//! SQLite implementations of the store ports

mod appointment_repository;
mod connection_token_repository;
mod lead_repository;
mod manager;
mod rows;

pub use appointment_repository::SqliteAppointmentRepository;
pub use connection_token_repository::SqliteConnectionTokenRepository;
pub use lead_repository::SqliteLeadRepository;
pub use manager::{DbManager, SCHEMA_VERSION};
