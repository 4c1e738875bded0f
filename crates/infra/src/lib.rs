//! # LeadSync Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - SQLite repositories for leads, appointments and connection tokens
//! - HTTP client and the Google Calendar/Tasks provider
//! - Configuration loading
//! - The periodic calendar import scheduler
//!
//! ## Architecture
//! - Implements traits defined in `leadsync-core`
//! - Contains all "impure" code (I/O, network)

pub mod config;
pub mod database;
pub mod errors;
pub mod http;
pub mod integrations;
pub mod scheduling;

// Re-export commonly used items
pub use database::{
    DbManager, SqliteAppointmentRepository, SqliteConnectionTokenRepository,
    SqliteLeadRepository,
};
pub use errors::InfraError;
pub use http::HttpClient;
pub use integrations::google::GoogleCalendarProvider;
pub use scheduling::{CalendarImportScheduler, CalendarImportSchedulerConfig};
