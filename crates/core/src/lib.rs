//! # LeadSync Core
//!
//! Business logic for call scheduling and calendar sync - no
//! infrastructure dependencies.
//!
//! This crate contains:
//! - Port interfaces (traits) for the store and the calendar provider
//! - Appointment, connection, sync and import services
//! - The stale-lead pipeline job and job runners
//!
//! ## Architecture Principles
//! - Only depends on `leadsync-common` and `leadsync-domain`
//! - No database, HTTP, or platform code
//! - All external dependencies via traits

pub mod appointments;
pub mod calendar;
pub mod jobs;
pub mod pipeline;

pub use appointments::ports::{AppointmentRepository, LeadRepository};
pub use appointments::AppointmentService;
pub use calendar::ports::{CalendarProvider, ConnectionTokenRepository};
pub use calendar::{
    ConnectionManager, ConnectionSettings, EventSynchronizer, ImportReconciler, SyncSettings,
};
pub use jobs::{run_calendar_import, run_stale_leads};
pub use pipeline::StaleLeadMover;
