//! Cron-driven background jobs
//!
//! Schedulers here follow the same runtime rules:
//! - Explicit lifecycle management (start/stop)
//! - Join handles for spawned tasks
//! - Cancellation token support
//! - Timeout wrapping on all async operations

pub mod error;
pub mod import_scheduler;

pub use error::{SchedulerError, SchedulerResult};
pub use import_scheduler::{CalendarImportScheduler, CalendarImportSchedulerConfig};
