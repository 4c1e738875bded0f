//! # LeadSync API
//!
//! HTTP surface of the LeadSync service: appointment scheduling, calendar
//! connection management, the OAuth redirect target and job triggers.

pub mod context;
pub mod error;
pub mod routes;

pub use context::AppContext;
pub use error::{ApiError, ApiResult};
pub use routes::router;
