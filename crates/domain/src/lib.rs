//! # LeadSync Domain
//!
//! Business domain types and models for LeadSync.
//!
//! This crate contains:
//! - Leads, appointments, connection tokens and provider-side records
//! - Domain error types and Result definitions
//! - Configuration structures
//! - Phone-token heuristics used to match calendar events to leads
//!
//! ## Architecture
//! - No dependencies on other LeadSync crates
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;
pub mod utils;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
pub use utils::phone::{digits_only, extract_phone_token, phone_matches, PhoneToken};
