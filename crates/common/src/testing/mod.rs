//! Test helpers shared by the LeadSync crates.

pub mod temp;

pub use temp::{TempDatabase, TempDir};
