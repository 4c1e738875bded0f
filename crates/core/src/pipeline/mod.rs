//! Lead pipeline maintenance

pub mod service;

pub use service::StaleLeadMover;
