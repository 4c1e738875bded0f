//! Shared test helpers for `leadsync-core` integration tests.
//!
//! In-memory port mocks plus a harness that wires the services together the
//! way the API does.

#![allow(dead_code)]

pub mod fixtures;
pub mod provider;
pub mod repositories;

pub use fixtures::{at, fast_settings, lead, lead_with_phones, Harness, USER};
pub use provider::MockCalendarProvider;
pub use repositories::{
    MockAppointmentRepository, MockConnectionTokenRepository, MockLeadRepository,
};
