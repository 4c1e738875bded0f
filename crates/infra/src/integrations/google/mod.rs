//! Google Calendar + Tasks integration
//!
//! OAuth (authorization code with PKCE, refresh, revoke) and the two REST
//! APIs the sync needs. All base URLs come from [`GoogleConfig`] so tests can
//! point them at a mock server.
//!
//! [`GoogleConfig`]: leadsync_domain::GoogleConfig

mod provider;
mod wire;

pub use provider::GoogleCalendarProvider;
