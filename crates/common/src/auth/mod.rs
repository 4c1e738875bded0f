//! OAuth 2.0 + PKCE building blocks
//!
//! Shared types for the authorization-code flow used by the calendar
//! connection: PKCE verifier/challenge generation, CSRF state tokens and the
//! token set returned by the authorization server.
//!
//! # Module Organization
//!
//! - **[`types`]**: `TokenSet`, `TokenResponse`, `OAuthError`
//! - **[`pkce`]**: PKCE challenge generation and state validation

pub mod pkce;
pub mod types;

pub use pkce::{
    generate_code_challenge, generate_code_verifier, generate_state, validate_state,
    PKCEChallenge,
};
pub use types::{OAuthError, TokenResponse, TokenSet};
