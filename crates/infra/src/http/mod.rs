//! HTTP client shared by provider integrations

pub mod client;

pub use client::{HttpClient, HttpClientBuilder};
