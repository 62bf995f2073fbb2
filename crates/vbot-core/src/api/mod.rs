//! Verification API gateway: wire types and the `reqwest` client.

pub mod client;
pub mod types;

pub use client::ApiClient;
