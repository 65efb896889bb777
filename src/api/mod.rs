//! HTTP client for the check service's REST and streaming endpoints.

pub mod client;

pub use client::ApiClient;
