//! HTTP adapter for the analysis backend.

pub mod client;
mod wire;

pub use client::HttpBackend;
pub use wire::HealthStatus;
