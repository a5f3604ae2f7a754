//! Durable credential storage.

pub mod file;
