//! Identity tracking and credential persistence.
//!
//! [`store::SessionStore`] holds the current identity and persists it through
//! a [`store::CredentialStore`] port. [`memory::MemoryCredentialStore`] is an
//! in-process store for sessions that should not touch disk.

pub mod memory;
pub mod store;
