//! Session and conversation context management for Lovan.
//!
//! This crate owns the stateful client logic: who is logged in, which
//! analysis is active, the follow-up chat thread bound to it, and the gate
//! state machine that ties them together. It defines the "ports"
//! ([`backend::AnalyzerBackend`], [`session::store::CredentialStore`]) that
//! the infrastructure layer implements, and depends only on `lovan-types`.

pub mod analysis;
pub mod backend;
pub mod chat;
pub mod gate;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;
