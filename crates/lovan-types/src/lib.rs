//! Shared domain types for Lovan.
//!
//! This crate contains the domain types used across the Lovan client:
//! Identity, AnalysisResult, ChatTurn, HistoryRecord, client configuration,
//! and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror, secrecy.

pub mod analysis;
pub mod backend;
pub mod chat;
pub mod config;
pub mod error;
pub mod history;
pub mod identity;
