//! Interactive follow-up chat about the active analysis.

pub mod commands;
pub mod loop_runner;
