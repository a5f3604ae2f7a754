//! The single active analysis.

pub mod context;
