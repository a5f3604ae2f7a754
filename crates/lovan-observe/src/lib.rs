//! Observability setup for Lovan: structured logging and optional
//! OpenTelemetry span export.

pub mod tracing_setup;
