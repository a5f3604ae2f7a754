//! Follow-up conversation thread and context payload assembly.

pub mod thread;
