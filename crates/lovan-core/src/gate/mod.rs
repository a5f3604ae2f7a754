//! Gate & transition controller.
//!
//! [`controller::Controller`] owns the session store, the analysis context,
//! and the conversation thread, and is the only writer of all three.
//! Presentation layers read through accessors and [`controller::ControllerView`]
//! and act through intent methods.

pub mod controller;
pub mod resume;
pub mod state;
