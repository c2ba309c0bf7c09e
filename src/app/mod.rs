//! Application core: pure domain orchestration, zero I/O.
//!
//! Routes player commands to the grinder, doser and espresso machine and
//! forwards their events outward.  All interaction with presentation and
//! storage happens through **port traits** defined in [`ports`], keeping
//! this layer fully testable without a UI.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
