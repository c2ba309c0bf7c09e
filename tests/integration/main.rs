//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that drives the bar end to end through
//! [`barista::CafeService`] against mock adapters.

mod config_tests;
mod mock;
mod service_tests;
