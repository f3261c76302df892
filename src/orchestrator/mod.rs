//! Application-level orchestration.
//!
//! The controller owns the map session and is the only place it is mutated.
//! UI/CLI layers send commands in and render the events that come back.

mod controller;

pub use controller::{run_controller, UiCommand};
