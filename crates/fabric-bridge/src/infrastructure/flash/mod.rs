//! Flash chip adapters.
//!
//! The board drives a parallel NOR flash through the controller's GPIO; the
//! host build uses [`sim::SimFlash`], which programs the same backing store
//! the simulated fabric reads from.

pub mod mock;
pub mod sim;

pub use sim::SimFlash;
