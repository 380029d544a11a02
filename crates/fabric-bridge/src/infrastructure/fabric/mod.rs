//! Fabric register transport.
//!
//! On the board, [`FabricBus`](crate::application::bus_arbiter::FabricBus)
//! is implemented over the parallel register interface between the control
//! microcontroller and the FPGA.  The host build runs against
//! [`sim::SimFabric`], an in-memory model of the bank-switched window that
//! shares its backing store with the simulated flash chip.

pub mod mock;
pub mod sim;

pub use sim::{BackingStore, SimFabric};
