//! Mock fabric for tests.
//!
//! Wraps a [`SimFabric`] and records register traffic, with a switch that
//! makes every transport call fail.

use std::sync::Mutex;

use fabric_bridge_core::domain::matrix::MATRIX_ROWS;

use crate::application::bus_arbiter::{FabricBus, FabricError, BANK_COUNT};
pub use crate::infrastructure::fabric::sim::BackingStore;
use crate::infrastructure::fabric::sim::{lock, SimFabric};

/// A mock implementation of [`FabricBus`] that records register traffic.
pub struct MockFabric {
    sim: SimFabric,
    io_writes: Mutex<Vec<(u8, u8)>>,
    matrix_writes: Mutex<Vec<[u8; MATRIX_ROWS]>>,
    /// When `true`, every transport call fails.
    pub should_fail: bool,
}

impl MockFabric {
    /// Creates a fabric whose backing store holds `pages` 16 KB pages of 0xFF.
    pub fn new(pages: usize) -> Self {
        Self::wrap(SimFabric::new(pages))
    }

    /// Creates a fabric over an existing backing store.
    pub fn with_store(memory: BackingStore) -> Self {
        Self::wrap(SimFabric::with_store(memory))
    }

    /// A fabric whose transport always fails.
    pub fn failing(pages: usize) -> Self {
        Self {
            should_fail: true,
            ..Self::new(pages)
        }
    }

    fn wrap(sim: SimFabric) -> Self {
        Self {
            sim,
            io_writes: Mutex::new(Vec::new()),
            matrix_writes: Mutex::new(Vec::new()),
            should_fail: false,
        }
    }

    pub fn backing_store(&self) -> BackingStore {
        self.sim.backing_store()
    }

    /// Sets the bank registers directly, bypassing the write log.
    pub fn set_banks(&self, banks: [u8; BANK_COUNT]) {
        self.sim.set_banks(banks);
    }

    pub fn banks(&self) -> [u8; BANK_COUNT] {
        self.sim.banks()
    }

    /// Copies `bytes` into the backing store starting at flash address `addr`.
    pub fn load(&self, addr: u32, bytes: &[u8]) {
        self.sim.load(addr, bytes);
    }

    /// Every `(port, value)` I/O write, in order.
    pub fn io_writes(&self) -> Vec<(u8, u8)> {
        lock(&self.io_writes).clone()
    }

    /// Every keyboard-matrix transfer, in order.
    pub fn matrix_writes(&self) -> Vec<[u8; MATRIX_ROWS]> {
        lock(&self.matrix_writes).clone()
    }

    fn check(&self) -> Result<(), FabricError> {
        if self.should_fail {
            Err(FabricError::Transport("mock fabric failure".to_string()))
        } else {
            Ok(())
        }
    }
}

impl FabricBus for MockFabric {
    fn io_read(&self, port: u8) -> Result<u8, FabricError> {
        self.check()?;
        self.sim.io_read(port)
    }

    fn io_write(&self, port: u8, value: u8) -> Result<(), FabricError> {
        self.check()?;
        lock(&self.io_writes).push((port, value));
        self.sim.io_write(port, value)
    }

    fn mem_read(&self, addr: u16) -> Result<u8, FabricError> {
        self.check()?;
        self.sim.mem_read(addr)
    }

    fn mem_write(&self, addr: u16, value: u8) -> Result<(), FabricError> {
        self.check()?;
        self.sim.mem_write(addr, value)
    }

    fn write_keyboard_matrix(&self, rows: &[u8; MATRIX_ROWS]) -> Result<(), FabricError> {
        self.check()?;
        lock(&self.matrix_writes).push(*rows);
        self.sim.write_keyboard_matrix(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::bus_arbiter::IO_BANK0;

    #[test]
    fn test_io_writes_are_recorded() {
        let fabric = MockFabric::new(4);
        fabric.io_write(IO_BANK0 + 2, 7).unwrap();
        assert_eq!(fabric.io_writes(), vec![(IO_BANK0 + 2, 7)]);
        assert_eq!(fabric.banks(), [0, 1, 7, 3]);
    }

    #[test]
    fn test_set_banks_bypasses_write_log() {
        let fabric = MockFabric::new(4);
        fabric.set_banks([3, 2, 1, 0]);
        assert!(fabric.io_writes().is_empty());
        assert_eq!(fabric.banks(), [3, 2, 1, 0]);
    }

    #[test]
    fn test_matrix_writes_are_recorded() {
        let fabric = MockFabric::new(1);
        fabric.write_keyboard_matrix(&[0xFE; 8]).unwrap();
        assert_eq!(fabric.matrix_writes(), vec![[0xFE; 8]]);
    }

    #[test]
    fn test_failing_fabric_rejects_every_call() {
        let fabric = MockFabric::failing(1);
        assert!(fabric.io_read(IO_BANK0).is_err());
        assert!(fabric.mem_read(0).is_err());
        assert!(fabric.write_keyboard_matrix(&[0xFF; 8]).is_err());
    }
}
