//! Mock flash chip for tests.
//!
//! Wraps a [`SimFlash`] and records every call.  It can corrupt one address
//! to simulate a bad cell, or fail every program operation.

use std::sync::Mutex;

use crate::application::reflash::{FlashChip, FlashError};
use crate::infrastructure::fabric::sim::{lock, BackingStore};
use crate::infrastructure::flash::sim::SimFlash;

/// One recorded flash operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashCall {
    Prepare,
    EraseSector(u32),
    Program(u32, u8),
    Finish,
}

/// A mock implementation of [`FlashChip`] that records every call.
pub struct MockFlash {
    chip: SimFlash,
    calls: Mutex<Vec<FlashCall>>,
    /// Address whose programmed value gets bit 0 flipped, simulating a bad cell.
    pub stuck_address: Option<u32>,
    /// When `true`, `program_byte` reports a device error.
    pub should_fail: bool,
}

impl MockFlash {
    /// Creates a flash chip that programs into `store`.
    pub fn attached_to(store: BackingStore) -> Self {
        Self {
            chip: SimFlash::attached_to(store),
            calls: Mutex::new(Vec::new()),
            stuck_address: None,
            should_fail: false,
        }
    }

    pub fn calls(&self) -> Vec<FlashCall> {
        lock(&self.calls).clone()
    }

    /// Addresses of every sector erase, in order.
    pub fn erased_sectors(&self) -> Vec<u32> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                FlashCall::EraseSector(addr) => Some(addr),
                _ => None,
            })
            .collect()
    }

    pub fn program_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, FlashCall::Program(..)))
            .count()
    }

    /// `true` between `prepare` and `finish`.
    pub fn is_programming(&self) -> bool {
        self.chip.is_programming()
    }

    fn record(&self, call: FlashCall) {
        lock(&self.calls).push(call);
    }
}

impl FlashChip for MockFlash {
    fn prepare(&self) -> Result<(), FlashError> {
        self.record(FlashCall::Prepare);
        self.chip.prepare()
    }

    fn erase_sector(&self, addr: u32) -> Result<(), FlashError> {
        self.record(FlashCall::EraseSector(addr));
        self.chip.erase_sector(addr)
    }

    fn program_byte(&self, addr: u32, value: u8) -> Result<(), FlashError> {
        self.record(FlashCall::Program(addr, value));
        if self.should_fail {
            return Err(FlashError::Device("mock program failure".to_string()));
        }
        let written = if self.stuck_address == Some(addr) {
            value ^ 0x01
        } else {
            value
        };
        self.chip.program_byte(addr, written)
    }

    fn finish(&self) -> Result<(), FlashError> {
        self.record(FlashCall::Finish);
        self.chip.finish()
    }
}
