//! Diagnostic excursions.

use std::sync::Arc;

use tracing::info;

use crate::application::bus_arbiter::{BusArbiter, BusError, Excursion, BANK_COUNT};

/// Reads fabric state for troubleshooting without disturbing it.
pub struct Diagnostics {
    arbiter: Arc<BusArbiter>,
}

impl Diagnostics {
    pub fn new(arbiter: Arc<BusArbiter>) -> Self {
        Self { arbiter }
    }

    /// Reads and logs the four bank-select registers.
    ///
    /// # Errors
    ///
    /// Returns [`BusError`] if the bus is held or a register read fails.
    pub fn dump_banks(&self) -> Result<[u8; BANK_COUNT], BusError> {
        let bus = self.arbiter.acquire(Excursion::DiagnosticDump)?;
        let mut banks = [0u8; BANK_COUNT];
        for (bank, value) in banks.iter_mut().enumerate() {
            *value = bus.read_bank(bank as u8)?;
            info!("bank {bank} = 0x{value:02X}");
        }
        bus.release()?;
        Ok(banks)
    }
}
