//! Simulated NOR flash for the host build.
//!
//! Erasing a sector sets it to 0xFF; programming a byte can only clear bits
//! (`cell &= value`).  A byte programmed into a sector that was never erased
//! therefore reads back wrong, which is what verification must catch.

use std::sync::atomic::{AtomicBool, Ordering};

use fabric_bridge_core::domain::image::SECTOR_SIZE;
use tracing::debug;

use crate::application::reflash::{FlashChip, FlashError};
use crate::infrastructure::fabric::sim::{lock, BackingStore};

/// A [`FlashChip`] that programs into a [`BackingStore`].
pub struct SimFlash {
    store: BackingStore,
    programming: AtomicBool,
}

impl SimFlash {
    /// Creates a flash chip that programs into `store`.
    pub fn attached_to(store: BackingStore) -> Self {
        Self {
            store,
            programming: AtomicBool::new(false),
        }
    }

    /// `true` between `prepare` and `finish`.
    pub fn is_programming(&self) -> bool {
        self.programming.load(Ordering::SeqCst)
    }

    fn out_of_range(addr: u32) -> FlashError {
        FlashError::Device(format!("address 0x{addr:05X} is outside the flash array"))
    }
}

impl FlashChip for SimFlash {
    fn prepare(&self) -> Result<(), FlashError> {
        debug!("flash: enter programming mode");
        self.programming.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn erase_sector(&self, addr: u32) -> Result<(), FlashError> {
        let mut store = lock(&self.store);
        let start = (addr - addr % SECTOR_SIZE) as usize;
        if start >= store.len() {
            return Err(Self::out_of_range(addr));
        }
        let end = (start + SECTOR_SIZE as usize).min(store.len());
        store[start..end].fill(0xFF);
        debug!("flash: erased sector 0x{start:05X}");
        Ok(())
    }

    fn program_byte(&self, addr: u32, value: u8) -> Result<(), FlashError> {
        let mut store = lock(&self.store);
        let cell = store
            .get_mut(addr as usize)
            .ok_or_else(|| Self::out_of_range(addr))?;
        *cell &= value;
        Ok(())
    }

    fn finish(&self) -> Result<(), FlashError> {
        debug!("flash: leave programming mode");
        self.programming.store(false, Ordering::SeqCst);
        Ok(())
    }
}
