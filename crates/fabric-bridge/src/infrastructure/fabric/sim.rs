//! Simulated fabric for the host build.
//!
//! Models the 64 KB address window as four 16 KB slots.  Bank register `n`
//! (I/O port `IO_BANK0 + n`) selects which 16 KB page of the backing store
//! appears in slot `n`.  The backing store is shared with
//! [`SimFlash`](crate::infrastructure::flash::sim::SimFlash), so bytes the
//! flash programs are what verification reads back.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use fabric_bridge_core::domain::image::PAGE_SIZE;
use fabric_bridge_core::domain::matrix::MATRIX_ROWS;
use tracing::trace;

use crate::application::bus_arbiter::{FabricBus, FabricError, BANK_COUNT, IO_BANK0};

/// Flash contents shared by the simulated fabric and flash chip.
pub type BackingStore = Arc<Mutex<Vec<u8>>>;

/// An in-memory [`FabricBus`] over a [`BackingStore`].
pub struct SimFabric {
    memory: BackingStore,
    io: Mutex<[u8; 256]>,
    matrix: Mutex<[u8; MATRIX_ROWS]>,
}

impl SimFabric {
    /// Creates a fabric whose backing store holds `pages` 16 KB pages of 0xFF.
    pub fn new(pages: usize) -> Self {
        let memory = vec![0xFF; pages * PAGE_SIZE as usize];
        Self::with_store(Arc::new(Mutex::new(memory)))
    }

    /// Creates a fabric over an existing backing store.  Bank registers start
    /// out mapping pages 0..4.
    pub fn with_store(memory: BackingStore) -> Self {
        let mut io = [0u8; 256];
        for bank in 0..BANK_COUNT {
            io[IO_BANK0 as usize + bank] = bank as u8;
        }
        Self {
            memory,
            io: Mutex::new(io),
            matrix: Mutex::new([0xFF; MATRIX_ROWS]),
        }
    }

    pub fn backing_store(&self) -> BackingStore {
        Arc::clone(&self.memory)
    }

    /// Current bank register values.
    pub fn banks(&self) -> [u8; BANK_COUNT] {
        let io = lock(&self.io);
        let mut banks = [0u8; BANK_COUNT];
        for (i, slot) in banks.iter_mut().enumerate() {
            *slot = io[IO_BANK0 as usize + i];
        }
        banks
    }

    /// Sets the bank registers directly.
    pub fn set_banks(&self, banks: [u8; BANK_COUNT]) {
        let mut io = lock(&self.io);
        for (i, page) in banks.into_iter().enumerate() {
            io[IO_BANK0 as usize + i] = page;
        }
    }

    /// Copies `bytes` into the backing store starting at flash address `addr`.
    /// Bytes past the end of the store are dropped.
    pub fn load(&self, addr: u32, bytes: &[u8]) {
        let mut memory = lock(&self.memory);
        let start = (addr as usize).min(memory.len());
        let end = (start + bytes.len()).min(memory.len());
        memory[start..end].copy_from_slice(&bytes[..end - start]);
    }

    /// Last matrix transfer; all rows released before the first one.
    pub fn matrix(&self) -> [u8; MATRIX_ROWS] {
        *lock(&self.matrix)
    }

    fn physical(&self, addr: u16) -> usize {
        let slot = (addr as u32 / PAGE_SIZE) as usize;
        let page = lock(&self.io)[IO_BANK0 as usize + slot];
        page as usize * PAGE_SIZE as usize + (addr as u32 % PAGE_SIZE) as usize
    }
}

/// Locks shared state, recovering it if a holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl FabricBus for SimFabric {
    fn io_read(&self, port: u8) -> Result<u8, FabricError> {
        Ok(lock(&self.io)[port as usize])
    }

    fn io_write(&self, port: u8, value: u8) -> Result<(), FabricError> {
        lock(&self.io)[port as usize] = value;
        Ok(())
    }

    fn mem_read(&self, addr: u16) -> Result<u8, FabricError> {
        let index = self.physical(addr);
        // Unpopulated pages float high.
        Ok(lock(&self.memory).get(index).copied().unwrap_or(0xFF))
    }

    fn mem_write(&self, addr: u16, value: u8) -> Result<(), FabricError> {
        let index = self.physical(addr);
        if let Some(cell) = lock(&self.memory).get_mut(index) {
            *cell = value;
        }
        Ok(())
    }

    fn write_keyboard_matrix(&self, rows: &[u8; MATRIX_ROWS]) -> Result<(), FabricError> {
        trace!(?rows, "keyboard matrix");
        *lock(&self.matrix) = *rows;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reset_banks_map_identity_pages() {
        let fabric = SimFabric::new(4);
        assert_eq!(fabric.banks(), [0, 1, 2, 3]);
    }

    #[test]
    fn test_mem_read_follows_bank_register() {
        // Arrange
        let fabric = SimFabric::new(8);
        fabric.load(5 * PAGE_SIZE + 0x10, &[0xAB]);

        // Act
        fabric.io_write(IO_BANK0, 5).unwrap();
        let value = fabric.mem_read(0x0010).unwrap();

        // Assert
        assert_eq!(value, 0xAB);
    }

    #[test]
    fn test_unpopulated_page_reads_ff() {
        let fabric = SimFabric::new(1);
        fabric.io_write(IO_BANK0, 9).unwrap();
        assert_eq!(fabric.mem_read(0).unwrap(), 0xFF);
    }

    #[test]
    fn test_mem_write_lands_in_mapped_page() {
        let fabric = SimFabric::new(4);
        fabric.io_write(IO_BANK0 + 1, 3).unwrap();

        fabric.mem_write(0x4002, 0x11).unwrap();

        let store = fabric.backing_store();
        assert_eq!(lock(&store)[3 * PAGE_SIZE as usize + 2], 0x11);
    }

    #[test]
    fn test_matrix_holds_last_transfer() {
        let fabric = SimFabric::new(1);
        assert_eq!(fabric.matrix(), [0xFF; 8]);
        fabric.write_keyboard_matrix(&[0xFE; 8]).unwrap();
        assert_eq!(fabric.matrix(), [0xFE; 8]);
    }
}
