//! BusArbiter: exclusive ownership of the shared fabric bus.
//!
//! Keyboard matrix updates, ROM verification, flash programming and the
//! diagnostic bank dump all travel over the same physical bus.  The bus has
//! one owner at a time and no queue.  Each use is an *excursion*, represented
//! by a [`BusExcursion`] guard returned from [`BusArbiter::acquire`].
//!
//! # Bank context
//!
//! Excursions that re-point the fabric's bank-select registers capture a
//! [`BankSnapshot`] when the bus is acquired.  The snapshot is written back
//! when the guard is released or dropped, on every exit path, so normal
//! keyboard and display service resumes with the bank mapping it had before.

use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;
use tracing::{debug, error};

/// I/O port of the first bank-select register.  Banks 1–3 follow consecutively.
pub const IO_BANK0: u8 = 0xF0;
/// Number of bank-select registers.
pub const BANK_COUNT: usize = 4;

/// Failure reported by the fabric register transport.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FabricError {
    #[error("fabric transport error: {0}")]
    Transport(String),
}

/// Register-level access to the fabric.
///
/// Each call is atomic at the byte level from the controller's point of view.
/// Callers never use this trait directly; they go through a [`BusExcursion`].
pub trait FabricBus: Send + Sync {
    /// Reads an I/O register.
    fn io_read(&self, port: u8) -> Result<u8, FabricError>;

    /// Writes an I/O register.
    fn io_write(&self, port: u8, value: u8) -> Result<(), FabricError>;

    /// Reads a byte from the 64 KB bank-switched memory window.
    fn mem_read(&self, addr: u16) -> Result<u8, FabricError>;

    /// Writes a byte into the 64 KB bank-switched memory window.
    fn mem_write(&self, addr: u16, value: u8) -> Result<(), FabricError>;

    /// Replaces all eight keyboard-matrix rows in one transfer.
    fn write_keyboard_matrix(&self, rows: &[u8; 8]) -> Result<(), FabricError>;
}

/// The purpose of a bus excursion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Excursion {
    MatrixUpdate,
    Verify,
    Program,
    DiagnosticDump,
}

impl Excursion {
    /// Whether this excursion may re-point bank-select registers.
    pub fn moves_banks(self) -> bool {
        matches!(self, Excursion::Verify | Excursion::DiagnosticDump)
    }
}

/// Error type for bus ownership.
#[derive(Debug, Error)]
pub enum BusError {
    /// A second excursion tried to start while one was active.  This is a
    /// discipline violation in the caller, not a runtime condition.
    #[error("bus already held by {held_by:?}; {requested:?} cannot acquire it")]
    AlreadyHeld {
        held_by: Excursion,
        requested: Excursion,
    },

    #[error(transparent)]
    Fabric(#[from] FabricError),
}

impl BusError {
    /// `true` for errors the system cannot safely continue from.
    pub fn is_fatal(&self) -> bool {
        matches!(self, BusError::AlreadyHeld { .. })
    }
}

/// Saved bank-select register values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BankSnapshot(pub [u8; BANK_COUNT]);

impl BankSnapshot {
    fn capture(fabric: &dyn FabricBus) -> Result<Self, FabricError> {
        let mut banks = [0u8; BANK_COUNT];
        for (i, slot) in banks.iter_mut().enumerate() {
            *slot = fabric.io_read(IO_BANK0 + i as u8)?;
        }
        Ok(Self(banks))
    }

    fn restore(&self, fabric: &dyn FabricBus) -> Result<(), FabricError> {
        for (i, &page) in self.0.iter().enumerate() {
            fabric.io_write(IO_BANK0 + i as u8, page)?;
        }
        Ok(())
    }
}

/// Single-owner guard over the shared fabric bus.
pub struct BusArbiter {
    fabric: Arc<dyn FabricBus>,
    holder: Mutex<Option<Excursion>>,
}

impl BusArbiter {
    pub fn new(fabric: Arc<dyn FabricBus>) -> Self {
        Self {
            fabric,
            holder: Mutex::new(None),
        }
    }

    /// Claims the bus for `excursion`.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::AlreadyHeld`] if another excursion owns the bus, or
    /// [`BusError::Fabric`] if the bank snapshot cannot be read (the bus is
    /// left free in that case).
    pub fn acquire(&self, excursion: Excursion) -> Result<BusExcursion<'_>, BusError> {
        {
            let mut holder = self.lock_holder();
            if let Some(held_by) = *holder {
                error!(?held_by, requested = ?excursion, "bus double acquisition");
                return Err(BusError::AlreadyHeld {
                    held_by,
                    requested: excursion,
                });
            }
            *holder = Some(excursion);
        }

        let snapshot = if excursion.moves_banks() {
            match BankSnapshot::capture(self.fabric.as_ref()) {
                Ok(snapshot) => Some(snapshot),
                Err(e) => {
                    *self.lock_holder() = None;
                    return Err(e.into());
                }
            }
        } else {
            None
        };

        debug!(?excursion, ?snapshot, "bus acquired");
        Ok(BusExcursion {
            arbiter: self,
            excursion,
            snapshot,
            released: false,
        })
    }

    /// Returns the excursion currently holding the bus, if any.
    pub fn holder(&self) -> Option<Excursion> {
        *self.lock_holder()
    }

    pub fn is_held(&self) -> bool {
        self.holder().is_some()
    }

    fn lock_holder(&self) -> MutexGuard<'_, Option<Excursion>> {
        // The guarded value is a plain Option; a panic elsewhere cannot leave it torn.
        self.holder.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// An active excursion.  Exposes the fabric primitives for its lifetime.
pub struct BusExcursion<'a> {
    arbiter: &'a BusArbiter,
    excursion: Excursion,
    snapshot: Option<BankSnapshot>,
    released: bool,
}

impl BusExcursion<'_> {
    pub fn kind(&self) -> Excursion {
        self.excursion
    }

    /// Bank registers captured at acquisition, for bank-moving excursions.
    pub fn snapshot(&self) -> Option<&BankSnapshot> {
        self.snapshot.as_ref()
    }

    pub fn io_read(&self, port: u8) -> Result<u8, FabricError> {
        self.fabric().io_read(port)
    }

    pub fn io_write(&self, port: u8, value: u8) -> Result<(), FabricError> {
        self.fabric().io_write(port, value)
    }

    pub fn mem_read(&self, addr: u16) -> Result<u8, FabricError> {
        self.fabric().mem_read(addr)
    }

    pub fn mem_write(&self, addr: u16, value: u8) -> Result<(), FabricError> {
        self.fabric().mem_write(addr, value)
    }

    pub fn write_keyboard_matrix(&self, rows: &[u8; 8]) -> Result<(), FabricError> {
        self.fabric().write_keyboard_matrix(rows)
    }

    /// Reads bank-select register `bank` (0–3).
    pub fn read_bank(&self, bank: u8) -> Result<u8, FabricError> {
        self.io_read(IO_BANK0 + bank)
    }

    /// Maps `page` into the window slot selected by `bank` (0–3).
    pub fn set_bank(&self, bank: u8, page: u8) -> Result<(), FabricError> {
        self.io_write(IO_BANK0 + bank, page)
    }

    /// Restores the bank snapshot and frees the bus.
    ///
    /// The bus is freed even if the restore fails.
    ///
    /// # Errors
    ///
    /// Returns [`BusError::Fabric`] if the bank registers could not be written back.
    pub fn release(mut self) -> Result<(), BusError> {
        self.finish().map_err(BusError::from)
    }

    fn fabric(&self) -> &dyn FabricBus {
        self.arbiter.fabric.as_ref()
    }

    fn finish(&mut self) -> Result<(), FabricError> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        let restored = match &self.snapshot {
            Some(snapshot) => snapshot.restore(self.fabric()),
            None => Ok(()),
        };
        *self.arbiter.lock_holder() = None;
        debug!(excursion = ?self.excursion, "bus released");
        restored
    }
}

impl Drop for BusExcursion<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.finish() {
            error!(excursion = ?self.excursion, "bank restore failed on bus release: {e}");
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
