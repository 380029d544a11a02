//! Transport to the companion storage module.
//!
//! The board links to the module over a UART; the host build has no module,
//! so only the scripted [`mock::MockStorageLink`] is provided.

pub mod mock;
