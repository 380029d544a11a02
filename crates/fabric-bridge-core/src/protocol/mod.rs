//! Wire formats spoken by the bridge.
//!
//! Only the companion storage module's request framing lives here; the
//! fabric itself is driven through register primitives, not a byte protocol.

pub mod storage;

pub use storage::{StorageCommand, StorageRequest, StorageStatus};
