//! Client for the companion storage module.
//!
//! The module speaks one primitive: send a framed request, read back a
//! single status byte.  File-browsing features build on this; the keyboard
//! and reflash paths never touch it.

use std::sync::Arc;

use fabric_bridge_core::protocol::storage::{StorageErrorCode, StorageFrameError};
use fabric_bridge_core::protocol::{StorageRequest, StorageStatus};
use thiserror::Error;
use tracing::debug;

/// Error type for storage requests.
#[derive(Debug, Error)]
pub enum StorageLinkError {
    #[error("storage link I/O failed: {0}")]
    Io(String),

    #[error("storage link closed")]
    Closed,

    #[error(transparent)]
    Frame(#[from] StorageFrameError),

    #[error("storage module reported: {0}")]
    Module(StorageErrorCode),
}

/// Byte transport to the storage module.
pub trait StorageLink: Send + Sync {
    /// Sends one complete request frame.
    fn send(&self, frame: &[u8]) -> Result<(), StorageLinkError>;

    /// Blocks until the module's status byte arrives.
    fn receive_status(&self) -> Result<u8, StorageLinkError>;
}

pub struct StorageClient {
    link: Arc<dyn StorageLink>,
}

impl StorageClient {
    pub fn new(link: Arc<dyn StorageLink>) -> Self {
        Self { link }
    }

    /// Opens a directory and returns its descriptor.
    ///
    /// # Errors
    ///
    /// Returns [`StorageLinkError::Module`] with the decoded code if the
    /// module refuses, or a transport/framing error.
    pub fn open_dir(&self, path: &str) -> Result<u8, StorageLinkError> {
        let request = StorageRequest::open_dir(path)?;
        self.transact(&request)
    }

    fn transact(&self, request: &StorageRequest) -> Result<u8, StorageLinkError> {
        let frame = request.encode()?;
        self.link.send(&frame)?;
        let status = self.link.receive_status()?;
        debug!(command = ?request.command, status, "storage request complete");
        match StorageStatus::decode(status) {
            StorageStatus::Ok(value) => Ok(value),
            StorageStatus::Failed(code) => Err(StorageLinkError::Module(code)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::companion::mock::MockStorageLink;

    #[test]
    fn test_open_dir_sends_frame_and_returns_descriptor() {
        // Arrange
        let link = Arc::new(MockStorageLink::with_responses(vec![2]));
        let client = StorageClient::new(Arc::clone(&link) as Arc<dyn StorageLink>);

        // Act
        let descriptor = client.open_dir("/games").unwrap();

        // Assert
        assert_eq!(descriptor, 2);
        let sent = link.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0][0], 0x16);
        assert_eq!(&sent[0][3..], b"/games\0");
    }

    #[test]
    fn test_open_dir_maps_negative_status_to_error_code() {
        let link = Arc::new(MockStorageLink::with_responses(vec![0xFF]));
        let client = StorageClient::new(link);

        let result = client.open_dir("/missing");

        assert!(matches!(
            result,
            Err(StorageLinkError::Module(StorageErrorCode::NotFound))
        ));
    }

    #[test]
    fn test_bad_path_is_rejected_before_sending() {
        let link = Arc::new(MockStorageLink::with_responses(vec![0]));
        let client = StorageClient::new(Arc::clone(&link) as Arc<dyn StorageLink>);

        let result = client.open_dir("bad\0path");

        assert!(matches!(result, Err(StorageLinkError::Frame(_))));
        assert!(link.sent().is_empty());
    }

    #[test]
    fn test_missing_response_surfaces_closed_link() {
        let link = Arc::new(MockStorageLink::with_responses(Vec::new()));
        let client = StorageClient::new(link);
        assert!(matches!(client.open_dir("/"), Err(StorageLinkError::Closed)));
    }
}
