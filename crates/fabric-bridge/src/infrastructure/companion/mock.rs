//! Scripted storage link for unit testing.

use std::collections::VecDeque;
use std::sync::Mutex;

use crate::application::storage_client::{StorageLink, StorageLinkError};

/// A mock implementation of [`StorageLink`] that records sent frames and
/// answers from a queue of status bytes.
#[derive(Debug, Default)]
pub struct MockStorageLink {
    sent: Mutex<Vec<Vec<u8>>>,
    responses: Mutex<VecDeque<u8>>,
}

impl MockStorageLink {
    pub fn with_responses(responses: Vec<u8>) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            responses: Mutex::new(responses.into()),
        }
    }

    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.sent.lock().expect("lock poisoned").clone()
    }
}

impl StorageLink for MockStorageLink {
    fn send(&self, frame: &[u8]) -> Result<(), StorageLinkError> {
        self.sent.lock().expect("lock poisoned").push(frame.to_vec());
        Ok(())
    }

    fn receive_status(&self) -> Result<u8, StorageLinkError> {
        self.responses
            .lock()
            .expect("lock poisoned")
            .pop_front()
            .ok_or(StorageLinkError::Closed)
    }
}
