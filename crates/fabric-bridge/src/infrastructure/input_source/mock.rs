//! Mock input source for unit testing.
//!
//! Allows tests to inject synthetic [`KeyEvent`]s without a keyboard.

use std::sync::{Arc, Mutex};

use fabric_bridge_core::KeyEvent;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use super::{InputSource, InputSourceError};

/// A mock implementation of [`InputSource`] that allows tests to inject events.
#[derive(Default)]
pub struct MockInputSource {
    sender: Arc<Mutex<Option<UnboundedSender<KeyEvent>>>>,
}

impl MockInputSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Injects a synthetic event, as if typed on the host keyboard.
    ///
    /// Panics if `start()` has not been called or if `stop()` has been called.
    pub fn inject_event(&self, event: KeyEvent) {
        let guard = self.sender.lock().expect("lock poisoned");
        match guard.as_ref() {
            Some(sender) => sender
                .send(event)
                .expect("receiver has been dropped; call start() first"),
            None => panic!("MockInputSource::inject_event called before start()"),
        }
    }
}

impl InputSource for MockInputSource {
    fn start(&self) -> Result<UnboundedReceiver<KeyEvent>, InputSourceError> {
        let mut sender = self.sender.lock().expect("lock poisoned");
        if sender.is_some() {
            return Err(InputSourceError::AlreadyStarted);
        }
        let (tx, rx) = mpsc::unbounded_channel();
        *sender = Some(tx);
        Ok(rx)
    }

    fn stop(&self) {
        // Dropping the sender closes the channel.
        *self.sender.lock().expect("lock poisoned") = None;
    }
}
