//! Mock system control for unit testing.
//!
//! `delay` returns immediately so reflash tests run at full speed; the
//! requested durations are still recorded.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::application::board::SystemControl;

/// One recorded system call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemEvent {
    Restart,
    FabricReset,
    Led(bool),
    Delay(Duration),
}

/// A mock implementation of [`SystemControl`] that records every call.
#[derive(Debug, Default)]
pub struct MockSystem {
    events: Mutex<Vec<SystemEvent>>,
}

impl MockSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SystemEvent> {
        self.events.lock().expect("lock poisoned").clone()
    }

    pub fn restart_count(&self) -> usize {
        self.count(|e| matches!(e, SystemEvent::Restart))
    }

    pub fn fabric_reset_count(&self) -> usize {
        self.count(|e| matches!(e, SystemEvent::FabricReset))
    }

    /// Number of delays of exactly `duration`.
    pub fn delay_count(&self, duration: Duration) -> usize {
        self.count(|e| *e == SystemEvent::Delay(duration))
    }

    fn count(&self, pred: impl Fn(&SystemEvent) -> bool) -> usize {
        self.events().iter().filter(|e| pred(e)).count()
    }

    fn record(&self, event: SystemEvent) {
        self.events.lock().expect("lock poisoned").push(event);
    }
}

#[async_trait]
impl SystemControl for MockSystem {
    fn restart(&self) {
        self.record(SystemEvent::Restart);
    }

    fn request_fabric_reset(&self) {
        self.record(SystemEvent::FabricReset);
    }

    fn set_led(&self, on: bool) {
        self.record(SystemEvent::Led(on));
    }

    async fn delay(&self, duration: Duration) {
        self.record(SystemEvent::Delay(duration));
    }
}
