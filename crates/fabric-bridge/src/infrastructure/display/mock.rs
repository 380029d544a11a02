//! Mock status display for unit testing.

use std::sync::Mutex;

use crate::application::board::StatusDisplay;

/// One recorded display call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayEvent {
    Save,
    Message(String),
    Restore,
}

/// A mock implementation of [`StatusDisplay`] that records every call.
#[derive(Debug, Default)]
pub struct MockDisplay {
    events: Mutex<Vec<DisplayEvent>>,
}

impl MockDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DisplayEvent> {
        self.events.lock().expect("lock poisoned").clone()
    }

    /// Only the messages, in order.
    pub fn messages(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                DisplayEvent::Message(text) => Some(text),
                _ => None,
            })
            .collect()
    }

    fn record(&self, event: DisplayEvent) {
        self.events.lock().expect("lock poisoned").push(event);
    }
}

impl StatusDisplay for MockDisplay {
    fn save(&self) {
        self.record(DisplayEvent::Save);
    }

    fn show_message(&self, text: &str) {
        self.record(DisplayEvent::Message(text.to_string()));
    }

    fn restore(&self) {
        self.record(DisplayEvent::Restore);
    }
}
