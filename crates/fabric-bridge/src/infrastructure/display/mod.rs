//! Status overlay adapters.
//!
//! [`LogDisplay`] is the host stand-in for the fabric's on-screen overlay:
//! status lines go to the log instead of the video output.

use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::{debug, info};

use crate::application::board::StatusDisplay;

pub mod mock;

/// Writes status lines to the `tracing` log.
#[derive(Debug, Default)]
pub struct LogDisplay {
    depth: AtomicUsize,
}

impl LogDisplay {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StatusDisplay for LogDisplay {
    fn save(&self) {
        let depth = self.depth.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(depth, "status overlay opened");
    }

    fn show_message(&self, text: &str) {
        info!(target: "fabric_bridge::status", "{text}");
    }

    fn restore(&self) {
        let depth = self.depth.fetch_sub(1, Ordering::SeqCst).saturating_sub(1);
        debug!(depth, "status overlay closed");
    }
}
