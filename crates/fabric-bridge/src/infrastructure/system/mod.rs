//! Host implementation of the controller's system operations.
//!
//! There is no LED or fabric reset line on a development machine, so those
//! are logged.  A controller restart ends the process with
//! [`RESTART_EXIT_CODE`], which a supervising script can use to relaunch the
//! bridge.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::application::board::SystemControl;

pub mod mock;

/// Process exit status that signals "restart requested".
pub const RESTART_EXIT_CODE: i32 = 75;

#[derive(Debug, Default)]
pub struct HostSystem;

impl HostSystem {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SystemControl for HostSystem {
    fn restart(&self) {
        warn!("controller restart requested; exiting with status {RESTART_EXIT_CODE}");
        std::process::exit(RESTART_EXIT_CODE);
    }

    fn request_fabric_reset(&self) {
        info!("fabric reset requested");
    }

    fn set_led(&self, on: bool) {
        debug!(on, "activity LED");
    }

    async fn delay(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
