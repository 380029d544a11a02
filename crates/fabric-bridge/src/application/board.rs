//! Board services the use cases depend on.
//!
//! These are the "ports" for everything on the controller that is neither the
//! fabric bus nor the flash chip: the on-screen status line, the activity
//! LED, delays, and the restart/reset lines.  Infrastructure provides the
//! real adapters; tests use the recording mocks.

use std::time::Duration;

use async_trait::async_trait;

/// Longest status message the overlay can show on one line.
pub const STATUS_MESSAGE_MAX: usize = 49;

/// The fabric's on-screen status overlay.
pub trait StatusDisplay: Send + Sync {
    /// Saves the current screen contents so the overlay can be undone.
    fn save(&self);

    /// Replaces the status line.
    fn show_message(&self, text: &str);

    /// Restores the contents captured by the last [`save`](Self::save).
    fn restore(&self);
}

/// Controller-level system operations.
#[async_trait]
pub trait SystemControl: Send + Sync {
    /// Restarts the whole controller.  On the board this does not return.
    fn restart(&self);

    /// Pulses the fabric's reset line.
    fn request_fabric_reset(&self);

    /// Drives the activity LED.
    fn set_led(&self, on: bool);

    /// Waits for `duration` without blocking other tasks.
    async fn delay(&self, duration: Duration);
}

/// Scoped use of the status overlay.
///
/// Opening saves the screen; dropping restores it, so every exit path from a
/// reflash phase leaves the display as it found it.
pub struct StatusScreen<'a> {
    display: &'a dyn StatusDisplay,
}

impl<'a> StatusScreen<'a> {
    pub fn open(display: &'a dyn StatusDisplay) -> Self {
        display.save();
        Self { display }
    }

    /// Shows `text`, truncated to [`STATUS_MESSAGE_MAX`] characters.
    pub fn show(&self, text: &str) {
        self.display.show_message(&fit_status_line(text));
    }
}

impl Drop for StatusScreen<'_> {
    fn drop(&mut self) {
        self.display.restore();
    }
}

/// Clips `text` to the overlay width.  Non-ASCII characters become `?`.
pub fn fit_status_line(text: &str) -> String {
    text.chars()
        .take(STATUS_MESSAGE_MAX)
        .map(|c| if c.is_ascii() { c } else { '?' })
        .collect()
}
