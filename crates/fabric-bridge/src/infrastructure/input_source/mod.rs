//! Raw keyboard input for the bridge.
//!
//! On the board, key transitions come from the USB host stack as HID usage
//! IDs.  The host build reads them as text from stdin, one event per line:
//!
//! ```text
//! down 0x04      # A pressed
//! up 4           # A released
//! ```
//!
//! # Testability
//!
//! The `InputSource` trait lets unit tests inject synthetic events without a
//! keyboard attached.

use std::sync::Mutex;

use fabric_bridge_core::{KeyEvent, Scancode};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

pub mod mock;

/// Error type for input sources.
#[derive(Debug, Error, PartialEq)]
pub enum InputSourceError {
    #[error("input source already started")]
    AlreadyStarted,

    #[error("malformed input line {line:?}: {reason}")]
    Malformed { line: String, reason: &'static str },
}

/// A stream of raw key transitions.
pub trait InputSource: Send + Sync {
    /// Starts producing events.  The stream ends when the source stops.
    ///
    /// # Errors
    ///
    /// Returns [`InputSourceError::AlreadyStarted`] if called twice.
    fn start(&self) -> Result<UnboundedReceiver<KeyEvent>, InputSourceError>;

    /// Stops producing events and closes the stream.
    fn stop(&self);
}

/// Reads `down|up <scancode>` lines from stdin.
#[derive(Default)]
pub struct StdinInputSource {
    task: Mutex<Option<JoinHandle<()>>>,
}

impl StdinInputSource {
    pub fn new() -> Self {
        Self::default()
    }
}

impl InputSource for StdinInputSource {
    fn start(&self) -> Result<UnboundedReceiver<KeyEvent>, InputSourceError> {
        let mut task = self.task.lock().unwrap_or_else(|p| p.into_inner());
        if task.is_some() {
            return Err(InputSourceError::AlreadyStarted);
        }
        let (tx, rx) = mpsc::unbounded_channel();
        *task = Some(tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => match parse_event_line(&line) {
                        Ok(Some(event)) => {
                            if tx.send(event).is_err() {
                                break;
                            }
                        }
                        Ok(None) => {}
                        Err(e) => warn!("{e}"),
                    },
                    Ok(None) => {
                        debug!("stdin closed");
                        break;
                    }
                    Err(e) => {
                        warn!("stdin read failed: {e}");
                        break;
                    }
                }
            }
        }));
        Ok(rx)
    }

    fn stop(&self) {
        if let Some(task) = self.task.lock().unwrap_or_else(|p| p.into_inner()).take() {
            task.abort();
        }
    }
}

/// Parses one input line.  Blank lines and `#` comments yield `Ok(None)`.
///
/// # Errors
///
/// Returns [`InputSourceError::Malformed`] for anything else that is not
/// `down|up <scancode>` with a decimal or `0x` hex scancode.
pub fn parse_event_line(line: &str) -> Result<Option<KeyEvent>, InputSourceError> {
    let content = line.split('#').next().unwrap_or("").trim();
    if content.is_empty() {
        return Ok(None);
    }
    let malformed = |reason| InputSourceError::Malformed {
        line: line.to_string(),
        reason,
    };

    let mut parts = content.split_whitespace();
    let pressed = match parts.next() {
        Some("down") => true,
        Some("up") => false,
        _ => return Err(malformed("expected `down` or `up`")),
    };
    let code = parts.next().ok_or_else(|| malformed("missing scancode"))?;
    if parts.next().is_some() {
        return Err(malformed("trailing text"));
    }
    let value = match code.strip_prefix("0x").or_else(|| code.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => code.parse::<u16>(),
    }
    .map_err(|_| malformed("scancode is not a number"))?;

    Ok(Some(KeyEvent {
        scancode: Scancode::from_u16(value),
        pressed,
    }))
}
