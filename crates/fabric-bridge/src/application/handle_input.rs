//! HandleInputUseCase: the bridge's per-event pipeline.
//!
//! For each raw key event:
//!
//! 1. Fold the event into the owned [`InputState`] and classify it.
//! 2. On a fresh key-down edge, ask the [`HotkeyDispatcher`] for a system
//!    action and run it (reflash, restart, fabric reset, bank dump).
//! 3. Re-encode the whole matrix from the state into the pending bitmap.
//!
//! The pending bitmap reaches the fabric on the next [`flush`], which the
//! binary drives from a periodic housekeeping tick.  The publisher drops
//! flushes that would not change anything.
//!
//! [`flush`]: HandleInputUseCase::flush

use std::sync::Arc;

use fabric_bridge_core::{encode, InputState, KeyEvent, MatrixBitmap, Transition};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::application::board::SystemControl;
use crate::application::bus_arbiter::BusError;
use crate::application::diagnostics::Diagnostics;
use crate::application::dispatch_hotkey::{HotkeyAction, HotkeyDispatcher};
use crate::application::publish_matrix::MatrixPublisher;
use crate::application::reflash::{ReflashError, ReflashOutcome, ReflashSequencer};

/// Fatal errors from the input pipeline.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error(transparent)]
    Bus(#[from] BusError),

    #[error(transparent)]
    Reflash(#[from] ReflashError),
}

pub struct HandleInputUseCase {
    state: InputState,
    pending: MatrixBitmap,
    hotkeys: HotkeyDispatcher,
    publisher: MatrixPublisher,
    sequencer: ReflashSequencer,
    diagnostics: Diagnostics,
    system: Arc<dyn SystemControl>,
}

impl HandleInputUseCase {
    pub fn new(
        hotkeys: HotkeyDispatcher,
        publisher: MatrixPublisher,
        sequencer: ReflashSequencer,
        diagnostics: Diagnostics,
        system: Arc<dyn SystemControl>,
    ) -> Self {
        Self {
            state: InputState::new(),
            pending: MatrixBitmap::RELEASED,
            hotkeys,
            publisher,
            sequencer,
            diagnostics,
            system,
        }
    }

    /// Processes one raw key event.
    ///
    /// Returns the hotkey action that fired, if any.
    ///
    /// # Errors
    ///
    /// Only fatal errors are returned; recoverable bus faults during a
    /// diagnostic dump are logged and dropped.
    pub async fn handle_event(
        &mut self,
        event: KeyEvent,
    ) -> Result<Option<HotkeyAction>, BridgeError> {
        let transition = self.state.apply(event);
        debug!(?event, ?transition, "key event");

        let mut fired = None;
        if transition == Transition::DownEdge {
            if let Some(action) = self.hotkeys.dispatch(self.state.modifiers, event.scancode) {
                self.run_action(action).await?;
                fired = Some(action);
            }
        }

        self.pending = encode(&self.state);
        Ok(fired)
    }

    /// Publishes the pending bitmap.  Returns `true` if the fabric was written.
    ///
    /// # Errors
    ///
    /// Returns [`BusError`] if the bus is held or the transfer fails.
    pub fn flush(&mut self) -> Result<bool, BusError> {
        self.publisher.publish(self.pending)
    }

    pub fn input_state(&self) -> &InputState {
        &self.state
    }

    pub fn pending_matrix(&self) -> MatrixBitmap {
        self.pending
    }

    pub fn sequencer(&self) -> &ReflashSequencer {
        &self.sequencer
    }

    async fn run_action(&mut self, action: HotkeyAction) -> Result<(), BridgeError> {
        info!(?action, "hotkey");
        match action {
            HotkeyAction::Reflash => match self.sequencer.run().await? {
                ReflashOutcome::Restarted => info!("reflash complete"),
                ReflashOutcome::AlreadyCurrent => info!("reflash skipped; image already current"),
                ReflashOutcome::FailureIndicated => {
                    error!("reflash failed; manual intervention required")
                }
            },
            HotkeyAction::RestartController => self.system.restart(),
            HotkeyAction::ResetFabric => self.system.request_fabric_reset(),
            HotkeyAction::DumpBanks => match self.diagnostics.dump_banks() {
                Ok(_) => {}
                Err(e) if e.is_fatal() => return Err(e.into()),
                Err(e) => warn!("bank dump failed: {e}"),
            },
        }
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
