//! ReflashSequencer: rewrites the fabric's system ROM from the embedded image.
//!
//! # Phases
//!
//! ```text
//! Idle ─► [Verifying(Pre)] ─► Programming ─► Verifying(Post) ─► Finalizing ─► Idle
//! ```
//!
//! - **Verifying(Pre)** is controlled by [`PrecheckMode`]: skipped, run for
//!   information only, or used to skip programming when the fabric already
//!   holds the image.
//! - **Programming** erases each 4096-byte sector just before its first byte
//!   is written and programs bytes in strictly increasing address order.
//!   Every 1024 bytes the LED toggles and the status line shows the address.
//! - **Verifying(Post)** is authoritative: zero mismatches means the
//!   controller restarts; anything else (or a flash error while programming)
//!   blinks the LED a fixed number of times and returns to Idle.  The board
//!   never reboots into an image that did not verify.
//!
//! Each phase holds its own bus excursion and its own [`StatusScreen`], so
//! the bank registers and the screen are restored on every exit path.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use fabric_bridge_core::domain::image::{is_progress_mark, is_sector_start, page_and_offset};
use fabric_bridge_core::RomImage;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::application::board::{StatusDisplay, StatusScreen, SystemControl};
use crate::application::bus_arbiter::{BusArbiter, BusError, Excursion, FabricError};

/// Number of mismatches a [`VerifyReport`] keeps in full.
pub const MAX_RECORDED_MISMATCHES: usize = 16;

const VERIFY_TITLE: &str = "Verifying system ROM";
const VERIFY_OK: &str = "Verifying system ROM OK!";
const VERIFY_FAILED: &str = "Verifying system ROM failed!";
const PROGRAM_TITLE: &str = "Programming system ROM";
const PROGRAM_DONE: &str = "Programming system ROM done.";

// ── Ports ─────────────────────────────────────────────────────────────────────

/// Error reported by a flash primitive.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FlashError {
    #[error("flash device error: {0}")]
    Device(String),
}

/// The flash chip holding the fabric's system ROM.
pub trait FlashChip: Send + Sync {
    /// Puts the chip into programming mode.
    fn prepare(&self) -> Result<(), FlashError>;

    /// Erases the sector containing `addr`.
    fn erase_sector(&self, addr: u32) -> Result<(), FlashError>;

    /// Programs one byte.  The byte's sector must have been erased.
    fn program_byte(&self, addr: u32, value: u8) -> Result<(), FlashError>;

    /// Leaves programming mode.
    fn finish(&self) -> Result<(), FlashError>;
}

// ── Settings and results ──────────────────────────────────────────────────────

/// What to do with the pass before programming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PrecheckMode {
    /// Go straight to programming.
    #[default]
    Off,
    /// Compare and report, then program regardless.
    Report,
    /// Compare; skip programming when the fabric already matches the image.
    SkipIfCurrent,
}

/// Timing and policy knobs for a reflash run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReflashSettings {
    pub precheck: PrecheckMode,
    pub blink_count: u32,
    pub blink_interval: Duration,
    pub intro_hold: Duration,
    pub status_hold: Duration,
}

impl Default for ReflashSettings {
    fn default() -> Self {
        Self {
            precheck: PrecheckMode::Off,
            blink_count: 5,
            blink_interval: Duration::from_millis(200),
            intro_hold: Duration::from_millis(1000),
            status_hold: Duration::from_millis(2000),
        }
    }
}

/// Which verify pass is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyPass {
    Pre,
    Post,
}

/// Sequencer state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReflashState {
    Idle,
    Verifying(VerifyPass),
    Programming,
    Finalizing,
}

/// How a reflash run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReflashOutcome {
    /// Post-verification passed and the controller was restarted.
    Restarted,
    /// Programming or post-verification failed; the failure blink ran and
    /// the controller was not restarted.
    FailureIndicated,
    /// The pre-check found the image already in place; nothing was written.
    AlreadyCurrent,
}

/// One byte that did not read back as expected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mismatch {
    pub addr: u32,
    pub expected: u8,
    pub actual: u8,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Verify error @ ${:05X}   ({:02X} != {:02X})",
            self.addr, self.actual, self.expected
        )
    }
}

/// Result of one verify pass over the full image.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifyReport {
    pub checked: u32,
    pub mismatch_count: u32,
    /// The first [`MAX_RECORDED_MISMATCHES`] mismatches in address order.
    pub mismatches: Vec<Mismatch>,
}

impl VerifyReport {
    pub fn passed(&self) -> bool {
        self.mismatch_count == 0
    }

    fn record(&mut self, mismatch: Mismatch) {
        self.mismatch_count += 1;
        if self.mismatches.len() < MAX_RECORDED_MISMATCHES {
            self.mismatches.push(mismatch);
        }
    }
}

/// Error type for a reflash run.
#[derive(Debug, Error)]
pub enum ReflashError {
    #[error(transparent)]
    Bus(#[from] BusError),

    #[error("flash programming failed: {0}")]
    Flash(#[from] FlashError),
}

impl ReflashError {
    /// `true` if the run must not continue to the failure indication.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ReflashError::Bus(e) if e.is_fatal())
    }
}

// ── Sequencer ─────────────────────────────────────────────────────────────────

/// Drives the verify / program / verify / finalize sequence.
pub struct ReflashSequencer {
    arbiter: Arc<BusArbiter>,
    flash: Arc<dyn FlashChip>,
    display: Arc<dyn StatusDisplay>,
    system: Arc<dyn SystemControl>,
    image: RomImage,
    settings: ReflashSettings,
    state: ReflashState,
}

impl ReflashSequencer {
    pub fn new(
        arbiter: Arc<BusArbiter>,
        flash: Arc<dyn FlashChip>,
        display: Arc<dyn StatusDisplay>,
        system: Arc<dyn SystemControl>,
        image: RomImage,
        settings: ReflashSettings,
    ) -> Self {
        Self {
            arbiter,
            flash,
            display,
            system,
            image,
            settings,
            state: ReflashState::Idle,
        }
    }

    pub fn state(&self) -> ReflashState {
        self.state
    }

    pub fn image(&self) -> &RomImage {
        &self.image
    }

    /// Runs the full reflash sequence.
    ///
    /// Verification mismatches, fabric transport errors and flash errors all
    /// end in the failure indication and an `Ok` outcome.
    ///
    /// # Errors
    ///
    /// Only fatal errors (bus double acquisition) are returned.
    pub async fn run(&mut self) -> Result<ReflashOutcome, ReflashError> {
        let range = self.image.range();
        info!(
            "reflash requested: {} bytes at 0x{:05X}, precheck {:?}",
            range.len(),
            range.start,
            self.settings.precheck
        );

        if self.settings.precheck != PrecheckMode::Off {
            match self.verify(VerifyPass::Pre).await {
                Ok(report) => {
                    if report.passed() && self.settings.precheck == PrecheckMode::SkipIfCurrent {
                        info!("system ROM already current; skipping programming");
                        self.enter(ReflashState::Idle);
                        return Ok(ReflashOutcome::AlreadyCurrent);
                    }
                }
                Err(e) if e.is_fatal() => return Err(self.abort(e.into())),
                Err(e) => warn!("pre-check could not complete: {e}"),
            }
        }

        match self.program().await {
            Ok(()) => {}
            Err(e) if e.is_fatal() => return Err(self.abort(e)),
            Err(e) => {
                error!("programming aborted: {e}");
                return Ok(self.finalize(false).await);
            }
        }

        let passed = match self.verify(VerifyPass::Post).await {
            Ok(report) => report.passed(),
            Err(e) if e.is_fatal() => return Err(self.abort(e.into())),
            Err(e) => {
                error!("post-verification could not complete: {e}");
                false
            }
        };
        Ok(self.finalize(passed).await)
    }

    /// Runs a standalone verify pass and returns to Idle.
    ///
    /// # Errors
    ///
    /// Returns [`BusError`] if the bus cannot be acquired or the fabric fails.
    pub async fn verify_only(&mut self) -> Result<VerifyReport, BusError> {
        let report = self.verify(VerifyPass::Pre).await;
        self.enter(ReflashState::Idle);
        report
    }

    async fn verify(&mut self, pass: VerifyPass) -> Result<VerifyReport, BusError> {
        self.enter(ReflashState::Verifying(pass));
        let arbiter = Arc::clone(&self.arbiter);
        let bus = arbiter.acquire(Excursion::Verify)?;
        let screen = StatusScreen::open(self.display.as_ref());
        screen.show(VERIFY_TITLE);
        self.system.delay(self.settings.intro_hold).await;

        let mut report = VerifyReport::default();
        let mut mapped_page = None;
        for (addr, expected) in self.image.iter() {
            let Some((page, offset)) = page_and_offset(addr) else {
                return Err(FabricError::Transport(format!(
                    "address 0x{addr:05X} is outside the bank-addressable space"
                ))
                .into());
            };
            if mapped_page != Some(page) {
                bus.set_bank(0, page)?;
                mapped_page = Some(page);
            }
            let actual = bus.mem_read(offset)?;
            report.checked += 1;
            if actual != expected {
                let mismatch = Mismatch {
                    addr,
                    expected,
                    actual,
                };
                warn!("{mismatch}");
                screen.show(&mismatch.to_string());
                report.record(mismatch);
            }
        }

        if report.passed() {
            info!(?pass, checked = report.checked, "system ROM verified");
            screen.show(VERIFY_OK);
        } else {
            warn!(
                ?pass,
                checked = report.checked,
                mismatches = report.mismatch_count,
                "system ROM verification failed"
            );
            self.system.delay(self.settings.status_hold).await;
            screen.show(VERIFY_FAILED);
        }
        self.system.delay(self.settings.status_hold).await;

        drop(screen);
        bus.release()?;
        Ok(report)
    }

    async fn program(&mut self) -> Result<(), ReflashError> {
        self.enter(ReflashState::Programming);
        let arbiter = Arc::clone(&self.arbiter);
        let bus = arbiter.acquire(Excursion::Program)?;
        let screen = StatusScreen::open(self.display.as_ref());
        screen.show(PROGRAM_TITLE);

        self.flash.prepare()?;
        let written = self.write_image(&screen);
        let finished = self.flash.finish();
        if let (Err(_), Err(e)) = (&written, &finished) {
            warn!("flash finish failed after aborted write: {e}");
        }
        written?;
        finished?;

        self.system.set_led(true);
        screen.show(PROGRAM_DONE);
        self.system.delay(self.settings.intro_hold).await;

        drop(screen);
        bus.release()?;
        Ok(())
    }

    /// Erases and programs the image in address order.  The chip must be prepared.
    fn write_image(&self, screen: &StatusScreen<'_>) -> Result<(), FlashError> {
        let mut led = false;
        for (addr, value) in self.image.iter() {
            if is_sector_start(addr) {
                self.flash.erase_sector(addr)?;
            }
            if is_progress_mark(addr) {
                self.system.set_led(led);
                led = !led;
                let progress = format!("{PROGRAM_TITLE} @ ${addr:05X}");
                info!("{progress}");
                screen.show(&progress);
            }
            self.flash.program_byte(addr, value)?;
        }
        Ok(())
    }

    async fn finalize(&mut self, passed: bool) -> ReflashOutcome {
        self.enter(ReflashState::Finalizing);
        let outcome = if passed {
            info!("reflash verified; restarting controller");
            self.system.restart();
            ReflashOutcome::Restarted
        } else {
            error!(
                "reflash failed; signalling with {} blinks, not restarting",
                self.settings.blink_count
            );
            for _ in 0..self.settings.blink_count {
                self.system.set_led(false);
                self.system.delay(self.settings.blink_interval).await;
                self.system.set_led(true);
                self.system.delay(self.settings.blink_interval).await;
            }
            ReflashOutcome::FailureIndicated
        };
        self.enter(ReflashState::Idle);
        outcome
    }

    fn abort(&mut self, e: ReflashError) -> ReflashError {
        error!("reflash aborted: {e}");
        self.enter(ReflashState::Idle);
        e
    }

    fn enter(&mut self, next: ReflashState) {
        if self.state != next {
            info!(from = ?self.state, to = ?next, "reflash state");
            self.state = next;
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
