//! fabric-bridge entry point.
//!
//! Runs the bridge against a simulated board: an in-memory fabric and flash
//! chip sharing one backing store, a status overlay that writes to the log,
//! and host system control.  Key events are read from stdin.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load config + ROM image
//!  └─ build board adapters and the BusArbiter
//!  └─ HandleInputUseCase
//!  └─ select! loop
//!       ├─ key event     -> handle_event()
//!       ├─ flush tick    -> flush()
//!       └─ Ctrl-C        -> shutdown
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use fabric_bridge::application::board::{StatusDisplay, SystemControl};
use fabric_bridge::application::bus_arbiter::{BusArbiter, FabricBus};
use fabric_bridge::application::diagnostics::Diagnostics;
use fabric_bridge::application::dispatch_hotkey::HotkeyDispatcher;
use fabric_bridge::application::handle_input::HandleInputUseCase;
use fabric_bridge::application::publish_matrix::MatrixPublisher;
use fabric_bridge::application::reflash::{FlashChip, ReflashSequencer};
use fabric_bridge::infrastructure::display::LogDisplay;
use fabric_bridge::infrastructure::fabric::SimFabric;
use fabric_bridge::infrastructure::flash::SimFlash;
use fabric_bridge::infrastructure::input_source::{InputSource, StdinInputSource};
use fabric_bridge::infrastructure::storage::config::load_config;
use fabric_bridge::infrastructure::system::HostSystem;
use fabric_bridge_core::domain::image::PAGE_SIZE;
use fabric_bridge_core::RomImage;

/// Bridge between a host keyboard and the fabric's keyboard matrix.
#[derive(Debug, Parser)]
#[command(name = "fabric-bridge", version, about)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long, env = "FABRIC_BRIDGE_CONFIG", default_value = "fabric-bridge.toml")]
    config: PathBuf,

    /// System ROM image; overrides `reflash.rom_image`.
    #[arg(long, env = "FABRIC_BRIDGE_ROM")]
    rom: Option<PathBuf>,

    /// Log level used when `RUST_LOG` is not set; overrides `bridge.log_level`.
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = load_config(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;

    // Initialise structured logging.  Level is overridden by `RUST_LOG`.
    let level = args.log_level.as_deref().unwrap_or(&config.bridge.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .init();

    info!("fabric-bridge starting");

    let rom_path = args.rom.unwrap_or_else(|| config.reflash.rom_image.clone());
    let image = RomImage::load(config.reflash.image_base, &rom_path)
        .with_context(|| format!("loading system ROM image {}", rom_path.display()))?;
    let range = image.range();
    info!(
        "system ROM image: {} bytes at 0x{:05X}",
        range.len(),
        range.start
    );

    // ── Simulated board ───────────────────────────────────────────────────────
    let pages = range.end.div_ceil(PAGE_SIZE).max(1) as usize;
    let fabric = Arc::new(SimFabric::new(pages));
    let flash = Arc::new(SimFlash::attached_to(fabric.backing_store()));
    let display: Arc<dyn StatusDisplay> = Arc::new(LogDisplay::new());
    let system: Arc<dyn SystemControl> = Arc::new(HostSystem::new());
    let arbiter = Arc::new(BusArbiter::new(fabric as Arc<dyn FabricBus>));

    let sequencer = ReflashSequencer::new(
        Arc::clone(&arbiter),
        flash as Arc<dyn FlashChip>,
        display,
        Arc::clone(&system),
        image,
        config.reflash.settings(),
    );
    let mut use_case = HandleInputUseCase::new(
        HotkeyDispatcher::new(config.diagnostics.bank_dump_hotkey),
        MatrixPublisher::new(Arc::clone(&arbiter)),
        sequencer,
        Diagnostics::new(Arc::clone(&arbiter)),
        system,
    );

    // ── Input and housekeeping ────────────────────────────────────────────────
    let source = StdinInputSource::new();
    let mut events = source.start().context("starting input source")?;
    let mut flush_tick = tokio::time::interval(config.bridge.flush_interval());

    info!("fabric-bridge ready.  Press Ctrl-C to exit.");

    let result: anyhow::Result<()> = loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(event) => {
                    if let Err(e) = use_case.handle_event(event).await {
                        error!("fatal: {e}");
                        break Err(e.into());
                    }
                }
                None => {
                    info!("input closed");
                    break Ok(());
                }
            },
            _ = flush_tick.tick() => {
                if let Err(e) = use_case.flush() {
                    if e.is_fatal() {
                        error!("fatal: {e}");
                        break Err(e.into());
                    }
                    warn!("matrix flush failed: {e}");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("shutdown signal received");
                break Ok(());
            }
        }
    };

    source.stop();
    info!("fabric-bridge stopped");
    result
}
