//! Integration tests for the reflash sequence.
//!
//! These wire the real `BusArbiter` and `ReflashSequencer` to the in-memory
//! board (fabric and flash sharing one backing store) and check the
//! end-to-end outcomes: what ends up in flash, whether the controller
//! restarts, and that the fabric's bank context survives.

use std::sync::Arc;
use std::time::Duration;

use fabric_bridge::application::board::{StatusDisplay, SystemControl};
use fabric_bridge::application::bus_arbiter::{BusArbiter, FabricBus};
use fabric_bridge::application::reflash::{
    FlashChip, PrecheckMode, ReflashOutcome, ReflashSequencer, ReflashSettings, ReflashState,
};
use fabric_bridge::infrastructure::display::mock::MockDisplay;
use fabric_bridge::infrastructure::fabric::mock::MockFabric;
use fabric_bridge::infrastructure::flash::mock::MockFlash;
use fabric_bridge::infrastructure::system::mock::{MockSystem, SystemEvent};
use fabric_bridge_core::domain::image::{ADDRESSABLE_LIMIT, PAGE_SIZE};
use fabric_bridge_core::RomImage;

const BLINK: Duration = Duration::from_millis(3);

struct Board {
    fabric: Arc<MockFabric>,
    flash: Arc<MockFlash>,
    display: Arc<MockDisplay>,
    system: Arc<MockSystem>,
}

fn build(image: RomImage, precheck: PrecheckMode, stuck: Option<u32>) -> (Board, ReflashSequencer) {
    build_on(8, image, precheck, stuck)
}

fn build_on(
    pages: usize,
    image: RomImage,
    precheck: PrecheckMode,
    stuck: Option<u32>,
) -> (Board, ReflashSequencer) {
    let fabric = Arc::new(MockFabric::new(pages));
    let mut flash = MockFlash::attached_to(fabric.backing_store());
    flash.stuck_address = stuck;
    let flash = Arc::new(flash);
    let display = Arc::new(MockDisplay::new());
    let system = Arc::new(MockSystem::new());
    let arbiter = Arc::new(BusArbiter::new(Arc::clone(&fabric) as Arc<dyn FabricBus>));
    let settings = ReflashSettings {
        precheck,
        blink_count: 5,
        blink_interval: BLINK,
        intro_hold: Duration::from_millis(1),
        status_hold: Duration::from_millis(2),
    };
    let sequencer = ReflashSequencer::new(
        arbiter,
        Arc::clone(&flash) as Arc<dyn FlashChip>,
        Arc::clone(&display) as Arc<dyn StatusDisplay>,
        Arc::clone(&system) as Arc<dyn SystemControl>,
        image,
        settings,
    );
    (
        Board {
            fabric,
            flash,
            display,
            system,
        },
        sequencer,
    )
}

fn rom(base: u32, len: usize) -> RomImage {
    let bytes: Vec<u8> = (0..len).map(|i| (i as u8).wrapping_mul(31) ^ 0x5A).collect();
    RomImage::new(base, bytes).expect("valid image")
}

#[tokio::test]
async fn test_successful_reflash_leaves_image_in_flash_and_restarts() {
    // Arrange
    let image = rom(0, 0x9000);
    let (board, mut sequencer) = build(image.clone(), PrecheckMode::Off, None);

    // Act
    let outcome = sequencer.run().await.expect("no fatal error");

    // Assert
    assert_eq!(outcome, ReflashOutcome::Restarted);
    assert_eq!(board.system.restart_count(), 1);
    let store = board.fabric.backing_store();
    let memory = store.lock().unwrap();
    assert_eq!(&memory[..image.bytes().len()], image.bytes());
}

#[tokio::test]
async fn test_image_at_nonzero_base_is_programmed_in_place() {
    let image = rom(0x8000, 0x1000);
    let (board, mut sequencer) = build(image.clone(), PrecheckMode::Off, None);

    let outcome = sequencer.run().await.unwrap();

    assert_eq!(outcome, ReflashOutcome::Restarted);
    assert_eq!(board.flash.erased_sectors(), vec![0x8000]);
    let store = board.fabric.backing_store();
    let memory = store.lock().unwrap();
    assert_eq!(&memory[0x8000..0x9000], image.bytes());
    assert!(memory[..0x8000].iter().all(|&b| b == 0xFF), "below the image untouched");
}

#[tokio::test]
async fn test_bad_cell_ends_in_blink_and_idle_without_restart() {
    // Arrange
    let (board, mut sequencer) = build(rom(0, 0x3000), PrecheckMode::Off, Some(0x2FFF));

    // Act
    let outcome = sequencer.run().await.unwrap();

    // Assert
    assert_eq!(outcome, ReflashOutcome::FailureIndicated);
    assert_eq!(sequencer.state(), ReflashState::Idle);
    assert_eq!(board.system.restart_count(), 0);
    assert_eq!(board.system.delay_count(BLINK), 10);
    assert_eq!(
        board.system.events().last(),
        Some(&SystemEvent::Delay(BLINK)),
        "the blink pattern is the last thing the sequencer does"
    );
}

#[tokio::test]
async fn test_bank_context_is_preserved_across_reflash() {
    let (board, mut sequencer) = build(rom(0, 0xC000), PrecheckMode::Report, None);
    board.fabric.set_banks([0x21, 0x22, 0x23, 0x24]);

    sequencer.run().await.unwrap();

    assert_eq!(board.fabric.banks(), [0x21, 0x22, 0x23, 0x24]);
}

#[tokio::test]
async fn test_second_run_with_skip_if_current_writes_nothing() {
    // Arrange: program once.
    let image = rom(0, 0x2000);
    let (board, mut sequencer) = build(image, PrecheckMode::SkipIfCurrent, None);
    assert_eq!(sequencer.run().await.unwrap(), ReflashOutcome::Restarted);
    let calls_after_first = board.flash.calls().len();

    // Act
    let outcome = sequencer.run().await.unwrap();

    // Assert
    assert_eq!(outcome, ReflashOutcome::AlreadyCurrent);
    assert_eq!(board.flash.calls().len(), calls_after_first);
    assert_eq!(board.system.restart_count(), 1);
}

#[tokio::test]
async fn test_status_messages_fit_the_overlay() {
    let (board, mut sequencer) = build(rom(0x1_0000, 0x2000), PrecheckMode::Report, Some(0x1_0010));

    sequencer.run().await.unwrap();

    let messages = board.display.messages();
    assert!(!messages.is_empty());
    assert!(messages.iter().all(|m| m.len() < 50 && m.is_ascii()));
    assert!(messages.iter().any(|m| m == "Programming system ROM @ $10400"));
}

#[tokio::test]
async fn test_image_in_last_addressable_page_verifies_against_that_page() {
    // Arrange
    let base = ADDRESSABLE_LIMIT - PAGE_SIZE;
    let image = rom(base, 0x1000);
    let (board, mut sequencer) = build_on(256, image.clone(), PrecheckMode::Off, None);

    // Act
    let outcome = sequencer.run().await.expect("no fatal error");

    // Assert
    assert_eq!(outcome, ReflashOutcome::Restarted);
    assert_eq!(board.system.restart_count(), 1);
    let store = board.fabric.backing_store();
    let store = store.lock().expect("lock poisoned");
    let start = base as usize;
    assert_eq!(&store[start..start + image.bytes().len()], image.bytes());
}
