//! Integration tests for the input pipeline.
//!
//! Events travel the same path as in the binary: `MockInputSource` →
//! `HandleInputUseCase::handle_event` → `flush` → fabric matrix register.

use std::sync::Arc;
use std::time::Duration;

use fabric_bridge::application::board::{StatusDisplay, SystemControl};
use fabric_bridge::application::bus_arbiter::{BusArbiter, FabricBus};
use fabric_bridge::application::diagnostics::Diagnostics;
use fabric_bridge::application::dispatch_hotkey::{HotkeyAction, HotkeyDispatcher};
use fabric_bridge::application::handle_input::HandleInputUseCase;
use fabric_bridge::application::publish_matrix::MatrixPublisher;
use fabric_bridge::application::reflash::{FlashChip, ReflashSequencer, ReflashSettings};
use fabric_bridge::infrastructure::display::mock::MockDisplay;
use fabric_bridge::infrastructure::fabric::mock::MockFabric;
use fabric_bridge::infrastructure::flash::mock::MockFlash;
use fabric_bridge::infrastructure::input_source::mock::MockInputSource;
use fabric_bridge::infrastructure::input_source::InputSource;
use fabric_bridge::infrastructure::system::mock::MockSystem;
use fabric_bridge_core::{KeyEvent, RomImage, Scancode};

struct Pipeline {
    fabric: Arc<MockFabric>,
    system: Arc<MockSystem>,
    use_case: HandleInputUseCase,
}

fn build_pipeline(bank_dump: bool) -> Pipeline {
    let fabric = Arc::new(MockFabric::new(1));
    let flash = Arc::new(MockFlash::attached_to(fabric.backing_store()));
    let system = Arc::new(MockSystem::new());
    let arbiter = Arc::new(BusArbiter::new(Arc::clone(&fabric) as Arc<dyn FabricBus>));
    let settings = ReflashSettings {
        blink_interval: Duration::from_millis(1),
        intro_hold: Duration::from_millis(1),
        status_hold: Duration::from_millis(1),
        ..ReflashSettings::default()
    };
    let sequencer = ReflashSequencer::new(
        Arc::clone(&arbiter),
        flash as Arc<dyn FlashChip>,
        Arc::new(MockDisplay::new()) as Arc<dyn StatusDisplay>,
        Arc::clone(&system) as Arc<dyn SystemControl>,
        RomImage::new(0, vec![0xC3u8; 0x400]).expect("image"),
        settings,
    );
    let use_case = HandleInputUseCase::new(
        HotkeyDispatcher::new(bank_dump),
        MatrixPublisher::new(Arc::clone(&arbiter)),
        sequencer,
        Diagnostics::new(Arc::clone(&arbiter)),
        Arc::clone(&system) as Arc<dyn SystemControl>,
    );
    Pipeline {
        fabric,
        system,
        use_case,
    }
}

/// Drains every queued event through the use case, flushing after each one.
async fn pump(
    pipeline: &mut Pipeline,
    rx: &mut tokio::sync::mpsc::UnboundedReceiver<KeyEvent>,
) -> Vec<Option<HotkeyAction>> {
    let mut fired = Vec::new();
    while let Ok(event) = rx.try_recv() {
        fired.push(pipeline.use_case.handle_event(event).await.expect("no fatal error"));
        pipeline.use_case.flush().expect("flush");
    }
    fired
}

#[tokio::test]
async fn test_typing_a_word_produces_one_write_per_change() {
    // Arrange
    let mut pipeline = build_pipeline(true);
    let source = MockInputSource::new();
    let mut rx = source.start().unwrap();

    // Act: "hi", with auto-repeat on the H.
    for event in [
        KeyEvent::down(Scancode::KeyH),
        KeyEvent::down(Scancode::KeyH),
        KeyEvent::up(Scancode::KeyH),
        KeyEvent::down(Scancode::KeyI),
        KeyEvent::up(Scancode::KeyI),
    ] {
        source.inject_event(event);
    }
    pump(&mut pipeline, &mut rx).await;

    // Assert: H down, idle, I down, idle.
    let writes = pipeline.fabric.matrix_writes();
    assert_eq!(writes.len(), 4);
    assert_eq!(writes[0][3], 0xEF, "H is row 3 bit 4");
    assert_eq!(writes[1], [0xFF; 8]);
    assert_eq!(writes[2][3], 0xFD, "I is row 3 bit 1");
    assert_eq!(writes[3], [0xFF; 8]);
}

#[tokio::test]
async fn test_shifted_symbol_uses_target_layout() {
    let mut pipeline = build_pipeline(true);
    let source = MockInputSource::new();
    let mut rx = source.start().unwrap();

    source.inject_event(KeyEvent::down(Scancode::ShiftLeft));
    source.inject_event(KeyEvent::down(Scancode::Digit2));
    pump(&mut pipeline, &mut rx).await;

    let last = *pipeline.fabric.matrix_writes().last().expect("a write");
    // ';' is row 0 bit 4, SHIFT is row 7 bit 4.
    assert_eq!(last[0], 0xEF);
    assert_eq!(last[7], 0xEF);
}

#[tokio::test]
async fn test_held_reflash_chord_fires_once() {
    // Arrange
    let mut pipeline = build_pipeline(true);
    let source = MockInputSource::new();
    let mut rx = source.start().unwrap();
    for code in [
        Scancode::ControlLeft,
        Scancode::ShiftLeft,
        Scancode::AltRight,
        Scancode::GuiRight,
    ] {
        source.inject_event(KeyEvent::down(code));
    }
    for _ in 0..5 {
        source.inject_event(KeyEvent::down(Scancode::Escape));
    }

    // Act
    let fired = pump(&mut pipeline, &mut rx).await;

    // Assert
    let reflashes = fired
        .iter()
        .filter(|a| **a == Some(HotkeyAction::Reflash))
        .count();
    assert_eq!(reflashes, 1);
    assert_eq!(pipeline.system.restart_count(), 1);
}

#[tokio::test]
async fn test_disabled_bank_dump_leaves_f4_inert() {
    let mut pipeline = build_pipeline(false);
    let source = MockInputSource::new();
    let mut rx = source.start().unwrap();

    source.inject_event(KeyEvent::down(Scancode::F4));
    let fired = pump(&mut pipeline, &mut rx).await;

    assert_eq!(fired, vec![None]);
}
