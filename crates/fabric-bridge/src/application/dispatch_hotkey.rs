//! HotkeyDispatcher: maps modifier + trigger combinations to system actions.
//!
//! The decision table is priority ordered; the first row whose modifiers are
//! all held wins, so the most specific combination takes precedence.
//!
//! | Modifiers held          | Trigger | Action                 |
//! |-------------------------|---------|------------------------|
//! | ctrl + shift + alt + gui| Escape  | reflash system ROM     |
//! | ctrl + shift            | Escape  | restart the controller |
//! | ctrl                    | Escape  | reset the fabric only  |
//! | (none of the above)     | Escape  | no action; the encoder turns it into CTRL+C |
//! | any                     | F4      | dump bank registers (if enabled) |
//!
//! The caller evaluates the table only on a fresh key-down edge, never on
//! auto-repeat, so a held trigger fires at most once.

use fabric_bridge_core::{ModifierState, Scancode};

/// A system action selected by a hotkey.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotkeyAction {
    Reflash,
    RestartController,
    ResetFabric,
    DumpBanks,
}

/// Modifier groups a table row requires.  Left and right keys are equivalent.
#[derive(Debug, Clone, Copy)]
struct Chord {
    ctrl: bool,
    shift: bool,
    alt: bool,
    gui: bool,
}

impl Chord {
    const fn new(ctrl: bool, shift: bool, alt: bool, gui: bool) -> Self {
        Self {
            ctrl,
            shift,
            alt,
            gui,
        }
    }

    fn held_in(&self, mods: ModifierState) -> bool {
        (!self.ctrl || mods.ctrl())
            && (!self.shift || mods.shift())
            && (!self.alt || mods.alt())
            && (!self.gui || mods.gui())
    }
}

const ESCAPE_TABLE: [(Chord, HotkeyAction); 3] = [
    (Chord::new(true, true, true, true), HotkeyAction::Reflash),
    (Chord::new(true, true, false, false), HotkeyAction::RestartController),
    (Chord::new(true, false, false, false), HotkeyAction::ResetFabric),
];

#[derive(Debug, Clone, Copy)]
pub struct HotkeyDispatcher {
    bank_dump_enabled: bool,
}

impl HotkeyDispatcher {
    pub fn new(bank_dump_enabled: bool) -> Self {
        Self { bank_dump_enabled }
    }

    /// Decides the action for a trigger pressed under `mods`.
    pub fn dispatch(&self, mods: ModifierState, scancode: Scancode) -> Option<HotkeyAction> {
        match scancode {
            Scancode::Escape => ESCAPE_TABLE
                .iter()
                .find(|(chord, _)| chord.held_in(mods))
                .map(|&(_, action)| action),
            Scancode::F4 if self.bank_dump_enabled => Some(HotkeyAction::DumpBanks),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mods(bits: u8) -> ModifierState {
        ModifierState(bits)
    }

    const CTRL: u8 = ModifierState::LEFT_CTRL;
    const SHIFT: u8 = ModifierState::LEFT_SHIFT;
    const ALT: u8 = ModifierState::LEFT_ALT;
    const GUI: u8 = ModifierState::LEFT_GUI;

    #[test]
    fn test_all_four_modifiers_select_reflash() {
        let d = HotkeyDispatcher::new(true);
        assert_eq!(
            d.dispatch(mods(CTRL | SHIFT | ALT | GUI), Scancode::Escape),
            Some(HotkeyAction::Reflash)
        );
    }

    #[test]
    fn test_right_hand_modifiers_count_the_same() {
        let d = HotkeyDispatcher::new(true);
        let right = ModifierState::RIGHT_CTRL
            | ModifierState::RIGHT_SHIFT
            | ModifierState::RIGHT_ALT
            | ModifierState::RIGHT_GUI;
        assert_eq!(d.dispatch(mods(right), Scancode::Escape), Some(HotkeyAction::Reflash));
    }

    #[test]
    fn test_ctrl_shift_selects_restart() {
        let d = HotkeyDispatcher::new(true);
        assert_eq!(
            d.dispatch(mods(CTRL | SHIFT), Scancode::Escape),
            Some(HotkeyAction::RestartController)
        );
        // Three of four modifiers is still the restart row.
        assert_eq!(
            d.dispatch(mods(CTRL | SHIFT | ALT), Scancode::Escape),
            Some(HotkeyAction::RestartController)
        );
    }

    #[test]
    fn test_ctrl_alone_selects_fabric_reset() {
        let d = HotkeyDispatcher::new(true);
        assert_eq!(
            d.dispatch(mods(CTRL), Scancode::Escape),
            Some(HotkeyAction::ResetFabric)
        );
    }

    #[test]
    fn test_escape_without_ctrl_is_not_a_system_action() {
        let d = HotkeyDispatcher::new(true);
        assert_eq!(d.dispatch(mods(0), Scancode::Escape), None);
        assert_eq!(d.dispatch(mods(SHIFT | ALT | GUI), Scancode::Escape), None);
    }

    #[test]
    fn test_f4_dump_respects_configuration() {
        assert_eq!(
            HotkeyDispatcher::new(true).dispatch(mods(0), Scancode::F4),
            Some(HotkeyAction::DumpBanks)
        );
        assert_eq!(HotkeyDispatcher::new(false).dispatch(mods(0), Scancode::F4), None);
    }

    #[test]
    fn test_ordinary_keys_never_trigger() {
        let d = HotkeyDispatcher::new(true);
        assert_eq!(d.dispatch(mods(CTRL | SHIFT | ALT | GUI), Scancode::KeyA), None);
    }
}
