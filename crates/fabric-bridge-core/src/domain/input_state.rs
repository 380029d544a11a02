//! Live keyboard state owned by the input dispatch loop.
//!
//! [`InputState`] is the only place raw [`KeyEvent`]s mutate anything.  The
//! dispatch loop owns one instance and hands shared references to the matrix
//! encoder and the hotkey dispatcher on every event.

use crate::keymap::{Scancode, TRACKED_SCANCODES};

/// One raw key transition from the input source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub scancode: Scancode,
    pub pressed: bool,
}

impl KeyEvent {
    pub fn down(scancode: Scancode) -> Self {
        Self {
            scancode,
            pressed: true,
        }
    }

    pub fn up(scancode: Scancode) -> Self {
        Self {
            scancode,
            pressed: false,
        }
    }
}

/// Bitmask of held modifier keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct ModifierState(pub u8);

impl ModifierState {
    pub const LEFT_CTRL: u8 = 1 << 0;
    pub const RIGHT_CTRL: u8 = 1 << 1;
    pub const LEFT_SHIFT: u8 = 1 << 2;
    pub const RIGHT_SHIFT: u8 = 1 << 3;
    pub const LEFT_ALT: u8 = 1 << 4;
    pub const RIGHT_ALT: u8 = 1 << 5;
    pub const LEFT_GUI: u8 = 1 << 6;
    pub const RIGHT_GUI: u8 = 1 << 7;

    /// Returns the bit for a modifier scancode, or `None` for any other key.
    pub fn bit_for(scancode: Scancode) -> Option<u8> {
        match scancode {
            Scancode::ControlLeft => Some(Self::LEFT_CTRL),
            Scancode::ControlRight => Some(Self::RIGHT_CTRL),
            Scancode::ShiftLeft => Some(Self::LEFT_SHIFT),
            Scancode::ShiftRight => Some(Self::RIGHT_SHIFT),
            Scancode::AltLeft => Some(Self::LEFT_ALT),
            Scancode::AltRight => Some(Self::RIGHT_ALT),
            Scancode::GuiLeft => Some(Self::LEFT_GUI),
            Scancode::GuiRight => Some(Self::RIGHT_GUI),
            _ => None,
        }
    }

    /// Sets or clears the bit belonging to `scancode`.  Non-modifiers are ignored.
    pub fn update(&mut self, scancode: Scancode, pressed: bool) {
        if let Some(bit) = Self::bit_for(scancode) {
            if pressed {
                self.0 |= bit;
            } else {
                self.0 &= !bit;
            }
        }
    }

    /// Returns `true` if either Ctrl modifier is active.
    pub fn ctrl(&self) -> bool {
        self.0 & (Self::LEFT_CTRL | Self::RIGHT_CTRL) != 0
    }

    /// Returns `true` if either Shift modifier is active.
    pub fn shift(&self) -> bool {
        self.0 & (Self::LEFT_SHIFT | Self::RIGHT_SHIFT) != 0
    }

    /// Returns `true` if either Alt modifier is active.
    pub fn alt(&self) -> bool {
        self.0 & (Self::LEFT_ALT | Self::RIGHT_ALT) != 0
    }

    /// Returns `true` if either GUI (Win/Cmd/Super) modifier is active.
    pub fn gui(&self) -> bool {
        self.0 & (Self::LEFT_GUI | Self::RIGHT_GUI) != 0
    }
}

/// 64-slot bitset of raw key-down state, one slot per tracked scancode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct PressedKeySet(u64);

impl PressedKeySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks `scancode` as pressed or released.
    ///
    /// Returns `false` when the scancode has no slot and was ignored.
    pub fn set(&mut self, scancode: Scancode, pressed: bool) -> bool {
        match scancode.slot() {
            Some(slot) => {
                if pressed {
                    self.0 |= 1 << slot;
                } else {
                    self.0 &= !(1 << slot);
                }
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, scancode: Scancode) -> bool {
        scancode
            .slot()
            .map(|slot| self.contains_slot(slot))
            .unwrap_or(false)
    }

    pub fn contains_slot(&self, slot: usize) -> bool {
        slot < TRACKED_SCANCODES && self.0 & (1 << slot) != 0
    }

    /// Iterates pressed slots in ascending order.
    pub fn slots(&self) -> impl Iterator<Item = usize> + '_ {
        (0..TRACKED_SCANCODES).filter(move |&slot| self.contains_slot(slot))
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

/// What a single event did to the state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// A key went from released to pressed.  Hotkeys are evaluated only here.
    DownEdge,
    /// A key-down for a key that was already held (auto-repeat).
    Repeat,
    /// A key was released.
    Up,
}

/// Modifier mask plus pressed-key set; the complete input to the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputState {
    pub modifiers: ModifierState,
    pub pressed: PressedKeySet,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one raw event into the state and classifies the transition.
    pub fn apply(&mut self, event: KeyEvent) -> Transition {
        if !event.pressed {
            self.modifiers.update(event.scancode, false);
            self.pressed.set(event.scancode, false);
            return Transition::Up;
        }

        let already_down = match ModifierState::bit_for(event.scancode) {
            Some(bit) => self.modifiers.0 & bit != 0,
            None => self.pressed.contains(event.scancode),
        };
        self.modifiers.update(event.scancode, true);
        self.pressed.set(event.scancode, true);

        if already_down {
            Transition::Repeat
        } else {
            Transition::DownEdge
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_all_clear() {
        let state = InputState::new();
        assert_eq!(state.modifiers, ModifierState(0));
        assert!(state.pressed.is_empty());
    }

    #[test]
    fn test_left_and_right_modifiers_are_tracked_independently() {
        let mut mods = ModifierState::default();
        mods.update(Scancode::ShiftLeft, true);
        mods.update(Scancode::ShiftRight, true);
        mods.update(Scancode::ShiftLeft, false);
        assert!(mods.shift(), "right shift is still held");
        mods.update(Scancode::ShiftRight, false);
        assert!(!mods.shift());
    }

    #[test]
    fn test_non_modifier_does_not_touch_modifier_mask() {
        let mut mods = ModifierState::default();
        mods.update(Scancode::KeyA, true);
        assert_eq!(mods.0, 0);
    }

    #[test]
    fn test_pressed_set_ignores_untracked_scancodes() {
        let mut set = PressedKeySet::new();
        assert!(!set.set(Scancode::F12, true));
        assert!(!set.set(Scancode::ControlLeft, true));
        assert!(set.is_empty());
    }

    #[test]
    fn test_pressed_set_iterates_in_ascending_order() {
        let mut set = PressedKeySet::new();
        set.set(Scancode::Space, true);
        set.set(Scancode::KeyA, true);
        set.set(Scancode::Digit1, true);
        let slots: Vec<usize> = set.slots().collect();
        assert_eq!(slots, vec![0x04, 0x1E, 0x2C]);
    }

    #[test]
    fn test_repeated_key_down_is_not_an_edge() {
        // Arrange
        let mut state = InputState::new();

        // Act
        let first = state.apply(KeyEvent::down(Scancode::Escape));
        let second = state.apply(KeyEvent::down(Scancode::Escape));
        let release = state.apply(KeyEvent::up(Scancode::Escape));
        let again = state.apply(KeyEvent::down(Scancode::Escape));

        // Assert
        assert_eq!(first, Transition::DownEdge);
        assert_eq!(second, Transition::Repeat);
        assert_eq!(release, Transition::Up);
        assert_eq!(again, Transition::DownEdge);
    }

    #[test]
    fn test_modifier_repeat_is_detected() {
        let mut state = InputState::new();
        assert_eq!(state.apply(KeyEvent::down(Scancode::ControlLeft)), Transition::DownEdge);
        assert_eq!(state.apply(KeyEvent::down(Scancode::ControlLeft)), Transition::Repeat);
        assert!(state.modifiers.ctrl());
        assert!(state.pressed.is_empty());
    }

    #[test]
    fn test_unknown_scancode_down_is_an_edge_without_state_change() {
        let mut state = InputState::new();
        assert_eq!(state.apply(KeyEvent::down(Scancode::Unknown)), Transition::DownEdge);
        assert_eq!(state, InputState::new());
    }
}
