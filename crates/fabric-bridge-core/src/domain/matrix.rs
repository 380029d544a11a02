//! Keyboard-matrix bitmap and the encoder that produces it.
//!
//! The bitmap is active-low: a cleared bit means the key at that matrix
//! position is held.  [`encode`] rebuilds the bitmap from scratch on every
//! call, so a bit can never be left stuck by an event that was missed or
//! processed out of order.

use std::fmt;

use crate::domain::input_state::InputState;
use crate::keymap::{self, MappingRule, MatrixKey, Target};

/// Number of rows (bytes) in the matrix.
pub const MATRIX_ROWS: usize = 8;

/// Eight row bytes, bit cleared = key pressed.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct MatrixBitmap([u8; MATRIX_ROWS]);

impl MatrixBitmap {
    /// All keys released.
    pub const RELEASED: MatrixBitmap = MatrixBitmap([0xFF; MATRIX_ROWS]);

    pub fn from_bytes(bytes: [u8; MATRIX_ROWS]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; MATRIX_ROWS] {
        &self.0
    }

    pub fn press(&mut self, key: MatrixKey) {
        self.0[key.row()] &= !key.mask();
    }

    pub fn release(&mut self, key: MatrixKey) {
        self.0[key.row()] |= key.mask();
    }

    pub fn is_pressed(&self, key: MatrixKey) -> bool {
        self.0[key.row()] & key.mask() == 0
    }

    /// Presses `target.key` and forces the matrix SHIFT key to the target's plane.
    fn press_target(&mut self, target: Target) {
        self.press(target.key);
        if target.shift {
            self.press(MatrixKey::Shift);
        } else {
            self.release(MatrixKey::Shift);
        }
    }
}

impl Default for MatrixBitmap {
    fn default() -> Self {
        Self::RELEASED
    }
}

impl fmt::Debug for MatrixBitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MatrixBitmap[")?;
        for (i, row) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{row:02X}")?;
        }
        write!(f, "]")
    }
}

/// Encodes the live input state into a matrix bitmap.
///
/// Pure function of `state`.  Ctrl and shift are pressed first from the
/// modifier mask; pressed scancodes are then applied in ascending slot order,
/// and each remapped key decides the shift plane for itself, so a later key
/// may release a SHIFT that the modifier mask pressed.
pub fn encode(state: &InputState) -> MatrixBitmap {
    let mut matrix = MatrixBitmap::RELEASED;
    let shift = state.modifiers.shift();
    let ctrl = state.modifiers.ctrl();

    if ctrl {
        matrix.press(MatrixKey::Ctrl);
    }
    if shift {
        matrix.press(MatrixKey::Shift);
    }

    for slot in state.pressed.slots() {
        let Some(rule) = keymap::rule_for_slot(slot) else {
            continue;
        };
        match rule {
            MappingRule::Direct(key) => matrix.press_target(Target::new(key, shift)),
            MappingRule::ShiftRemap { unshifted, shifted } => {
                let target = if shift { shifted } else { unshifted };
                if let Some(target) = target {
                    matrix.press_target(target);
                }
            }
            MappingRule::Composite { primary, secondary } => {
                if !ctrl {
                    matrix.press(primary);
                    matrix.press(secondary);
                }
            }
        }
    }

    matrix
}
