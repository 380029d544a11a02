//! Physical key positions reported by the raw input source.
//!
//! The input source delivers USB HID Usage IDs (page 0x07, Keyboard/Keypad),
//! one per physical key position.  The values are positions, not characters:
//! the character a key produces is decided later by the matrix mapping table
//! together with the live modifier state.
//!
//! # Ranges that matter to the bridge
//!
//! | Range       | Meaning                                          |
//! |-------------|--------------------------------------------------|
//! | 0x04–0x3F   | Tracked in the 64-slot pressed-key set           |
//! | 0xE0–0xE7   | Modifiers, tracked in the modifier bitmask       |
//! | anything else | Ignored (no matrix effect)                     |
//!
//! [`Scancode::Unknown`] (value 0x0000) stands in for every value outside the
//! enumeration.  Unknown scancodes are dropped silently by the encoder.

use serde::{Deserialize, Serialize};

/// Number of scancode slots tracked by the pressed-key set.
pub const TRACKED_SCANCODES: usize = 64;

/// A physical key position (USB HID Usage ID on the keyboard page).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u16)]
pub enum Scancode {
    // Letters (0x04–0x1D)
    KeyA = 0x04,
    KeyB = 0x05,
    KeyC = 0x06,
    KeyD = 0x07,
    KeyE = 0x08,
    KeyF = 0x09,
    KeyG = 0x0A,
    KeyH = 0x0B,
    KeyI = 0x0C,
    KeyJ = 0x0D,
    KeyK = 0x0E,
    KeyL = 0x0F,
    KeyM = 0x10,
    KeyN = 0x11,
    KeyO = 0x12,
    KeyP = 0x13,
    KeyQ = 0x14,
    KeyR = 0x15,
    KeyS = 0x16,
    KeyT = 0x17,
    KeyU = 0x18,
    KeyV = 0x19,
    KeyW = 0x1A,
    KeyX = 0x1B,
    KeyY = 0x1C,
    KeyZ = 0x1D,

    // Digits (0x1E–0x27)
    Digit1 = 0x1E,
    Digit2 = 0x1F,
    Digit3 = 0x20,
    Digit4 = 0x21,
    Digit5 = 0x22,
    Digit6 = 0x23,
    Digit7 = 0x24,
    Digit8 = 0x25,
    Digit9 = 0x26,
    Digit0 = 0x27,

    // Control and punctuation (0x28–0x38)
    Enter = 0x28,
    Escape = 0x29,
    Backspace = 0x2A,
    Tab = 0x2B,
    Space = 0x2C,
    Minus = 0x2D,
    Equal = 0x2E,
    BracketLeft = 0x2F,
    BracketRight = 0x30,
    Backslash = 0x31,
    Semicolon = 0x33,
    Quote = 0x34,
    Backquote = 0x35,
    Comma = 0x36,
    Period = 0x37,
    Slash = 0x38,

    CapsLock = 0x39,

    // Function keys (0x3A–0x45); F1–F6 fall inside the tracked range.
    F1 = 0x3A,
    F2 = 0x3B,
    F3 = 0x3C,
    F4 = 0x3D,
    F5 = 0x3E,
    F6 = 0x3F,
    F7 = 0x40,
    F8 = 0x41,
    F9 = 0x42,
    F10 = 0x43,
    F11 = 0x44,
    F12 = 0x45,

    // Modifiers (0xE0–0xE7)
    ControlLeft = 0xE0,
    ShiftLeft = 0xE1,
    AltLeft = 0xE2,
    GuiLeft = 0xE3,
    ControlRight = 0xE4,
    ShiftRight = 0xE5,
    AltRight = 0xE6,
    GuiRight = 0xE7,

    /// Sentinel for values outside the enumeration.
    Unknown = 0x0000,
}

impl Scancode {
    /// Converts a raw usage ID to a [`Scancode`].
    ///
    /// Returns [`Scancode::Unknown`] if the value is not part of the enumeration.
    pub fn from_u16(value: u16) -> Self {
        match value {
            0x04 => Scancode::KeyA,
            0x05 => Scancode::KeyB,
            0x06 => Scancode::KeyC,
            0x07 => Scancode::KeyD,
            0x08 => Scancode::KeyE,
            0x09 => Scancode::KeyF,
            0x0A => Scancode::KeyG,
            0x0B => Scancode::KeyH,
            0x0C => Scancode::KeyI,
            0x0D => Scancode::KeyJ,
            0x0E => Scancode::KeyK,
            0x0F => Scancode::KeyL,
            0x10 => Scancode::KeyM,
            0x11 => Scancode::KeyN,
            0x12 => Scancode::KeyO,
            0x13 => Scancode::KeyP,
            0x14 => Scancode::KeyQ,
            0x15 => Scancode::KeyR,
            0x16 => Scancode::KeyS,
            0x17 => Scancode::KeyT,
            0x18 => Scancode::KeyU,
            0x19 => Scancode::KeyV,
            0x1A => Scancode::KeyW,
            0x1B => Scancode::KeyX,
            0x1C => Scancode::KeyY,
            0x1D => Scancode::KeyZ,
            0x1E => Scancode::Digit1,
            0x1F => Scancode::Digit2,
            0x20 => Scancode::Digit3,
            0x21 => Scancode::Digit4,
            0x22 => Scancode::Digit5,
            0x23 => Scancode::Digit6,
            0x24 => Scancode::Digit7,
            0x25 => Scancode::Digit8,
            0x26 => Scancode::Digit9,
            0x27 => Scancode::Digit0,
            0x28 => Scancode::Enter,
            0x29 => Scancode::Escape,
            0x2A => Scancode::Backspace,
            0x2B => Scancode::Tab,
            0x2C => Scancode::Space,
            0x2D => Scancode::Minus,
            0x2E => Scancode::Equal,
            0x2F => Scancode::BracketLeft,
            0x30 => Scancode::BracketRight,
            0x31 => Scancode::Backslash,
            0x33 => Scancode::Semicolon,
            0x34 => Scancode::Quote,
            0x35 => Scancode::Backquote,
            0x36 => Scancode::Comma,
            0x37 => Scancode::Period,
            0x38 => Scancode::Slash,
            0x39 => Scancode::CapsLock,
            0x3A => Scancode::F1,
            0x3B => Scancode::F2,
            0x3C => Scancode::F3,
            0x3D => Scancode::F4,
            0x3E => Scancode::F5,
            0x3F => Scancode::F6,
            0x40 => Scancode::F7,
            0x41 => Scancode::F8,
            0x42 => Scancode::F9,
            0x43 => Scancode::F10,
            0x44 => Scancode::F11,
            0x45 => Scancode::F12,
            0xE0 => Scancode::ControlLeft,
            0xE1 => Scancode::ShiftLeft,
            0xE2 => Scancode::AltLeft,
            0xE3 => Scancode::GuiLeft,
            0xE4 => Scancode::ControlRight,
            0xE5 => Scancode::ShiftRight,
            0xE6 => Scancode::AltRight,
            0xE7 => Scancode::GuiRight,
            _ => Scancode::Unknown,
        }
    }

    /// Returns the raw usage ID.
    pub fn as_u16(self) -> u16 {
        self as u16
    }

    /// Returns the pressed-key slot for this scancode, or `None` if it lies
    /// outside the tracked range.
    pub fn slot(self) -> Option<usize> {
        let value = self.as_u16() as usize;
        if self != Scancode::Unknown && value < TRACKED_SCANCODES {
            Some(value)
        } else {
            None
        }
    }

    /// Returns `true` for the eight modifier positions (Ctrl, Shift, Alt, GUI; left and right).
    pub fn is_modifier(self) -> bool {
        matches!(
            self,
            Scancode::ControlLeft
                | Scancode::ControlRight
                | Scancode::ShiftLeft
                | Scancode::ShiftRight
                | Scancode::AltLeft
                | Scancode::AltRight
                | Scancode::GuiLeft
                | Scancode::GuiRight
        )
    }
}
