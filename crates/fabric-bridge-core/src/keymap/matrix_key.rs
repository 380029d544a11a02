//! Key positions of the target machine's 8×6 keyboard scan matrix.
//!
//! The emulated hardware scans its keyboard as 8 rows of 6 keys.  Each key is
//! identified by `row * 6 + bit`, which is the discriminant of [`MatrixKey`].
//!
//! ```text
//! row │ bit0  bit1  bit2  bit3   bit4   bit5
//! ────┼──────────────────────────────────────
//!  0  │  =    BS    :     RET    ;      .
//!  1  │  -    /     0     P      L      ,
//!  2  │  9    O     K     M      N      J
//!  3  │  8    I     7     U      H      B
//!  4  │  6    Y     G     V      C      F
//!  5  │  5    T     4     R      D      X
//!  6  │  3    E     S     Z      SPACE  A
//!  7  │  2    W     1     Q      SHIFT  CTRL
//! ```

/// Number of keys on each matrix row.
pub const KEYS_PER_ROW: u8 = 6;

/// A position on the target keyboard matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MatrixKey {
    Equals = 0,
    Backspace = 1,
    Colon = 2,
    Return = 3,
    Semicolon = 4,
    Period = 5,

    Minus = 6,
    Slash = 7,
    Digit0 = 8,
    P = 9,
    L = 10,
    Comma = 11,

    Digit9 = 12,
    O = 13,
    K = 14,
    M = 15,
    N = 16,
    J = 17,

    Digit8 = 18,
    I = 19,
    Digit7 = 20,
    U = 21,
    H = 22,
    B = 23,

    Digit6 = 24,
    Y = 25,
    G = 26,
    V = 27,
    C = 28,
    F = 29,

    Digit5 = 30,
    T = 31,
    Digit4 = 32,
    R = 33,
    D = 34,
    X = 35,

    Digit3 = 36,
    E = 37,
    S = 38,
    Z = 39,
    Space = 40,
    A = 41,

    Digit2 = 42,
    W = 43,
    Digit1 = 44,
    Q = 45,
    Shift = 46,
    Ctrl = 47,
}

impl MatrixKey {
    /// Linear index `row * 6 + bit`.
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Matrix row (byte index in the bitmap).
    pub fn row(self) -> usize {
        (self.index() / KEYS_PER_ROW) as usize
    }

    /// Bit mask of this key inside its row byte.
    pub fn mask(self) -> u8 {
        1 << (self.index() % KEYS_PER_ROW)
    }
}
