//! # fabric-bridge-core
//!
//! Platform-free core of the fabric bridge: the pieces of the control
//! microcontroller's firmware that need no hardware to run or to test.
//!
//! # Architecture overview
//!
//! The bridge sits between a host keyboard and an emulated retro computer
//! (the "fabric").  Host key transitions arrive as USB HID scancodes; the
//! fabric expects the active-low 8×6 scan matrix of the target machine.
//!
//! - **`keymap`** – The scancode enumeration, the target matrix key positions,
//!   and the static table that maps one to the other, including the target's
//!   own shifted-symbol layout.
//!
//! - **`domain`** – The live input state, the matrix encoder (a pure function
//!   of that state), and the immutable ROM image used by the reflash sequence.
//!
//! - **`protocol`** – Framing for the companion storage module's single
//!   request/response primitive.

pub mod domain;
pub mod keymap;
pub mod protocol;

pub use domain::image::{ImageError, ImageRange, RomImage};
pub use domain::input_state::{InputState, KeyEvent, ModifierState, PressedKeySet, Transition};
pub use domain::matrix::{encode, MatrixBitmap};
pub use keymap::{MappingRule, MatrixKey, Scancode, Target};
