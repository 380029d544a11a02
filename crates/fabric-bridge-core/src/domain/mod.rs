//! Domain entities for the fabric bridge.
//!
//! Pure logic with no hardware dependencies: the live input state, the
//! keyboard-matrix encoder, and the ROM image the reflash sequence works on.
//! Everything here can be compiled and tested on any host.

pub mod image;
pub mod input_state;
pub mod matrix;
