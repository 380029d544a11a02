//! Application layer use cases for the bridge.
//!
//! # What is the "application" layer? (for beginners)
//!
//! In Clean Architecture the *application* layer sits between the domain
//! (pure rules in `fabric_bridge_core`) and the infrastructure (registers,
//! flash, display, stdin).  Use cases here orchestrate domain objects and
//! depend only on the traits they declare, so the board adapters and the
//! test mocks are interchangeable.
//!
//! # Sub-modules
//!
//! - **`bus_arbiter`** – Single-owner access to the shared fabric bus, with
//!   bank-register save/restore around every excursion.
//! - **`publish_matrix`** – Writes the keyboard matrix only when it changed.
//! - **`dispatch_hotkey`** – The modifier + trigger decision table.
//! - **`reflash`** – The verify / program / verify / finalize sequence.
//! - **`diagnostics`** – The bank-register dump.
//! - **`storage_client`** – Requests to the companion storage module.
//! - **`handle_input`** – The per-event pipeline tying the above together.
//! - **`board`** – Status display and system-control ports.

pub mod board;
pub mod bus_arbiter;
pub mod diagnostics;
pub mod dispatch_hotkey;
pub mod handle_input;
pub mod publish_matrix;
pub mod reflash;
pub mod storage_client;
