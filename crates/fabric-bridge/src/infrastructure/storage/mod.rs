//! Storage infrastructure: configuration file persistence.
//!
//! The `config` sub-module reads the bridge's TOML configuration, falls back
//! to defaults when the file does not exist yet, and writes it back out.

pub mod config;
