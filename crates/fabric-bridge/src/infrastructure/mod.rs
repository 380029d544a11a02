//! Infrastructure layer for the bridge.
//!
//! Contains the adapters behind the application's ports: the fabric register
//! transport, the flash chip, the status overlay, system control, raw key
//! input, the companion storage link, and configuration persistence.  The
//! host build's simulated board uses the `sim` fabric and flash adapters;
//! each adapter directory also carries a recording `mock` for the tests.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `fabric_bridge_core`, but MUST NOT be imported by the `application` layer
//! outside of its tests.

pub mod companion;
pub mod display;
pub mod fabric;
pub mod flash;
pub mod input_source;
pub mod storage;
pub mod system;
