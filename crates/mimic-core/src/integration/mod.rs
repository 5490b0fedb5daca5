//! Integration layer: interfaces to the host runtime's own type system.

pub mod bridge;

pub use bridge::{Bridge, BridgeConfig, Bridged, BridgedType};
