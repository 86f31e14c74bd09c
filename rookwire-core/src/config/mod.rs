//! Configuration types
//!
//! Board-agnostic session configuration. The bridge fills these from its
//! TOML file; everything has a usable default.

pub mod sentinels;
pub mod types;

pub use sentinels::{GameInput, IdleInput, MenuAction, MenuBinding, SentinelMap};
pub use types::*;
