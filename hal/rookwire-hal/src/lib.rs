//! Rookwire Hardware Abstraction Layer
//!
//! Traits for the serial channel between the host and the chessboard
//! controller. The core crate is written against these traits only.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  rookwire-core (link, poller, session)  │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  rookwire-hal (this crate - traits)     │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │ rookwire-hal- │       │ in-memory     │
//! │     std       │       │ test fakes    │
//! └───────────────┘       └───────────────┘
//! ```

#![no_std]
#![deny(unsafe_code)]

pub mod uart;

pub use uart::{DataBits, Parity, StopBits, UartConfig, UartRx, UartTx};
