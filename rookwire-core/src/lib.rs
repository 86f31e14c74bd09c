//! Board-agnostic core logic for the chessboard bridge
//!
//! This crate contains everything between the serial byte stream and the
//! remote chess server that does not depend on a concrete transport:
//!
//! - [`link`]: handshake and framing over a [`rookwire_hal`] UART
//! - [`poller`]: turns frames into hardware events
//! - [`config`]: session configuration and the sentinel table
//! - [`game`]: remote event model, move lists, colors and outcomes
//! - [`traits`]: remote session, board input/indicator and archive seams
//! - [`state`]: turn state machine and state admission rules
//! - [`reconciler`]: merges board input with the remote game stream
//! - [`session`]: one game end to end, plus the idle menu

#![no_std]
#![deny(unsafe_code)]

extern crate alloc;

pub mod config;
pub mod game;
pub mod link;
pub mod patterns;
pub mod poller;
pub mod reconciler;
pub mod session;
pub mod state;
pub mod traits;

#[cfg(test)]
pub(crate) mod test_utils;
