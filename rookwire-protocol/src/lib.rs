//! Chessboard Serial Protocol
//!
//! This crate defines the byte protocol between the chessboard controller
//! (button matrix + LED matrix) and the host bridge. The link is a plain
//! UART; every byte is printable ASCII.
//!
//! # Protocol Overview
//!
//! Board → host, one latched move:
//! ```text
//! board:  s s s ... s          [from] [to]        [from] [to]
//! host:              a                       r
//!                    └ ready                 └ short or corrupt, send again
//! ```
//!
//! Host → board:
//! ```text
//! ┌─────┬──────┬──────┐
//! │ 'm' │ from │ to   │   light a square pair
//! └─────┴──────┴──────┘
//! 'i' invalid move   'd' draw offered   'o' power down
//! ```
//!
//! Squares travel as `rank * 8 + file + 33`, which keeps them below every
//! control byte.

#![no_std]
#![deny(unsafe_code)]

pub mod frame;
pub mod messages;
pub mod peer;
pub mod square;

pub use frame::{Frame, FrameError, FrameReceiver, ReceiveAction, RxInput, DEFAULT_MAX_REPEATS};
pub use messages::{BoardCommand, Opcode, MAX_COMMAND_LEN};
pub use peer::{BoardPeer, Blink};
pub use square::{Move, Promotion, Square, OFFSET};
