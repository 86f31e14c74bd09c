//! Host side of the board handshake.
//!
//! Exchange for one move:
//! - board repeats START (`'s'`) until the host answers ACK (`'a'`)
//! - board sends the 2-byte payload (`from`, `to`, see [`crate::square`])
//! - if the payload arrives short or outside the square range the host sends
//!   REPEAT (`'r'`) and the board resends both bytes
//!
//! [`FrameReceiver`] is a pure state machine. It is fed one byte or one read
//! timeout at a time and tells the caller which byte (if any) to transmit.

use heapless::Vec;

use crate::messages::Opcode;
use crate::square::Move;

/// Payload length of a move frame
pub const PAYLOAD_LEN: usize = 2;

/// Repeat requests allowed per frame before giving up
pub const DEFAULT_MAX_REPEATS: u8 = 32;

/// Errors raised by the handshake or by command encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Too many corrupted attempts for one frame
    RepeatLimit,
    /// Buffer too small for encoding
    BufferTooSmall,
}

impl core::fmt::Display for FrameError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            FrameError::RepeatLimit => write!(f, "repeat request limit reached"),
            FrameError::BufferTooSmall => write!(f, "buffer too small"),
        }
    }
}

/// A validated 2-byte payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Frame {
    pub payload: [u8; PAYLOAD_LEN],
}

impl Frame {
    /// Build a frame from a move
    pub const fn from_move(mv: &Move) -> Self {
        Self {
            payload: mv.to_bytes(),
        }
    }

    /// Decode the payload into a move
    ///
    /// Always `Some` for frames produced by [`FrameReceiver`].
    pub const fn to_move(&self) -> Option<Move> {
        Move::from_bytes(self.payload)
    }
}

/// One unit of receive-side input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RxInput {
    Byte(u8),
    /// The read timed out with nothing received
    Timeout,
}

/// What the caller should do after feeding an input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReceiveAction {
    /// Keep reading
    Wait,
    /// Transmit ACK, then keep reading
    Ack,
    /// Transmit REPEAT, then keep reading
    Repeat,
    /// A complete frame
    Frame(Frame),
    /// No frame in progress and the line is quiet
    Idle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReceiveState {
    /// Waiting for START
    WaitingForStart,
    /// ACK sent, draining the START stream
    AwaitSync,
    /// Collecting payload bytes
    ReadingPayload,
}

/// Handshake state machine for incoming move frames
#[derive(Debug, Clone)]
pub struct FrameReceiver {
    state: ReceiveState,
    buffer: Vec<u8, PAYLOAD_LEN>,
    repeats: u8,
    max_repeats: u8,
}

impl Default for FrameReceiver {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_REPEATS)
    }
}

impl FrameReceiver {
    /// Create a receiver allowing `max_repeats` repeat requests per frame
    pub fn new(max_repeats: u8) -> Self {
        Self {
            state: ReceiveState::WaitingForStart,
            buffer: Vec::new(),
            repeats: 0,
            max_repeats,
        }
    }

    /// Reset to waiting for START
    pub fn reset(&mut self) {
        self.state = ReceiveState::WaitingForStart;
        self.buffer.clear();
        self.repeats = 0;
    }

    /// True once START has been seen and no frame has completed yet
    pub fn in_progress(&self) -> bool {
        self.state != ReceiveState::WaitingForStart
    }

    /// Repeat requests issued for the frame in progress
    pub fn repeats(&self) -> u8 {
        self.repeats
    }

    /// Feed one byte or timeout
    pub fn feed(&mut self, input: RxInput) -> Result<ReceiveAction, FrameError> {
        match self.state {
            ReceiveState::WaitingForStart => match input {
                RxInput::Byte(byte) if byte == Opcode::Start.to_byte() => {
                    self.state = ReceiveState::AwaitSync;
                    Ok(ReceiveAction::Ack)
                }
                // Line noise and stray bytes are ignored while idle
                RxInput::Byte(_) => Ok(ReceiveAction::Wait),
                RxInput::Timeout => Ok(ReceiveAction::Idle),
            },
            ReceiveState::AwaitSync => match input {
                RxInput::Byte(byte) if byte == Opcode::Start.to_byte() => Ok(ReceiveAction::Wait),
                RxInput::Byte(byte) => {
                    self.state = ReceiveState::ReadingPayload;
                    self.push(byte)
                }
                RxInput::Timeout => {
                    self.state = ReceiveState::ReadingPayload;
                    Ok(ReceiveAction::Wait)
                }
            },
            ReceiveState::ReadingPayload => match input {
                RxInput::Byte(byte) => self.push(byte),
                RxInput::Timeout => self.request_repeat(),
            },
        }
    }

    /// Feed several bytes, stopping at the first action that needs the caller
    pub fn feed_bytes(&mut self, bytes: &[u8]) -> Result<ReceiveAction, FrameError> {
        for &byte in bytes {
            match self.feed(RxInput::Byte(byte))? {
                ReceiveAction::Wait => {}
                action => return Ok(action),
            }
        }
        Ok(ReceiveAction::Wait)
    }

    fn push(&mut self, byte: u8) -> Result<ReceiveAction, FrameError> {
        // Capacity is PAYLOAD_LEN and the buffer is drained when full
        let _ = self.buffer.push(byte);
        if self.buffer.len() < PAYLOAD_LEN {
            return Ok(ReceiveAction::Wait);
        }

        let payload = [self.buffer[0], self.buffer[1]];
        if Move::from_bytes(payload).is_none() {
            return self.request_repeat();
        }

        self.reset();
        Ok(ReceiveAction::Frame(Frame { payload }))
    }

    fn request_repeat(&mut self) -> Result<ReceiveAction, FrameError> {
        if self.repeats >= self.max_repeats {
            self.reset();
            return Err(FrameError::RepeatLimit);
        }
        self.repeats += 1;
        self.buffer.clear();
        self.state = ReceiveState::ReadingPayload;
        Ok(ReceiveAction::Repeat)
    }
}
