//! Wire opcodes and host → board commands
//!
//! Every control byte is a lowercase letter, which sits above the square
//! payload range (33..=96).

use heapless::Vec;

use crate::frame::FrameError;
use crate::square::Square;

// Board → host
pub const OP_START: u8 = b's';

// Host → board
pub const OP_ACK: u8 = b'a';
pub const OP_REPEAT: u8 = b'r';
pub const OP_SHOW: u8 = b'm';
pub const OP_INVALID: u8 = b'i';
pub const OP_DRAW: u8 = b'd';
pub const OP_POWER_DOWN: u8 = b'o';

/// Longest encoded command (`'m'` + 2 squares)
pub const MAX_COMMAND_LEN: usize = 3;

/// A single-byte protocol opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Opcode {
    /// Start-of-frame marker, repeated until acknowledged
    Start,
    /// Ready to receive the payload
    Ack,
    /// Payload short or corrupt, send it again
    Repeat,
    /// Light a square pair, followed by 2 encoded squares
    Show,
    /// Move rejected by the server
    InvalidMove,
    /// Opponent offered a draw
    DrawOffered,
    /// Turn everything off
    PowerDown,
}

impl Opcode {
    /// Parse an opcode from its wire byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            OP_START => Some(Opcode::Start),
            OP_ACK => Some(Opcode::Ack),
            OP_REPEAT => Some(Opcode::Repeat),
            OP_SHOW => Some(Opcode::Show),
            OP_INVALID => Some(Opcode::InvalidMove),
            OP_DRAW => Some(Opcode::DrawOffered),
            OP_POWER_DOWN => Some(Opcode::PowerDown),
            _ => None,
        }
    }

    /// Convert to wire byte
    pub const fn to_byte(self) -> u8 {
        match self {
            Opcode::Start => OP_START,
            Opcode::Ack => OP_ACK,
            Opcode::Repeat => OP_REPEAT,
            Opcode::Show => OP_SHOW,
            Opcode::InvalidMove => OP_INVALID,
            Opcode::DrawOffered => OP_DRAW,
            Opcode::PowerDown => OP_POWER_DOWN,
        }
    }

    /// Sent by the board rather than the host
    pub fn is_board_to_host(self) -> bool {
        matches!(self, Opcode::Start)
    }
}

/// Commands the host sends to the board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BoardCommand {
    Ack,
    Repeat,
    /// Light two squares
    Show(Square, Square),
    InvalidMove,
    DrawOffered,
    PowerDown,
}

impl BoardCommand {
    /// Leading opcode
    pub fn opcode(&self) -> Opcode {
        match self {
            BoardCommand::Ack => Opcode::Ack,
            BoardCommand::Repeat => Opcode::Repeat,
            BoardCommand::Show(..) => Opcode::Show,
            BoardCommand::InvalidMove => Opcode::InvalidMove,
            BoardCommand::DrawOffered => Opcode::DrawOffered,
            BoardCommand::PowerDown => Opcode::PowerDown,
        }
    }

    /// Encode into a byte buffer
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, FrameError> {
        let len = match self {
            BoardCommand::Show(..) => 3,
            _ => 1,
        };
        if buffer.len() < len {
            return Err(FrameError::BufferTooSmall);
        }

        buffer[0] = self.opcode().to_byte();
        if let BoardCommand::Show(from, to) = self {
            buffer[1] = from.encode();
            buffer[2] = to.encode();
        }
        Ok(len)
    }

    /// Encode into a heapless Vec
    pub fn to_bytes(&self) -> Vec<u8, MAX_COMMAND_LEN> {
        let mut buffer = [0u8; MAX_COMMAND_LEN];
        let mut bytes = Vec::new();
        // MAX_COMMAND_LEN fits every command
        if let Ok(len) = self.encode(&mut buffer) {
            let _ = bytes.extend_from_slice(&buffer[..len]);
        }
        bytes
    }
}
