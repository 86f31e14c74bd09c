//! Configuration type definitions

use alloc::string::String;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::sentinels::SentinelMap;

/// Everything a [`crate::session::GameSession`] needs besides its collaborators
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SessionConfig {
    /// Local account id, compared against the white player to pick a color
    pub account_id: String,
    pub seek: SeekConfig,
    /// Opponent to challenge from the idle menu
    pub challenge: Option<ChallengeConfig>,
    pub sentinels: SentinelMap,
    pub limits: RetryLimits,
}

/// Parameters of a public seek
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SeekConfig {
    /// Initial clock, minutes
    pub minutes: u32,
    /// Increment per move, seconds
    pub increment: u32,
    pub rated: bool,
}

impl Default for SeekConfig {
    fn default() -> Self {
        Self {
            minutes: 30,
            increment: 0,
            rated: true,
        }
    }
}

/// Color requested when issuing a challenge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ChallengeColor {
    #[default]
    Random,
    White,
    Black,
}

/// Clock and color of an outgoing challenge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ChallengeOptions {
    /// Initial clock, seconds
    pub clock_limit: u32,
    /// Increment per move, seconds
    pub clock_increment: u32,
    pub rated: bool,
    pub color: ChallengeColor,
}

impl Default for ChallengeOptions {
    fn default() -> Self {
        Self {
            clock_limit: 30 * 60,
            clock_increment: 0,
            rated: false,
            color: ChallengeColor::Random,
        }
    }
}

/// Who to challenge and how
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ChallengeConfig {
    pub opponent: String,
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub options: ChallengeOptions,
}

/// Bounds on every retry loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RetryLimits {
    /// Repeat requests per frame before the handshake restarts
    pub max_repeat_requests: u8,
    /// Rejected moves in one turn before the turn is re-entered
    pub max_invalid_moves: u8,
    /// Consecutive empty reads from a remote stream before giving up on it
    pub max_stream_gaps: u8,
}

impl Default for RetryLimits {
    fn default() -> Self {
        Self {
            max_repeat_requests: rookwire_protocol::DEFAULT_MAX_REPEATS,
            max_invalid_moves: 8,
            max_stream_gaps: 3,
        }
    }
}
