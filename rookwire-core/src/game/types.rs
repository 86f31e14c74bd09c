//! Colors, game ids, statuses and outcomes

use alloc::string::String;
use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Side of the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub fn opposite(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Color::White => "white",
            Color::Black => "black",
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Remote game identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct GameId(String);

impl GameId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for GameId {
    fn from(id: &str) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Game status as reported by the server
///
/// Anything other than `created` and `started` means the game is over.
/// Unrecognized names decode as [`GameStatus::UnknownFinish`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "String", into = "String"))]
pub enum GameStatus {
    Created,
    #[default]
    Started,
    Aborted,
    Mate,
    Resign,
    Stalemate,
    Timeout,
    Draw,
    OutOfTime,
    Cheat,
    NoStart,
    VariantEnd,
    UnknownFinish,
}

impl GameStatus {
    /// Wire name
    pub fn name(self) -> &'static str {
        match self {
            GameStatus::Created => "created",
            GameStatus::Started => "started",
            GameStatus::Aborted => "aborted",
            GameStatus::Mate => "mate",
            GameStatus::Resign => "resign",
            GameStatus::Stalemate => "stalemate",
            GameStatus::Timeout => "timeout",
            GameStatus::Draw => "draw",
            GameStatus::OutOfTime => "outoftime",
            GameStatus::Cheat => "cheat",
            GameStatus::NoStart => "noStart",
            GameStatus::VariantEnd => "variantEnd",
            GameStatus::UnknownFinish => "unknownFinish",
        }
    }

    /// Parse a wire name
    pub fn from_name(name: &str) -> Self {
        match name {
            "created" => GameStatus::Created,
            "started" => GameStatus::Started,
            "aborted" => GameStatus::Aborted,
            "mate" => GameStatus::Mate,
            "resign" => GameStatus::Resign,
            "stalemate" => GameStatus::Stalemate,
            "timeout" => GameStatus::Timeout,
            "draw" => GameStatus::Draw,
            "outoftime" => GameStatus::OutOfTime,
            "cheat" => GameStatus::Cheat,
            "noStart" => GameStatus::NoStart,
            "variantEnd" => GameStatus::VariantEnd,
            _ => GameStatus::UnknownFinish,
        }
    }

    /// Check whether the game is over
    pub fn is_terminal(self) -> bool {
        !matches!(self, GameStatus::Created | GameStatus::Started)
    }
}

impl From<String> for GameStatus {
    fn from(name: String) -> Self {
        Self::from_name(&name)
    }
}

impl From<GameStatus> for String {
    fn from(status: GameStatus) -> Self {
        status.name().into()
    }
}

impl fmt::Display for GameStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a finished game ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Outcome {
    pub status: GameStatus,
    /// `None` for draws, aborts and unknown endings
    pub winner: Option<Color>,
}

impl Outcome {
    /// Outcome for a game whose end was never reported
    pub fn unfinished() -> Self {
        Self {
            status: GameStatus::UnknownFinish,
            winner: None,
        }
    }

    /// Result tag from the local player's point of view
    pub fn result_for(&self, local: Color) -> &'static str {
        match self.winner {
            Some(winner) if winner == local => "won",
            Some(_) => "lost",
            None => "no winner",
        }
    }
}

/// A clock value in milliseconds, shown as `m:ss`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockReading(pub u64);

impl fmt::Display for ClockReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let seconds = self.0 / 1000;
        write!(f, "{}:{:02}", seconds / 60, seconds % 60)
    }
}
