//! The authoritative move list
//!
//! The server reports every move played so far as one space-separated string
//! of coordinate tokens. The list only ever grows, so comparing token
//! prefixes tells the reconciler whether a state is new, repeated or stale.

use alloc::format;
use alloc::string::String;
use core::fmt;

use rookwire_protocol::Move;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::types::Color;

/// Token appended locally after resigning; never matches a server list
pub const FORFEIT_TOKEN: &str = "ff";

/// Space-separated list of moves
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct MoveList(String);

impl MoveList {
    pub fn new() -> Self {
        Self(String::new())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.0.split_whitespace()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens().next().is_none()
    }

    /// Number of half-moves played
    pub fn ply_count(&self) -> usize {
        self.tokens().count()
    }

    /// Last token
    pub fn last(&self) -> Option<&str> {
        self.tokens().last()
    }

    /// Last token as a move, if it parses
    pub fn last_move(&self) -> Option<Move> {
        self.last().and_then(Move::parse)
    }

    /// Side to move, from ply parity (white moves first)
    pub fn side_to_move(&self) -> Color {
        if self.ply_count() % 2 == 0 {
            Color::White
        } else {
            Color::Black
        }
    }

    /// List with `mv` appended
    pub fn with_move(&self, mv: &Move) -> Self {
        if self.0.is_empty() {
            Self(format!("{}", mv))
        } else {
            Self(format!("{} {}", self.0, mv))
        }
    }

    /// List with the forfeit marker appended
    pub fn with_forfeit(&self) -> Self {
        Self(format!("{} {}", self.0, FORFEIT_TOKEN))
    }

    /// Plies this list holds beyond `prefix`
    ///
    /// `None` if `prefix` is not a prefix of this list.
    pub fn plies_beyond(&self, prefix: &MoveList) -> Option<usize> {
        let mut ours = self.tokens();
        for token in prefix.tokens() {
            if ours.next() != Some(token) {
                return None;
            }
        }
        Some(ours.count())
    }
}

impl From<&str> for MoveList {
    fn from(moves: &str) -> Self {
        Self(moves.into())
    }
}

impl From<String> for MoveList {
    fn from(moves: String) -> Self {
        Self(moves)
    }
}

impl fmt::Display for MoveList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
