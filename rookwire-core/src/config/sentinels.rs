//! Sentinel table
//!
//! Pressing the same square twice sends a move whose `from == to`. Such a
//! move is never played; it is a command. Which command depends on context:
//! during a game the rank decides (resign or draw), while idle the square
//! selects a menu entry.

use alloc::vec;
use alloc::vec::Vec;

use rookwire_protocol::{Move, Square};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// What an idle sentinel starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum MenuAction {
    /// Post a public seek
    Seek,
    /// Wait for an incoming challenge and accept it
    AcceptChallenge,
    /// Challenge the configured opponent
    Challenge,
}

/// A square bound to a menu action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MenuBinding {
    pub square: Square,
    pub action: MenuAction,
}

/// Board input during a game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GameInput {
    Move(Move),
    Resign,
    /// Offer a draw, or accept one when prompted
    Draw,
}

/// Board input while no game is running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IdleInput {
    Menu(MenuAction),
    /// Any real move: power down and stop
    Quit,
}

/// Configurable sentinel classification
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SentinelMap {
    /// Ranks (1-8) whose sentinel resigns
    pub resign_ranks: Vec<u8>,
    /// Ranks (1-8) whose sentinel offers or accepts a draw
    pub draw_ranks: Vec<u8>,
    pub menu: Vec<MenuBinding>,
    /// Action for idle sentinels on unbound squares
    pub idle_default: MenuAction,
}

impl Default for SentinelMap {
    fn default() -> Self {
        Self {
            resign_ranks: vec![1, 8],
            draw_ranks: vec![2, 7],
            menu: vec![
                MenuBinding {
                    square: Square::at(7, 0),
                    action: MenuAction::Seek,
                },
                MenuBinding {
                    square: Square::at(7, 1),
                    action: MenuAction::AcceptChallenge,
                },
                MenuBinding {
                    square: Square::at(7, 2),
                    action: MenuAction::Challenge,
                },
            ],
            idle_default: MenuAction::Seek,
        }
    }
}

impl SentinelMap {
    /// Classify input received during a game
    ///
    /// Sentinels on ranks with no binding pass through as moves; the server
    /// rejects them like any other illegal move.
    pub fn classify_in_game(&self, mv: &Move) -> GameInput {
        if !mv.is_sentinel() {
            return GameInput::Move(*mv);
        }
        let rank = mv.from.rank_number();
        if self.resign_ranks.contains(&rank) {
            GameInput::Resign
        } else if self.draw_ranks.contains(&rank) {
            GameInput::Draw
        } else {
            GameInput::Move(*mv)
        }
    }

    /// Check for a draw sentinel (used to accept a pending offer)
    pub fn is_draw(&self, mv: &Move) -> bool {
        self.classify_in_game(mv) == GameInput::Draw
    }

    /// Classify input received while idle
    pub fn classify_idle(&self, mv: &Move) -> IdleInput {
        if !mv.is_sentinel() {
            return IdleInput::Quit;
        }
        let action = self
            .menu
            .iter()
            .find(|binding| binding.square == mv.from)
            .map(|binding| binding.action)
            .unwrap_or(self.idle_default);
        IdleInput::Menu(action)
    }
}
