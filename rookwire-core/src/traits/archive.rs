//! Finished game storage

use alloc::string::String;
use core::fmt::Debug;

use crate::game::{Color, GameId, MoveList, Outcome};

/// Summary of a finished game
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRecord {
    pub game_id: GameId,
    pub local: Color,
    pub opponent: String,
    pub outcome: Outcome,
    pub moves: MoveList,
}

/// Destination for exported games
#[allow(async_fn_in_trait)]
pub trait GameArchive {
    type Error: Debug;

    /// Store the PGN export of a finished game
    async fn store(&mut self, record: &GameRecord, pgn: &str) -> Result<(), Self::Error>;
}
