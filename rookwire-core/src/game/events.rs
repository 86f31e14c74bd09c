//! Events from the remote chess server
//!
//! Two streams: account-level [`IncomingEvent`]s (challenges, game starts)
//! and per-game [`GameEvent`]s. With the `serde` feature both decode from the
//! server's NDJSON records, discriminated by their `"type"` field.

use alloc::string::String;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::moves::MoveList;
use super::types::{Color, GameId, GameStatus, Outcome};

/// A player seat
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Player {
    /// Account id, empty for engine opponents
    pub id: String,
    pub name: String,
}

impl Player {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.into(),
            name: id.into(),
        }
    }

    /// Display name, falling back to the id
    pub fn label(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

/// Snapshot of a running game
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GameState {
    pub moves: MoveList,
    /// White clock, milliseconds
    pub wtime: u64,
    /// Black clock, milliseconds
    pub btime: u64,
    pub winc: u64,
    pub binc: u64,
    pub status: GameStatus,
    pub winner: Option<Color>,
    /// White has a draw offer pending
    pub wdraw: bool,
    /// Black has a draw offer pending
    pub bdraw: bool,
}

impl GameState {
    /// Started game with the given move list
    pub fn started(moves: &str) -> Self {
        Self {
            moves: moves.into(),
            ..Self::default()
        }
    }

    /// Finished game with the given move list
    pub fn finished(moves: &str, status: GameStatus, winner: Option<Color>) -> Self {
        Self {
            moves: moves.into(),
            status,
            winner,
            ..Self::default()
        }
    }

    /// Set a side's pending draw flag
    pub fn with_draw_offer(mut self, color: Color) -> Self {
        match color {
            Color::White => self.wdraw = true,
            Color::Black => self.bdraw = true,
        }
        self
    }

    /// Remaining time for a side, milliseconds
    pub fn clock(&self, color: Color) -> u64 {
        match color {
            Color::White => self.wtime,
            Color::Black => self.btime,
        }
    }

    /// Whether a side has a draw offer pending
    pub fn draw_offered_by(&self, color: Color) -> bool {
        match color {
            Color::White => self.wdraw,
            Color::Black => self.bdraw,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    pub fn outcome(&self) -> Outcome {
        Outcome {
            status: self.status,
            winner: self.winner,
        }
    }
}

/// First record of a game stream
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GameFull {
    pub id: GameId,
    pub white: Player,
    pub black: Player,
    pub state: GameState,
}

impl GameFull {
    /// Color the given account plays, if it is seated
    pub fn color_of(&self, account_id: &str) -> Option<Color> {
        if self.white.id.eq_ignore_ascii_case(account_id) {
            Some(Color::White)
        } else if self.black.id.eq_ignore_ascii_case(account_id) {
            Some(Color::Black)
        } else {
            None
        }
    }

    pub fn player(&self, color: Color) -> &Player {
        match color {
            Color::White => &self.white,
            Color::Black => &self.black,
        }
    }
}

/// In-game chat message
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ChatLine {
    pub username: String,
    pub text: String,
    pub room: String,
}

/// Per-game stream record
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type"))]
pub enum GameEvent {
    #[cfg_attr(feature = "serde", serde(rename = "gameFull"))]
    Full(GameFull),
    #[cfg_attr(feature = "serde", serde(rename = "gameState"))]
    State(GameState),
    #[cfg_attr(feature = "serde", serde(rename = "chatLine"))]
    Chat(ChatLine),
    /// Any other record type
    #[cfg_attr(feature = "serde", serde(other))]
    Unknown,
}

/// A challenge addressed to the account
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Challenge {
    pub id: String,
    pub challenger: Player,
}

/// Reference to a game that just started
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GameRef {
    pub id: GameId,
}

/// Account stream record
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "camelCase"))]
pub enum IncomingEvent {
    Challenge { challenge: Challenge },
    GameStart { game: GameRef },
    /// Any other record type
    #[cfg_attr(feature = "serde", serde(other))]
    Unknown,
}

impl IncomingEvent {
    pub fn game_start(id: &str) -> Self {
        IncomingEvent::GameStart {
            game: GameRef { id: id.into() },
        }
    }

    pub fn challenge(id: &str, challenger: &str) -> Self {
        IncomingEvent::Challenge {
            challenge: Challenge {
                id: id.into(),
                challenger: Player::new(challenger),
            },
        }
    }
}


#[cfg(all(test, feature = "serde"))]
mod serde_tests {
    use super::*;

    #[test]
    fn test_decode_game_full() {
        let json = r#"{"type":"gameFull","id":"5IrD6Gzz","rated":true,
            "white":{"id":"lovlas","name":"Lovlas","rating":1500},
            "black":{"aiLevel":3},
            "state":{"type":"gameState","moves":"e2e4 c7c5","wtime":903000,"btime":908000,
                     "winc":2000,"binc":2000,"status":"started"}}"#;
        let event: GameEvent = serde_json::from_str(json).unwrap();
        let GameEvent::Full(full) = event else {
            panic!("expected gameFull");
        };
        assert_eq!(full.id.as_str(), "5IrD6Gzz");
        assert_eq!(full.white.id, "lovlas");
        assert_eq!(full.black.id, "");
        assert_eq!(full.state.moves.ply_count(), 2);
        assert_eq!(full.state.clock(Color::White), 903000);
    }

    #[test]
    fn test_decode_game_state() {
        let json = r#"{"type":"gameState","moves":"e2e4 c7c5 f2f4","wtime":7598040,
            "btime":8395220,"winc":10000,"binc":10000,"status":"mate","winner":"black",
            "wdraw":false,"bdraw":true}"#;
        let event: GameEvent = serde_json::from_str(json).unwrap();
        let GameEvent::State(state) = event else {
            panic!("expected gameState");
        };
        assert_eq!(state.status, GameStatus::Mate);
        assert_eq!(state.winner, Some(Color::Black));
        assert!(state.bdraw);
    }

    #[test]
    fn test_decode_chat_and_unknown() {
        let chat: GameEvent = serde_json::from_str(
            r#"{"type":"chatLine","username":"thibault","text":"gg","room":"player"}"#,
        )
        .unwrap();
        assert!(matches!(chat, GameEvent::Chat(_)));

        let gone: GameEvent =
            serde_json::from_str(r#"{"type":"opponentGone","gone":true}"#).unwrap();
        assert_eq!(gone, GameEvent::Unknown);
    }

    #[test]
    fn test_decode_incoming() {
        let start: IncomingEvent = serde_json::from_str(
            r#"{"type":"gameStart","game":{"id":"1lsvP62l","color":"black"}}"#,
        )
        .unwrap();
        assert_eq!(start, IncomingEvent::game_start("1lsvP62l"));

        let challenge: IncomingEvent = serde_json::from_str(
            r#"{"type":"challenge","challenge":{"id":"7pGLxJ4F","status":"created",
                "challenger":{"id":"lovlas","name":"Lovlas"}}}"#,
        )
        .unwrap();
        let IncomingEvent::Challenge { challenge } = challenge else {
            panic!("expected challenge");
        };
        assert_eq!(challenge.id, "7pGLxJ4F");
        assert_eq!(challenge.challenger.label(), "Lovlas");

        let finish: IncomingEvent =
            serde_json::from_str(r#"{"type":"gameFinish","game":{"id":"x"}}"#).unwrap();
        assert_eq!(finish, IncomingEvent::Unknown);
    }

    #[test]
    fn test_unknown_status() {
        let state: GameState =
            serde_json::from_str(r#"{"moves":"","status":"insufficientMaterialClaim"}"#).unwrap();
        assert_eq!(state.status, GameStatus::UnknownFinish);
    }
}
