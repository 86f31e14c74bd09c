//! Remote chess server session

use alloc::string::String;
use core::fmt;

use rookwire_protocol::Move;

use crate::config::{ChallengeOptions, SeekConfig};
use crate::game::{GameEvent, GameId, IncomingEvent};

/// Errors reported by the remote session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RemoteError {
    /// The server refused the move
    InvalidMove,
    /// The server refused some other request
    Rejected,
    /// No such game or challenge
    NotFound,
    /// Connection or protocol failure
    Transport,
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteError::InvalidMove => write!(f, "move rejected"),
            RemoteError::Rejected => write!(f, "request rejected"),
            RemoteError::NotFound => write!(f, "not found"),
            RemoteError::Transport => write!(f, "transport failure"),
        }
    }
}

/// An asynchronous event stream
///
/// `next` must be cancel-safe: the reconciler races it against board input
/// and drops whichever future loses.
#[allow(async_fn_in_trait)]
pub trait EventStream {
    type Item;

    /// Next event, `None` if nothing arrived (closed or idle stream)
    async fn next(&mut self) -> Option<Self::Item>;
}

/// Remote chess server, as seen by one account
#[allow(async_fn_in_trait)]
pub trait RemoteSession {
    type IncomingStream: EventStream<Item = IncomingEvent>;
    type GameStream: EventStream<Item = GameEvent>;

    /// Account-level events: challenges and game starts
    async fn stream_incoming_events(&self) -> Result<Self::IncomingStream, RemoteError>;

    /// Events of one game, starting with its full snapshot
    async fn stream_game_state(&self, game_id: &GameId) -> Result<Self::GameStream, RemoteError>;

    /// Play a move; fails with [`RemoteError::InvalidMove`] if illegal
    async fn make_move(&self, game_id: &GameId, mv: &Move) -> Result<(), RemoteError>;

    async fn resign(&self, game_id: &GameId) -> Result<(), RemoteError>;

    async fn offer_draw(&self, game_id: &GameId) -> Result<(), RemoteError>;

    async fn accept_draw(&self, game_id: &GameId) -> Result<(), RemoteError>;

    async fn decline_draw(&self, game_id: &GameId) -> Result<(), RemoteError>;

    /// Post a public seek
    async fn seek(&self, seek: &SeekConfig) -> Result<(), RemoteError>;

    async fn create_challenge(&self, user: &str, options: &ChallengeOptions) -> Result<(), RemoteError>;

    async fn accept_challenge(&self, challenge_id: &str) -> Result<(), RemoteError>;

    /// PGN text of a game
    async fn export_game(&self, game_id: &GameId) -> Result<String, RemoteError>;
}
