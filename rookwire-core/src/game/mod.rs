//! Game model shared by the reconciler and the session
//!
//! Remote events are decoded once at the boundary into these types; nothing
//! downstream inspects raw records.

pub mod events;
pub mod moves;
pub mod types;

pub use events::{Challenge, ChatLine, GameEvent, GameFull, GameRef, GameState, IncomingEvent, Player};
pub use moves::MoveList;
pub use types::{ClockReading, Color, GameId, GameStatus, Outcome};
