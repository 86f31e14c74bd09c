//! Turn state machine
//!
//! Whose move it is, as a pure function of the current state and an event,
//! plus the rules that decide which remote states count as events at all.

pub mod admission;
pub mod machine;

pub use admission::{admit_opponent_state, admit_post_move_state, OpponentVerdict, PostMoveVerdict};
pub use machine::{TurnEvent, TurnState};
