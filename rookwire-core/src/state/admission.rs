//! State admission rules
//!
//! The server stream interleaves real moves with draw-flag updates, echoes
//! of the local player's own actions and chat. These functions decide, given
//! the move list the reconciler expects, what a received state means.

use crate::game::{Color, GameState, MoveList};

/// Meaning of a state received while the opponent is to move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OpponentVerdict {
    /// Move list grew by `plies` (normally one)
    Advance { plies: usize },
    /// Same list, still running: the opponent offers a draw
    DrawOffer,
    /// Terminal status
    Ended,
    /// Stale, or an echo of our own draw offer
    Discard,
}

/// Meaning of a state received after submitting the local move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PostMoveVerdict {
    /// The echo of our move
    Accepted,
    /// Already past our move; keep it for the opponent wait
    Ahead,
    Ended,
    /// Anything else, including draw offers made during our turn
    Discard,
}

/// Classify a state while waiting for the opponent
pub fn admit_opponent_state(expected: &MoveList, state: &GameState, local: Color) -> OpponentVerdict {
    if state.is_terminal() {
        return OpponentVerdict::Ended;
    }
    match state.moves.plies_beyond(expected) {
        Some(0) => {
            let ours = state.draw_offered_by(local);
            let theirs = state.draw_offered_by(local.opposite());
            if ours && !theirs {
                OpponentVerdict::Discard
            } else {
                OpponentVerdict::DrawOffer
            }
        }
        Some(plies) => OpponentVerdict::Advance { plies },
        None => OpponentVerdict::Discard,
    }
}

/// Classify a state while waiting for the echo of `target`
pub fn admit_post_move_state(target: &MoveList, state: &GameState) -> PostMoveVerdict {
    if state.is_terminal() {
        return PostMoveVerdict::Ended;
    }
    match state.moves.plies_beyond(target) {
        Some(0) => PostMoveVerdict::Accepted,
        Some(_) => PostMoveVerdict::Ahead,
        None => PostMoveVerdict::Discard,
    }
}
