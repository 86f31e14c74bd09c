//! Turn state definition

use crate::game::{Color, MoveList};

/// Reconciler states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TurnState {
    /// Local player to move; board input is awaited
    AwaitingUserMove,
    /// Opponent to move; the remote stream is awaited
    AwaitingOpponentMove,
    /// Opponent offered a draw; the board decides
    ResolvingDrawOffer,
    /// Game finished
    GameOver,
}

/// Events that trigger turn transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TurnEvent {
    /// Server echoed the local move
    UserMoveAccepted,
    /// Server reported the opponent's move
    OpponentMoved,
    /// Same move list, game still running: a draw offer
    DrawOffered,
    /// Draw offer accepted or declined
    DrawResolved,
    /// Terminal status observed
    GameEnded,
}

impl TurnState {
    /// Starting state for a game joined with `moves` already played
    pub fn initial(local: Color, moves: &MoveList) -> Self {
        if moves.side_to_move() == local {
            TurnState::AwaitingUserMove
        } else {
            TurnState::AwaitingOpponentMove
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TurnState::GameOver)
    }

    /// Process an event and return the next state
    pub fn transition(self, event: TurnEvent) -> Self {
        use TurnEvent::*;
        use TurnState::*;

        match (self, event) {
            (GameOver, _) => GameOver,
            (_, GameEnded) => GameOver,

            (AwaitingUserMove, UserMoveAccepted) => AwaitingOpponentMove,

            (AwaitingOpponentMove, OpponentMoved) => AwaitingUserMove,
            (AwaitingOpponentMove, DrawOffered) => ResolvingDrawOffer,

            (ResolvingDrawOffer, DrawResolved) => AwaitingOpponentMove,

            // Default: stay in current state
            _ => self,
        }
    }
}
