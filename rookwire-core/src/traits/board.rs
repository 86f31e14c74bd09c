//! Physical board seams
//!
//! The board reports moves through [`BoardInput`] and shows squares and
//! status through [`BoardIndicator`]. In the bridge both sit on the same
//! serial link; tests replace them with scripted fakes.

use core::fmt::Debug;

use rookwire_protocol::{Move, Square};

/// Source of moves entered on the board
#[allow(async_fn_in_trait)]
pub trait BoardInput {
    /// Wait for the next entered move
    ///
    /// Returns `None` once the input source is gone. Must be cancel-safe.
    async fn next_move(&mut self) -> Option<Move>;
}

/// Board LEDs
#[allow(async_fn_in_trait)]
pub trait BoardIndicator {
    type Error: Debug;

    /// Light a square pair
    async fn show(&mut self, from: Square, to: Square) -> Result<(), Self::Error>;

    /// Signal that the last move was refused
    async fn invalid_move(&mut self) -> Result<(), Self::Error>;

    /// Signal a pending draw offer from the opponent
    async fn draw_offered(&mut self) -> Result<(), Self::Error>;

    /// Turn the board off
    async fn power_down(&mut self) -> Result<(), Self::Error>;
}
