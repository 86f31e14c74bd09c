//! Collaborator traits
//!
//! These traits define the interface between the game logic and the outside
//! world: the remote chess server, the physical board and game storage.

pub mod archive;
pub mod board;
pub mod remote;

pub use archive::{GameArchive, GameRecord};
pub use board::{BoardIndicator, BoardInput};
pub use remote::{EventStream, RemoteError, RemoteSession};
