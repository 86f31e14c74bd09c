//! Inter-task communication
//!
//! The input task forwards board moves through [`HARDWARE_EVENTS`]; the
//! session task consumes them via [`ChannelInput`].

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;

use rookwire_core::session::GameFlag;
use rookwire_core::traits::BoardInput;
use rookwire_protocol::Move;

/// Channel capacity for board moves
const HARDWARE_CHANNEL_SIZE: usize = 4;

/// Moves entered on the board
pub static HARDWARE_EVENTS: Channel<CriticalSectionRawMutex, Move, HARDWARE_CHANNEL_SIZE> =
    Channel::new();

/// Set by the session task on exit; the input task stops at its next quiet read
pub static SHUTDOWN: GameFlag = GameFlag::new();

/// Raised by the input task when the serial link is gone
pub static INPUT_CLOSED: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// [`BoardInput`] fed by the input task
pub struct ChannelInput;

impl BoardInput for ChannelInput {
    async fn next_move(&mut self) -> Option<Move> {
        match select(HARDWARE_EVENTS.receive(), INPUT_CLOSED.wait()).await {
            Either::First(mv) => Some(mv),
            Either::Second(()) => {
                // Stay closed for later calls
                INPUT_CLOSED.signal(());
                None
            }
        }
    }
}
