//! InputPoller: frames to hardware events
//!
//! Each call to [`InputPoller::poll`] runs one bounded pass of the
//! handshake. A quiet line yields [`HardwareEvent::Empty`] so the owning task
//! can check its shutdown flag between passes.

use embassy_sync::blocking_mutex::raw::RawMutex;
use rookwire_hal::{UartRx, UartTx};
use rookwire_protocol::Move;
use tracing::{debug, warn};

use crate::link::{LinkError, SerialLink};

/// One poll result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HardwareEvent {
    /// A square pair entered on the board (possibly a sentinel)
    Move(Move),
    /// Nothing this pass
    Empty,
}

/// Drains a [`SerialLink`] for moves
pub struct InputPoller<'a, M: RawMutex, Rx, Tx> {
    link: SerialLink<'a, M, Rx, Tx>,
}

impl<'a, M, Rx, Tx> InputPoller<'a, M, Rx, Tx>
where
    M: RawMutex,
    Rx: UartRx,
    Tx: UartTx,
{
    pub fn new(link: SerialLink<'a, M, Rx, Tx>) -> Self {
        Self { link }
    }

    /// Poll once
    ///
    /// A repeat-limit failure is logged and reported as `Empty`; the next
    /// poll starts a fresh handshake. UART failures are returned.
    pub async fn poll(&mut self) -> Result<HardwareEvent, LinkError> {
        match self.link.receive_frame().await {
            Ok(Some(frame)) => match frame.to_move() {
                Some(mv) => {
                    debug!(%mv, sentinel = mv.is_sentinel(), "board input");
                    Ok(HardwareEvent::Move(mv))
                }
                None => Ok(HardwareEvent::Empty),
            },
            Ok(None) => Ok(HardwareEvent::Empty),
            Err(LinkError::RepeatLimit) => {
                warn!("board payload kept failing, restarting handshake");
                Ok(HardwareEvent::Empty)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{RecordingTx, ScriptedRx};
    use alloc::vec;
    use embassy_futures::block_on;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;
    use embassy_sync::mutex::Mutex;

    #[test]
    fn test_poll_move() {
        let bytes = Move::parse("d7d5").unwrap().to_bytes();
        let tx = Mutex::<NoopRawMutex, _>::new(RecordingTx::default());
        let rx = ScriptedRx::new(vec![Some(b's'), Some(bytes[0]), Some(bytes[1])]);
        let mut poller = InputPoller::new(SerialLink::new(rx, &tx, 4));

        assert_eq!(
            block_on(poller.poll()),
            Ok(HardwareEvent::Move(Move::parse("d7d5").unwrap()))
        );
        assert_eq!(block_on(poller.poll()), Ok(HardwareEvent::Empty));
    }

    #[test]
    fn test_repeat_limit_becomes_empty() {
        let tx = Mutex::<NoopRawMutex, _>::new(RecordingTx::default());
        let rx = ScriptedRx::new(vec![Some(b's'), None, None, None]);
        let mut poller = InputPoller::new(SerialLink::new(rx, &tx, 1));

        assert_eq!(block_on(poller.poll()), Ok(HardwareEvent::Empty));
        // Fresh handshake afterwards
        assert_eq!(block_on(poller.poll()), Ok(HardwareEvent::Empty));
    }

    #[test]
    fn test_uart_failure_is_returned() {
        let tx = Mutex::<NoopRawMutex, _>::new(RecordingTx::default());
        let mut poller = InputPoller::new(SerialLink::new(ScriptedRx::failing(), &tx, 1));
        assert_eq!(block_on(poller.poll()), Err(LinkError::Receive));
    }
}
