//! Board input task
//!
//! Polls the serial link and forwards every entered move to the session.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::{Duration, Timer};
use rookwire_core::poller::{HardwareEvent, InputPoller};
use rookwire_hal::{UartRx, UartTx};
use tracing::{info, warn};

use crate::channels::{HARDWARE_EVENTS, INPUT_CLOSED, SHUTDOWN};

/// Pause after a link error before polling again
const ERROR_BACKOFF: Duration = Duration::from_millis(500);

/// Consecutive link errors before the board is considered gone
const MAX_LINK_ERRORS: u8 = 10;

pub async fn input_task<M, Rx, Tx>(mut poller: InputPoller<'_, M, Rx, Tx>)
where
    M: RawMutex,
    Rx: UartRx,
    Tx: UartTx,
{
    info!("input task started");
    let mut errors = 0u8;

    while !SHUTDOWN.is_set() {
        match poller.poll().await {
            Ok(HardwareEvent::Move(mv)) => {
                errors = 0;
                if HARDWARE_EVENTS.try_send(mv).is_err() {
                    warn!(%mv, "input channel full, dropping move");
                }
            }
            Ok(HardwareEvent::Empty) => errors = 0,
            Err(e) => {
                errors += 1;
                warn!(error = %e, errors, "serial link error");
                if errors >= MAX_LINK_ERRORS {
                    warn!("board link lost, closing input");
                    INPUT_CLOSED.signal(());
                    break;
                }
                Timer::after(ERROR_BACKOFF).await;
            }
        }
    }

    info!("input task stopped");
}
