//! Session task
//!
//! Runs the idle menu and games until the board powers down, then tells the
//! input task to stop.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::Mutex;
use rookwire_core::config::SessionConfig;
use rookwire_core::link::LinkIndicator;
use rookwire_core::session::GameSession;
use rookwire_core::traits::{GameArchive, RemoteSession};
use rookwire_hal::UartTx;
use tracing::info;

use crate::channels::{ChannelInput, SHUTDOWN};
use crate::error::BridgeError;

pub async fn session_task<M, Tx, R, A>(
    remote: &R,
    tx: &Mutex<M, Tx>,
    archive: &mut A,
    config: &SessionConfig,
) -> Result<(), BridgeError>
where
    M: RawMutex,
    Tx: UartTx,
    R: RemoteSession,
    A: GameArchive,
{
    info!(account = %config.account_id, "session task started");
    let mut input = ChannelInput;
    let mut indicator = LinkIndicator::new(tx);

    let result = GameSession::new(remote, &mut input, &mut indicator, archive, config)
        .run()
        .await;

    SHUTDOWN.set();
    info!("session task stopped");
    result.map_err(BridgeError::Session)
}
