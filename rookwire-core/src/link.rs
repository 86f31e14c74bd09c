//! SerialLink: the board handshake over a UART
//!
//! The receive half is owned by one [`SerialLink`]. The transmit half is
//! shared behind an async mutex, so a multi-byte command such as
//! `'m' from to` is written under one lock and never interleaves with the
//! handshake bytes the link sends.

use core::fmt;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::Mutex;
use rookwire_hal::{UartRx, UartTx};
use rookwire_protocol::{BoardCommand, Frame, FrameError, FrameReceiver, ReceiveAction, RxInput, Square};
use tracing::{debug, trace, warn};

use crate::traits::BoardIndicator;

/// Link errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError {
    /// Too many repeat requests for one frame; the handshake restarted
    RepeatLimit,
    /// UART read failed
    Receive,
    /// UART write failed
    Transmit,
}

impl From<FrameError> for LinkError {
    fn from(err: FrameError) -> Self {
        match err {
            FrameError::RepeatLimit => LinkError::RepeatLimit,
            FrameError::BufferTooSmall => LinkError::Transmit,
        }
    }
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkError::RepeatLimit => write!(f, "repeat request limit reached"),
            LinkError::Receive => write!(f, "serial receive failed"),
            LinkError::Transmit => write!(f, "serial transmit failed"),
        }
    }
}

/// Write one command under the transmit lock
pub async fn write_command<M, Tx>(tx: &Mutex<M, Tx>, command: BoardCommand) -> Result<(), LinkError>
where
    M: RawMutex,
    Tx: UartTx,
{
    let bytes = command.to_bytes();
    let mut tx = tx.lock().await;
    tx.write_all(&bytes).await.map_err(|e| {
        warn!(error = ?e, ?command, "serial write failed");
        LinkError::Transmit
    })?;
    tx.flush().await.map_err(|e| {
        warn!(error = ?e, "serial flush failed");
        LinkError::Transmit
    })
}

/// Handshake and framing over the board UART
pub struct SerialLink<'a, M: RawMutex, Rx, Tx> {
    rx: Rx,
    tx: &'a Mutex<M, Tx>,
    receiver: FrameReceiver,
}

impl<'a, M, Rx, Tx> SerialLink<'a, M, Rx, Tx>
where
    M: RawMutex,
    Rx: UartRx,
    Tx: UartTx,
{
    /// Create a link allowing `max_repeats` repeat requests per frame
    pub fn new(rx: Rx, tx: &'a Mutex<M, Tx>, max_repeats: u8) -> Self {
        Self {
            rx,
            tx,
            receiver: FrameReceiver::new(max_repeats),
        }
    }

    /// Send a command to the board
    pub async fn send_command(&self, command: BoardCommand) -> Result<(), LinkError> {
        write_command(self.tx, command).await
    }

    /// Send a single raw byte
    pub async fn send_byte(&self, byte: u8) -> Result<(), LinkError> {
        let mut tx = self.tx.lock().await;
        tx.write_all(&[byte]).await.map_err(|e| {
            warn!(error = ?e, byte, "serial write failed");
            LinkError::Transmit
        })
    }

    /// Run the handshake until a frame arrives or the line goes quiet
    ///
    /// Returns `Ok(None)` when a read times out with no frame in progress.
    /// Corrupt or short payloads are re-requested internally; only the
    /// repeat limit surfaces, after which the handshake starts over.
    pub async fn receive_frame(&mut self) -> Result<Option<Frame>, LinkError> {
        loop {
            let input = match self.rx.read_byte().await {
                Ok(Some(byte)) => RxInput::Byte(byte),
                Ok(None) => RxInput::Timeout,
                Err(e) => {
                    warn!(error = ?e, "serial read failed");
                    self.receiver.reset();
                    return Err(LinkError::Receive);
                }
            };

            match self.receiver.feed(input)? {
                ReceiveAction::Wait => {}
                ReceiveAction::Ack => {
                    trace!("start marker, acknowledging");
                    self.send_command(BoardCommand::Ack).await?;
                }
                ReceiveAction::Repeat => {
                    trace!(attempt = self.receiver.repeats(), "payload incomplete, requesting repeat");
                    self.send_command(BoardCommand::Repeat).await?;
                }
                ReceiveAction::Frame(frame) => {
                    debug!(payload = ?frame.payload, "frame received");
                    return Ok(Some(frame));
                }
                ReceiveAction::Idle => return Ok(None),
            }
        }
    }
}

/// [`BoardIndicator`] writing LED commands through the shared transmit half
pub struct LinkIndicator<'a, M: RawMutex, Tx> {
    tx: &'a Mutex<M, Tx>,
}

impl<'a, M: RawMutex, Tx: UartTx> LinkIndicator<'a, M, Tx> {
    pub fn new(tx: &'a Mutex<M, Tx>) -> Self {
        Self { tx }
    }
}

impl<M: RawMutex, Tx: UartTx> BoardIndicator for LinkIndicator<'_, M, Tx> {
    type Error = LinkError;

    async fn show(&mut self, from: Square, to: Square) -> Result<(), LinkError> {
        write_command(self.tx, BoardCommand::Show(from, to)).await
    }

    async fn invalid_move(&mut self) -> Result<(), LinkError> {
        write_command(self.tx, BoardCommand::InvalidMove).await
    }

    async fn draw_offered(&mut self) -> Result<(), LinkError> {
        write_command(self.tx, BoardCommand::DrawOffered).await
    }

    async fn power_down(&mut self) -> Result<(), LinkError> {
        write_command(self.tx, BoardCommand::PowerDown).await
    }
}
