//! Host implementation of the `rookwire-hal` UART traits
//!
//! A blocking reader thread drains the serial port into an embassy-sync
//! [`Pipe`]; the async side reads from the pipe with the configured receive
//! timeout. Writes go straight to the port.

use std::io::{ErrorKind, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::pipe::Pipe;
use embassy_time::{with_timeout, Duration};
use rookwire_hal::{DataBits, Parity, StopBits, UartConfig, UartRx, UartTx};
use serialport::SerialPort;
use tracing::{debug, warn};

/// Bytes buffered between the reader thread and the async side
pub const RX_BUFFER_SIZE: usize = 256;

/// How long the reader thread blocks in one port read
const PORT_POLL: std::time::Duration = std::time::Duration::from_millis(20);

type RxPipe = Pipe<CriticalSectionRawMutex, RX_BUFFER_SIZE>;

/// Errors from the host serial port
#[derive(Debug, thiserror::Error)]
pub enum StdUartError {
    #[error("failed to open serial port {path}")]
    Open {
        path: String,
        #[source]
        source: serialport::Error,
    },
    #[error("serial port I/O error")]
    Io(#[from] std::io::Error),
    #[error("serial reader thread stopped")]
    Disconnected,
}

/// Receive half
pub struct StdUartRx {
    pipe: Arc<RxPipe>,
    closed: Arc<AtomicBool>,
    timeout: Duration,
}

/// Transmit half
pub struct StdUartTx {
    port: Box<dyn SerialPort>,
}

/// Open `path` and split it into receive and transmit halves
///
/// Spawns the reader thread.
pub fn open(path: &str, config: &UartConfig) -> Result<(StdUartRx, StdUartTx), StdUartError> {
    let open_err = |source| StdUartError::Open {
        path: path.to_string(),
        source,
    };

    let port = serialport::new(path, config.baudrate)
        .data_bits(match config.data_bits {
            DataBits::Seven => serialport::DataBits::Seven,
            DataBits::Eight => serialport::DataBits::Eight,
        })
        .parity(match config.parity {
            Parity::None => serialport::Parity::None,
            Parity::Even => serialport::Parity::Even,
            Parity::Odd => serialport::Parity::Odd,
        })
        .stop_bits(match config.stop_bits {
            StopBits::One => serialport::StopBits::One,
            StopBits::Two => serialport::StopBits::Two,
        })
        .timeout(PORT_POLL)
        .open()
        .map_err(open_err)?;
    let reader = port.try_clone().map_err(open_err)?;

    let pipe = Arc::new(RxPipe::new());
    let closed = Arc::new(AtomicBool::new(false));
    spawn_reader(reader, pipe.clone(), closed.clone())?;

    debug!(path, baud = config.baudrate, "serial port open");

    Ok((
        StdUartRx {
            pipe,
            closed,
            timeout: Duration::from_millis(config.rx_timeout_ms as u64),
        },
        StdUartTx { port },
    ))
}

fn spawn_reader(
    mut port: Box<dyn SerialPort>,
    pipe: Arc<RxPipe>,
    closed: Arc<AtomicBool>,
) -> Result<(), StdUartError> {
    thread::Builder::new()
        .name("serial-rx".into())
        .spawn(move || {
            let mut buf = [0u8; 64];
            loop {
                match port.read(&mut buf) {
                    Ok(0) => {}
                    Ok(n) => {
                        let written = pipe.try_write(&buf[..n]).unwrap_or(0);
                        if written < n {
                            warn!(dropped = n - written, "serial rx buffer full, dropping bytes");
                        }
                    }
                    Err(e) if e.kind() == ErrorKind::TimedOut => {}
                    Err(e) if e.kind() == ErrorKind::Interrupted => {}
                    Err(e) => {
                        warn!(error = %e, "serial read failed, reader stopping");
                        closed.store(true, Ordering::Release);
                        return;
                    }
                }
            }
        })?;
    Ok(())
}

impl UartRx for StdUartRx {
    type Error = StdUartError;

    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        match with_timeout(self.timeout, self.pipe.read(buf)).await {
            Ok(n) => Ok(n),
            Err(_) if self.closed.load(Ordering::Acquire) => Err(StdUartError::Disconnected),
            Err(_) => Ok(0),
        }
    }
}

impl UartTx for StdUartTx {
    type Error = StdUartError;

    async fn write_all(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.port.write_all(data)?;
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        self.port.flush()?;
        Ok(())
    }
}
