//! UART serial communication abstractions
//!
//! Reads are bounded by a receive timeout: the board protocol treats a quiet
//! line as a signal, so `read` returning zero bytes is a normal outcome.

use core::fmt::Debug;

/// UART transmitter
#[allow(async_fn_in_trait)]
pub trait UartTx {
    /// Error type for transmit operations
    type Error: Debug;

    /// Write all of `data`
    async fn write_all(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Flush any buffered data
    async fn flush(&mut self) -> Result<(), Self::Error>;
}

/// UART receiver
#[allow(async_fn_in_trait)]
pub trait UartRx {
    /// Error type for receive operations
    type Error: Debug;

    /// Read available data into `buf`
    ///
    /// Waits at most the configured receive timeout. Returns `Ok(0)` if
    /// nothing arrived in that window.
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Read a single byte, `None` on timeout
    async fn read_byte(&mut self) -> Result<Option<u8>, Self::Error> {
        let mut buf = [0u8; 1];
        match self.read(&mut buf).await? {
            0 => Ok(None),
            _ => Ok(Some(buf[0])),
        }
    }
}

/// UART configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartConfig {
    /// Baud rate in bits per second
    pub baudrate: u32,
    /// Number of data bits (typically 8)
    pub data_bits: DataBits,
    /// Parity mode
    pub parity: Parity,
    /// Number of stop bits
    pub stop_bits: StopBits,
    /// Receive timeout in milliseconds
    pub rx_timeout_ms: u32,
}

impl Default for UartConfig {
    fn default() -> Self {
        // The board controller runs its UART at 9600 8N1
        Self {
            baudrate: 9600,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            rx_timeout_ms: 100,
        }
    }
}

/// Number of data bits per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataBits {
    Seven,
    Eight,
}

/// Parity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    None,
    Even,
    Odd,
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopBits {
    One,
    Two,
}
