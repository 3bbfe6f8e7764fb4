//! Software UART
//!
//! Bit-banged asynchronous serial on any pair of GPIO pins.
//!
//! Frame format: idle-high line, 1 start bit, 8 data bits LSB first, no
//! parity, 1 or 2 stop bits.
//!
//! ```text
//!  idle  start  d0  d1  d2  d3  d4  d5  d6  d7  stop  idle
//!  ‾‾‾‾‾|_____|‾‾‾|___|...                  |‾‾‾‾‾‾‾‾‾‾‾‾
//! ```
//!
//! The transmitter times bits with a [`DelayNs`](embedded_hal::delay::DelayNs)
//! and holds a critical section for each frame. The receiver runs from the
//! falling-edge interrupt of the RX line: [`SoftUartRx::on_interrupt`]
//! samples the frame in the middle of each bit and pushes the byte into an
//! [`RxChannel`], which the main loop drains through a [`SoftUartReader`].

pub mod channel;
pub mod config;
pub mod reader;
pub mod rx;
pub mod shifter;
pub mod tx;

pub use channel::{RxChannel, RxStatus};
pub use config::{BaudRate, ConfigError, SoftUartConfig};
pub use reader::SoftUartReader;
pub use rx::SoftUartRx;
pub use shifter::{RxEvent, RxShifter};
pub use tx::SoftUartTx;

/// Software UART error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// The pin driver failed
    Pin(E),
    /// Invalid configuration
    Config(ConfigError),
}

impl<E> From<ConfigError> for Error<E> {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl<E: core::fmt::Debug> embedded_io::Error for Error<E> {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            Error::Pin(_) => embedded_io::ErrorKind::Other,
            Error::Config(_) => embedded_io::ErrorKind::InvalidInput,
        }
    }
}
