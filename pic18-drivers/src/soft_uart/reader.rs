//! Software UART receiver, main-loop side

use core::convert::Infallible;

use pic18_hal::{Clock, EdgeInterrupt, UartRx};

use super::{Error, RxChannel, RxStatus};

/// Consumer end of the receive channel
///
/// Holds its own handle on the RX interrupt line for suspend/resume.
pub struct SoftUartReader<'a, L, const N: usize> {
    line: L,
    channel: &'a RxChannel<N>,
}

impl<'a, L: EdgeInterrupt, const N: usize> SoftUartReader<'a, L, N> {
    pub fn new(line: L, channel: &'a RxChannel<N>) -> Self {
        Self { line, channel }
    }

    /// Check if at least one byte is buffered
    pub fn available(&self) -> bool {
        !self.channel.is_empty()
    }

    /// Number of buffered bytes
    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }

    /// Take the oldest buffered byte
    pub fn read_byte(&mut self) -> Option<u8> {
        self.channel.pop()
    }

    /// Fill `buf` until it is full or `timeout_ms` has elapsed
    ///
    /// Returns the number of bytes stored.
    pub fn read_bytes<C: Clock>(&mut self, buf: &mut [u8], timeout_ms: u32, clock: &C) -> usize {
        let start = clock.now_ms();
        let mut count = 0;
        while count < buf.len() {
            if let Some(byte) = self.channel.pop() {
                buf[count] = byte;
                count += 1;
            } else if clock.elapsed_ms(start) >= timeout_ms {
                break;
            }
        }
        count
    }

    /// Discard buffered bytes
    pub fn flush(&mut self) {
        self.channel.clear();
    }

    pub fn status(&self) -> RxStatus {
        self.channel.status()
    }

    /// Read and clear the error flags
    pub fn take_status(&mut self) -> RxStatus {
        self.channel.take_status()
    }

    /// Stop reception: the line interrupt is disabled and edges are ignored
    pub fn suspend(&mut self) {
        self.line.disable();
        self.channel.set_suspended(true);

        #[cfg(feature = "defmt")]
        defmt::debug!("soft uart: rx suspended");
    }

    /// Restart reception, discarding any edge seen while suspended
    pub fn resume(&mut self) {
        self.line.clear_pending();
        self.channel.set_suspended(false);
        self.line.enable();

        #[cfg(feature = "defmt")]
        defmt::debug!("soft uart: rx resumed");
    }

    pub fn is_suspended(&self) -> bool {
        self.channel.is_suspended()
    }
}

impl<L: EdgeInterrupt, const N: usize> UartRx for SoftUartReader<'_, L, N> {
    type Error = Error<Infallible>;

    /// Waits for the interrupt handler to deliver `buf.len()` bytes
    fn read_blocking(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        for slot in buf.iter_mut() {
            *slot = loop {
                if let Some(byte) = self.channel.pop() {
                    break byte;
                }
            };
        }
        Ok(buf.len())
    }
}

impl<L: EdgeInterrupt, const N: usize> embedded_io::ErrorType for SoftUartReader<'_, L, N> {
    type Error = Error<Infallible>;
}

impl<L: EdgeInterrupt, const N: usize> embedded_io::Read for SoftUartReader<'_, L, N> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if buf.is_empty() {
            return Ok(0);
        }
        while self.channel.is_empty() {}
        let mut count = 0;
        while count < buf.len() {
            match self.channel.pop() {
                Some(byte) => {
                    buf[count] = byte;
                    count += 1;
                }
                None => break,
            }
        }
        Ok(count)
    }
}
