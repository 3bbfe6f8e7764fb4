//! Software UART transmitter

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use pic18_hal::UartTx;

use super::{Error, SoftUartConfig};

/// Bit-banged transmitter on an output pin
///
/// Each frame is sent with interrupts disabled so bit timing is not
/// stretched by interrupt handlers.
pub struct SoftUartTx<TX, D> {
    pin: TX,
    delay: D,
    bit_ns: u32,
    stop_bits: u8,
}

impl<TX: OutputPin, D: DelayNs> SoftUartTx<TX, D> {
    /// Create a transmitter and drive the line to idle (high)
    pub fn new(mut pin: TX, delay: D, config: SoftUartConfig) -> Result<Self, Error<TX::Error>> {
        pin.set_high().map_err(Error::Pin)?;
        Ok(Self {
            pin,
            delay,
            bit_ns: config.bit_time_ns(),
            stop_bits: config.stop_bit_count(),
        })
    }

    /// Release the pin and delay
    pub fn free(self) -> (TX, D) {
        (self.pin, self.delay)
    }

    fn bit(&mut self, high: bool) -> Result<(), TX::Error> {
        if high {
            self.pin.set_high()?;
        } else {
            self.pin.set_low()?;
        }
        self.delay.delay_ns(self.bit_ns);
        Ok(())
    }

    fn frame(&mut self, byte: u8) -> Result<(), TX::Error> {
        self.bit(false)?;
        for i in 0..8 {
            self.bit(byte & (1 << i) != 0)?;
        }
        for _ in 0..self.stop_bits {
            self.bit(true)?;
        }
        Ok(())
    }

    /// Send one frame
    pub fn write_byte(&mut self, byte: u8) -> Result<(), Error<TX::Error>> {
        critical_section::with(|_| self.frame(byte)).map_err(Error::Pin)
    }

    pub fn write_bytes(&mut self, data: &[u8]) -> Result<(), Error<TX::Error>> {
        for &byte in data {
            self.write_byte(byte)?;
        }
        Ok(())
    }

    /// Send a string
    pub fn print(&mut self, s: &str) -> Result<(), Error<TX::Error>> {
        self.write_bytes(s.as_bytes())
    }
}

impl<TX: OutputPin, D: DelayNs> UartTx for SoftUartTx<TX, D> {
    type Error = Error<TX::Error>;

    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.write_bytes(data)
    }

    /// Frames complete before `write_byte` returns
    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl<TX: OutputPin, D: DelayNs> embedded_io::ErrorType for SoftUartTx<TX, D> {
    type Error = Error<TX::Error>;
}

impl<TX: OutputPin, D: DelayNs> embedded_io::Write for SoftUartTx<TX, D> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.write_bytes(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}
