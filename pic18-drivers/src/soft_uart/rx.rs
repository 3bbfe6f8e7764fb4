//! Software UART receiver, interrupt side

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::InputPin;
use pic18_hal::{Edge, EdgeInterrupt};

use super::{Error, RxChannel, RxEvent, RxShifter, SoftUartConfig, SoftUartReader};

/// Edge-triggered receiver
///
/// Owns the RX pin, a delay and the external interrupt line wired to the
/// same pin. Call [`SoftUartRx::on_interrupt`] from the interrupt handler;
/// it samples a whole frame before returning.
pub struct SoftUartRx<'a, RX, D, L, const N: usize> {
    pin: RX,
    delay: D,
    line: L,
    channel: &'a RxChannel<N>,
    shifter: RxShifter,
    bit_ns: u32,
}

impl<'a, RX, D, L, const N: usize> SoftUartRx<'a, RX, D, L, N>
where
    RX: InputPin,
    D: DelayNs,
    L: EdgeInterrupt,
{
    /// Create a receiver and arm the line for a falling-edge start bit
    pub fn new(
        pin: RX,
        delay: D,
        mut line: L,
        channel: &'a RxChannel<N>,
        config: SoftUartConfig,
    ) -> Result<Self, Error<RX::Error>> {
        config.validate_rx()?;

        line.disable();
        line.set_edge(Edge::Falling);
        line.clear_pending();
        channel.set_suspended(false);
        line.enable();

        Ok(Self {
            pin,
            delay,
            line,
            channel,
            shifter: RxShifter::new(),
            bit_ns: config.bit_time_ns(),
        })
    }

    /// Main-loop handle on the same channel and line
    pub fn reader(&self) -> SoftUartReader<'a, L, N>
    where
        L: Clone,
    {
        SoftUartReader::new(self.line.clone(), self.channel)
    }

    pub fn channel(&self) -> &'a RxChannel<N> {
        self.channel
    }

    /// Service the RX line interrupt
    ///
    /// Returns `None` when the line flag was not set or reception is
    /// suspended, otherwise the outcome of the frame.
    pub fn on_interrupt(&mut self) -> Result<Option<RxEvent>, Error<RX::Error>> {
        if !self.line.is_pending() {
            return Ok(None);
        }
        self.line.clear_pending();

        if self.channel.is_suspended() {
            return Ok(None);
        }

        let result = self.receive_frame();
        // Falling edges inside the frame set the flag again
        self.line.clear_pending();

        let event = result.map_err(Error::Pin)?;
        match event {
            RxEvent::Byte(byte) => {
                if !self.channel.push(byte) {
                    #[cfg(feature = "defmt")]
                    defmt::warn!("soft uart: rx buffer full, dropped {=u8:#x}", byte);
                }
            }
            RxEvent::FramingError => {
                #[cfg(feature = "defmt")]
                defmt::warn!("soft uart: framing error");
                self.channel.set_framing_error();
            }
            RxEvent::FalseStart => {}
        }
        Ok(Some(event))
    }

    fn receive_frame(&mut self) -> Result<RxEvent, RX::Error> {
        self.shifter.begin();
        self.delay.delay_ns(self.bit_ns / 2);
        loop {
            let high = match self.pin.is_high() {
                Ok(high) => high,
                Err(e) => {
                    self.shifter.reset();
                    return Err(e);
                }
            };
            if let Some(event) = self.shifter.sample(high) {
                return Ok(event);
            }
            self.delay.delay_ns(self.bit_ns);
        }
    }
}
