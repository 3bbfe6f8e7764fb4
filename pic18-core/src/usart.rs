//! Hardware USART driver
//!
//! Polled driver for the PIC18 addressable USART: asynchronous or
//! synchronous operation, 8 or 9 data bits, baud rate generator set up from
//! the oscillator frequency.
//!
//! # Baud rate
//!
//! ```text
//!            Fosc
//! SPBRG = ---------- - 1      q = 64 (async, low speed)
//!          q * baud               16 (async, high speed)
//!                                  4 (synchronous)
//! ```

use embedded_io::ErrorKind;
use pic18_hal::uart::{DataBits, UartRx, UartTx};
use pic18_hal::{Clock, RegisterBus};

use crate::regs::{self, pir1, rcsta, txsta};

/// USART errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UsartError {
    /// Baud rate of zero requested
    InvalidBaud,
    /// Baud rate not reachable with an 8-bit generator at this oscillator
    BaudOutOfRange,
    /// Stop bit of the received byte was low
    Framing,
    /// Receive FIFO overflowed; reception was restarted
    Overrun,
}

impl embedded_io::Error for UsartError {
    fn kind(&self) -> ErrorKind {
        match self {
            UsartError::InvalidBaud | UsartError::BaudOutOfRange => ErrorKind::InvalidInput,
            UsartError::Framing => ErrorKind::InvalidData,
            UsartError::Overrun => ErrorKind::Other,
        }
    }
}

/// Operating mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UsartMode {
    /// Asynchronous (UART)
    Asynchronous,
    /// Synchronous, clock generated from the baud rate generator
    SynchronousMaster,
    /// Synchronous, clock from the external CK pin
    SynchronousSlave,
}

/// Asynchronous baud rate generator speed (BRGH)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BaudSpeed {
    /// Fosc / (64 * (SPBRG + 1))
    Low,
    /// Fosc / (16 * (SPBRG + 1))
    High,
}

/// TXSTA/RCSTA settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UsartConfig {
    pub mode: UsartMode,
    /// Baud rate generator speed, asynchronous mode only
    pub speed: BaudSpeed,
    /// Transmit data width
    pub tx_bits: DataBits,
    /// Receive data width
    pub rx_bits: DataBits,
    /// Transmitter enable (TXEN)
    pub tx_enable: bool,
    /// Continuous receive enable (CREN)
    pub rx_enable: bool,
    /// Single receive, synchronous master only (SREN)
    pub single_rx: bool,
    /// Address detection, asynchronous 9-bit only (ADDEN)
    pub address_detect: bool,
    /// Serial port enable (SPEN)
    pub enable: bool,
}

impl Default for UsartConfig {
    fn default() -> Self {
        Self {
            mode: UsartMode::Asynchronous,
            speed: BaudSpeed::High,
            tx_bits: DataBits::Eight,
            rx_bits: DataBits::Eight,
            tx_enable: true,
            rx_enable: true,
            single_rx: false,
            address_detect: false,
            enable: true,
        }
    }
}

impl UsartConfig {
    /// TXSTA value for this configuration
    pub fn txsta(&self) -> u8 {
        let mut value = 0;
        match self.mode {
            UsartMode::Asynchronous => {
                if self.speed == BaudSpeed::High {
                    value |= txsta::BRGH;
                }
            }
            UsartMode::SynchronousMaster => value |= txsta::SYNC | txsta::CSRC,
            UsartMode::SynchronousSlave => value |= txsta::SYNC,
        }
        if self.tx_bits == DataBits::Nine {
            value |= txsta::TX9;
        }
        if self.tx_enable {
            value |= txsta::TXEN;
        }
        value
    }

    /// RCSTA value for this configuration
    pub fn rcsta(&self) -> u8 {
        let mut value = 0;
        if self.enable {
            value |= rcsta::SPEN;
        }
        if self.rx_bits == DataBits::Nine {
            value |= rcsta::RX9;
        }
        if self.single_rx && self.mode == UsartMode::SynchronousMaster {
            value |= rcsta::SREN;
        }
        if self.rx_enable {
            value |= rcsta::CREN;
        }
        if self.address_detect && self.mode == UsartMode::Asynchronous {
            value |= rcsta::ADDEN;
        }
        value
    }

    /// Baud rate generator divisor `q` for this configuration
    pub fn brg_divisor(&self) -> u32 {
        brg_divisor(self.txsta())
    }
}

fn brg_divisor(txsta_value: u8) -> u32 {
    if txsta_value & txsta::SYNC != 0 {
        4
    } else if txsta_value & txsta::BRGH != 0 {
        16
    } else {
        64
    }
}

/// SPBRG value for `baud` (truncating, like the datasheet formula)
pub fn compute_brg(osc_hz: u32, baud: u32, divisor: u32) -> Result<u8, UsartError> {
    if baud == 0 {
        return Err(UsartError::InvalidBaud);
    }
    let ratio = osc_hz as u64 / (divisor as u64 * baud as u64);
    if ratio == 0 || ratio > 256 {
        return Err(UsartError::BaudOutOfRange);
    }
    Ok((ratio - 1) as u8)
}

/// Baud rate produced by `brg`
pub fn actual_baud(osc_hz: u32, brg: u8, divisor: u32) -> u32 {
    osc_hz / (divisor * (brg as u32 + 1))
}

/// Hardware USART
pub struct Usart<B> {
    bus: B,
    /// Receive error held back by a partial `embedded_io` read
    deferred_error: Option<UsartError>,
}

impl<B: RegisterBus> Usart<B> {
    pub fn new(bus: B) -> Self {
        Self {
            bus,
            deferred_error: None,
        }
    }

    /// Apply `config` to TXSTA and RCSTA
    ///
    /// Read-only status bits (TRMT, FERR, OERR) are left untouched.
    pub fn init(&mut self, config: &UsartConfig) {
        let tx = config.txsta();
        let rx = config.rcsta();
        self.bus
            .modify(regs::TXSTA, |v| (v & txsta::TRMT) | (tx & !txsta::TRMT));
        self.bus.modify(regs::RCSTA, |v| {
            (v & (rcsta::FERR | rcsta::OERR)) | (rx & !(rcsta::FERR | rcsta::OERR))
        });
    }

    /// Asynchronous 8-bit high-speed setup, transmitter and continuous
    /// receive on (TXSTA = 0x24, RCSTA = 0x90)
    pub fn async_init(&mut self, brg: u8) {
        self.init(&UsartConfig::default());
        self.set_brg(brg);
    }

    /// Load the baud rate generator
    pub fn set_brg(&mut self, brg: u8) {
        self.bus.write(regs::SPBRG, brg);
    }

    pub fn brg(&self) -> u8 {
        self.bus.read(regs::SPBRG)
    }

    /// Compute and load SPBRG for `baud` in the current mode
    ///
    /// Returns the value written.
    pub fn set_baud_rate(&mut self, osc_hz: u32, baud: u32) -> Result<u8, UsartError> {
        let divisor = brg_divisor(self.bus.read(regs::TXSTA));
        let brg = compute_brg(osc_hz, baud, divisor).inspect_err(|_e| {
            #[cfg(feature = "defmt")]
            defmt::warn!("usart: {} baud unreachable at {} Hz", baud, osc_hz);
        })?;
        self.set_brg(brg);
        Ok(brg)
    }

    /// Enable the serial port (SPEN)
    pub fn enable(&mut self) {
        self.bus.set_bits(regs::RCSTA, rcsta::SPEN);
    }

    pub fn disable(&mut self) {
        self.bus.clear_bits(regs::RCSTA, rcsta::SPEN);
    }

    pub fn tx_enable(&mut self) {
        self.bus.set_bits(regs::TXSTA, txsta::TXEN);
    }

    pub fn tx_disable(&mut self) {
        self.bus.clear_bits(regs::TXSTA, txsta::TXEN);
    }

    /// Enable continuous reception (CREN)
    pub fn rx_enable(&mut self) {
        self.bus.set_bits(regs::RCSTA, rcsta::CREN);
    }

    pub fn rx_disable(&mut self) {
        self.bus.clear_bits(regs::RCSTA, rcsta::CREN);
    }

    /// Check if a received byte is waiting (RCIF)
    pub fn rx_available(&self) -> bool {
        self.bus.any_set(regs::PIR1, pir1::RC)
    }

    /// Check if the transmit shift register is empty
    pub fn tx_idle(&self) -> bool {
        self.bus.any_set(regs::TXSTA, txsta::TRMT)
    }

    fn wait_tx_idle(&self) {
        while !self.tx_idle() {}
    }

    /// Send one byte, waiting for the previous one to leave the shift register
    pub fn transmit_byte(&mut self, byte: u8) {
        self.wait_tx_idle();
        self.bus.write(regs::TXREG, byte);
    }

    /// Send one 9-bit word; bit 8 goes out through TX9D
    pub fn transmit_byte9(&mut self, word: u16) {
        self.wait_tx_idle();
        if word & 0x100 != 0 {
            self.bus.set_bits(regs::TXSTA, txsta::TX9D);
        } else {
            self.bus.clear_bits(regs::TXSTA, txsta::TX9D);
        }
        self.bus.write(regs::TXREG, word as u8);
    }

    pub fn transmit_bytes(&mut self, data: &[u8]) {
        for &byte in data {
            self.transmit_byte(byte);
        }
    }

    pub fn transmit_bytes9(&mut self, data: &[u16]) {
        for &word in data {
            self.transmit_byte9(word);
        }
    }

    /// Send a string
    pub fn print(&mut self, s: &str) {
        self.transmit_bytes(s.as_bytes());
    }

    /// Restart reception after an overrun (OERR clears when CREN toggles)
    fn recover_overrun(&mut self) -> bool {
        if !self.bus.any_set(regs::RCSTA, rcsta::OERR) {
            return false;
        }
        self.bus.clear_bits(regs::RCSTA, rcsta::CREN);
        self.bus.set_bits(regs::RCSTA, rcsta::CREN);

        #[cfg(feature = "defmt")]
        defmt::warn!("usart: receive overrun, reception restarted");

        true
    }

    /// Read the received byte
    ///
    /// A framing error discards the byte. An overrun restarts the receiver
    /// but the byte read is still valid.
    pub fn receive_byte(&mut self) -> Result<u8, UsartError> {
        // FERR describes the byte at the top of the FIFO: read it first
        let framing = self.bus.any_set(regs::RCSTA, rcsta::FERR);
        let byte = self.bus.read(regs::RCREG);
        self.recover_overrun();

        if framing {
            #[cfg(feature = "defmt")]
            defmt::warn!("usart: framing error");
            return Err(UsartError::Framing);
        }
        Ok(byte)
    }

    /// Read a received 9-bit word; bit 8 comes from RX9D
    pub fn receive_byte9(&mut self) -> Result<u16, UsartError> {
        let status = self.bus.read(regs::RCSTA);
        let low = self.bus.read(regs::RCREG);
        self.recover_overrun();

        if status & rcsta::FERR != 0 {
            return Err(UsartError::Framing);
        }
        let ninth = (status & rcsta::RX9D) as u16;
        Ok((ninth << 8) | low as u16)
    }

    /// Receive into `buf` until it is full or `timeout_ms` has elapsed
    ///
    /// Bytes with framing errors are dropped. Returns the number of bytes
    /// stored.
    pub fn receive_bytes<C: Clock>(
        &mut self,
        buf: &mut [u8],
        timeout_ms: u32,
        clock: &C,
    ) -> usize {
        let start = clock.now_ms();
        let mut count = 0;
        while count < buf.len() {
            if self.rx_available() {
                if let Ok(byte) = self.receive_byte() {
                    buf[count] = byte;
                    count += 1;
                    continue;
                }
            }
            if clock.elapsed_ms(start) >= timeout_ms {
                break;
            }
        }
        count
    }

    /// 9-bit variant of [`Usart::receive_bytes`]
    pub fn receive_bytes9<C: Clock>(
        &mut self,
        buf: &mut [u16],
        timeout_ms: u32,
        clock: &C,
    ) -> usize {
        let start = clock.now_ms();
        let mut count = 0;
        while count < buf.len() {
            if self.rx_available() {
                if let Ok(word) = self.receive_byte9() {
                    buf[count] = word;
                    count += 1;
                    continue;
                }
            }
            if clock.elapsed_ms(start) >= timeout_ms {
                break;
            }
        }
        count
    }
}

impl<B: RegisterBus> UartTx for Usart<B> {
    type Error = UsartError;

    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.transmit_bytes(data);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.wait_tx_idle();
        Ok(())
    }
}

impl<B: RegisterBus> UartRx for Usart<B> {
    type Error = UsartError;

    fn read_blocking(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        for slot in buf.iter_mut() {
            while !self.rx_available() {}
            *slot = self.receive_byte()?;
        }
        Ok(buf.len())
    }
}

impl<B: RegisterBus> embedded_io::ErrorType for Usart<B> {
    type Error = UsartError;
}

impl<B: RegisterBus> embedded_io::Write for Usart<B> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.transmit_bytes(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.wait_tx_idle();
        Ok(())
    }
}

impl<B: RegisterBus> embedded_io::Read for Usart<B> {
    /// Bytes received before an error are returned first; the error is
    /// reported by the next call.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        if let Some(e) = self.deferred_error.take() {
            return Err(e);
        }
        if buf.is_empty() {
            return Ok(0);
        }
        while !self.rx_available() {}
        let mut count = 0;
        while count < buf.len() && self.rx_available() {
            match self.receive_byte() {
                Ok(byte) => {
                    buf[count] = byte;
                    count += 1;
                }
                Err(e) if count > 0 => {
                    self.deferred_error = Some(e);
                    break;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(count)
    }
}
