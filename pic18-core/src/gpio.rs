//! GPIO port and pin control
//!
//! Each port has three registers: PORTx (pin levels, read), LATx (output
//! latch) and TRISx (direction, 1 = input). Writes always go to the latch so
//! read-modify-write sequences never pick up the level of a loaded pin.

use core::convert::Infallible;
use core::str::FromStr;

use embedded_hal::digital::{ErrorType, InputPin, OutputPin, StatefulOutputPin};
use pic18_hal::RegisterBus;

use crate::bits;
use crate::regs::{self, intcon2, io};

/// GPIO errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GpioError {
    /// Pin index does not exist on the port
    InvalidPin,
    /// Pin name could not be parsed
    InvalidName,
}

/// I/O port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Port {
    A,
    B,
    C,
    D,
    E,
}

impl Port {
    /// Index of the port, used as register offset
    pub const fn index(self) -> u16 {
        match self {
            Port::A => 0,
            Port::B => 1,
            Port::C => 2,
            Port::D => 3,
            Port::E => 4,
        }
    }

    /// Number of pins bonded out on the port (PIC18F452)
    pub const fn pin_count(self) -> u8 {
        match self {
            Port::A => 7,
            Port::B | Port::C | Port::D => 8,
            Port::E => 3,
        }
    }

    /// PORTx register address
    pub const fn port_reg(self) -> u16 {
        io::GPIO_BASE + io::PORT_OFFSET + self.index()
    }

    /// LATx register address
    pub const fn latch_reg(self) -> u16 {
        io::GPIO_BASE + io::LATCH_OFFSET + self.index()
    }

    /// TRISx register address
    pub const fn tris_reg(self) -> u16 {
        io::GPIO_BASE + io::TRIS_OFFSET + self.index()
    }

    fn from_letter(c: char) -> Option<Self> {
        match c {
            'A' => Some(Port::A),
            'B' => Some(Port::B),
            'C' => Some(Port::C),
            'D' => Some(Port::D),
            'E' => Some(Port::E),
            _ => None,
        }
    }
}

/// A single pin on a port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PinId {
    port: Port,
    index: u8,
}

impl PinId {
    /// Create a pin identifier, checking the index exists on the port
    pub const fn new(port: Port, index: u8) -> Result<Self, GpioError> {
        if index >= port.pin_count() {
            return Err(GpioError::InvalidPin);
        }
        Ok(Self { port, index })
    }

    /// RB0, the INT0 external interrupt pin
    pub const RB0: PinId = PinId {
        port: Port::B,
        index: 0,
    };

    pub fn port(&self) -> Port {
        self.port
    }

    pub fn index(&self) -> u8 {
        self.index
    }

    /// Bit mask of this pin within its port registers
    pub fn mask(&self) -> u8 {
        1 << self.index
    }
}

impl FromStr for PinId {
    type Err = GpioError;

    /// Parse a datasheet pin name
    ///
    /// Supports formats:
    /// - "RA0" -> (Port A, Pin 0)
    /// - "rb7" -> (Port B, Pin 7)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let mut chars = s.chars();

        if !matches!(chars.next(), Some('R' | 'r')) {
            return Err(GpioError::InvalidName);
        }

        let port = chars
            .next()
            .map(|c| c.to_ascii_uppercase())
            .and_then(Port::from_letter)
            .ok_or(GpioError::InvalidName)?;

        let index: u8 = chars
            .as_str()
            .parse()
            .map_err(|_| GpioError::InvalidName)?;

        PinId::new(port, index)
    }
}

/// Direction of a pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    Input,
    Output,
}

/// Port-level GPIO access
pub struct Gpio<B> {
    bus: B,
}

impl<B: RegisterBus> Gpio<B> {
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    /// Configure `pin` as an output
    pub fn set_output(&self, pin: PinId) {
        self.bus.clear_bits(pin.port.tris_reg(), pin.mask());
    }

    /// Configure `pin` as an input
    pub fn set_input(&self, pin: PinId) {
        self.bus.set_bits(pin.port.tris_reg(), pin.mask());
    }

    /// Configure the direction of a whole port (bit set = input)
    pub fn set_direction(&self, port: Port, mask: u8) {
        self.bus.write(port.tris_reg(), mask);
    }

    /// Current direction of `pin`
    pub fn direction(&self, pin: PinId) -> Direction {
        if bits::read(self.bus.read(pin.port.tris_reg()), pin.index) {
            Direction::Input
        } else {
            Direction::Output
        }
    }

    /// Drive `pin` high
    pub fn set_pin(&self, pin: PinId) {
        self.bus.set_bits(pin.port.latch_reg(), pin.mask());
    }

    /// Drive `pin` low
    pub fn clear_pin(&self, pin: PinId) {
        self.bus.clear_bits(pin.port.latch_reg(), pin.mask());
    }

    /// Invert the output latch of `pin`
    pub fn toggle_pin(&self, pin: PinId) {
        self.bus
            .modify(pin.port.latch_reg(), |v| bits::toggle(v, pin.index));
    }

    /// Read the level present on `pin`
    pub fn read_pin(&self, pin: PinId) -> bool {
        bits::read(self.bus.read(pin.port.port_reg()), pin.index)
    }

    /// Write the whole output latch of `port`
    pub fn write_port(&self, port: Port, value: u8) {
        self.bus.write(port.latch_reg(), value);
    }

    /// Read the pin levels of a whole port
    pub fn read_port(&self, port: Port) -> u8 {
        self.bus.read(port.port_reg())
    }

    /// Enable the PORTB weak pull-ups (RBPU is active low)
    pub fn enable_portb_pullups(&self) {
        self.bus.clear_bits(regs::INTCON2, intcon2::RBPU);
    }

    /// Disable the PORTB weak pull-ups
    pub fn disable_portb_pullups(&self) {
        self.bus.set_bits(regs::INTCON2, intcon2::RBPU);
    }
}

impl<B: RegisterBus + Clone> Gpio<B> {
    /// Configure `pin` as an output and return a pin handle
    pub fn output(&self, pin: PinId) -> PortPin<B> {
        self.set_output(pin);
        PortPin {
            bus: self.bus.clone(),
            pin,
        }
    }

    /// Configure `pin` as an input and return a pin handle
    pub fn input(&self, pin: PinId) -> PortPin<B> {
        self.set_input(pin);
        PortPin {
            bus: self.bus.clone(),
            pin,
        }
    }
}

/// Handle to a single pin, usable through the `embedded-hal` digital traits
pub struct PortPin<B> {
    bus: B,
    pin: PinId,
}

impl<B> PortPin<B> {
    pub fn id(&self) -> PinId {
        self.pin
    }
}

impl<B: RegisterBus> ErrorType for PortPin<B> {
    type Error = Infallible;
}

impl<B: RegisterBus> OutputPin for PortPin<B> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.bus
            .clear_bits(self.pin.port.latch_reg(), self.pin.mask());
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.bus.set_bits(self.pin.port.latch_reg(), self.pin.mask());
        Ok(())
    }
}

impl<B: RegisterBus> StatefulOutputPin for PortPin<B> {
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.bus.any_set(self.pin.port.latch_reg(), self.pin.mask()))
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        self.is_set_high().map(|high| !high)
    }
}

impl<B: RegisterBus> InputPin for PortPin<B> {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.bus.any_set(self.pin.port.port_reg(), self.pin.mask()))
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|high| !high)
    }
}
