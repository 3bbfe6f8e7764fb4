//! Timer0 driver
//!
//! Timer0 runs as a 16-bit timer on the instruction clock (Fosc/4), with an
//! optional prescaler. It is the engine of the system timebase.

use pic18_hal::{HardwareTimer, RegisterBus};

use crate::regs::{self, intcon, t0con};

/// Timer0 prescaler ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Prescaler {
    Div2,
    Div4,
    Div8,
    Div16,
    Div32,
    Div64,
    Div128,
    Div256,
}

impl Prescaler {
    /// Value of the T0PS2:T0PS0 field
    pub const fn bits(self) -> u8 {
        match self {
            Prescaler::Div2 => 0,
            Prescaler::Div4 => 1,
            Prescaler::Div8 => 2,
            Prescaler::Div16 => 3,
            Prescaler::Div32 => 4,
            Prescaler::Div64 => 5,
            Prescaler::Div128 => 6,
            Prescaler::Div256 => 7,
        }
    }

    /// Division ratio
    pub const fn divisor(self) -> u32 {
        2 << self.bits()
    }
}

/// Timer0 configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Timer0Config {
    /// Prescaler, or `None` to count every instruction cycle
    pub prescaler: Option<Prescaler>,
}

impl Timer0Config {
    /// T0CON value for this configuration, timer stopped
    pub fn t0con(&self) -> u8 {
        match self.prescaler {
            None => t0con::PSA,
            Some(p) => p.bits(),
        }
    }

    /// Instruction cycles per counter increment
    pub fn divisor(&self) -> u32 {
        self.prescaler.map_or(1, Prescaler::divisor)
    }
}

/// Timer0 peripheral
pub struct Timer0<B> {
    bus: B,
}

impl<B: RegisterBus> Timer0<B> {
    pub const fn new(bus: B) -> Self {
        Self { bus }
    }

    /// Stop the timer and apply `config`: 16-bit mode, instruction clock
    pub fn configure(&mut self, config: &Timer0Config) {
        self.bus.write(regs::T0CON, config.t0con());
    }
}

impl<B: RegisterBus> HardwareTimer for Timer0<B> {
    fn start(&mut self) {
        self.bus.set_bits(regs::T0CON, t0con::TMR0ON);
    }

    fn stop(&mut self) {
        self.bus.clear_bits(regs::T0CON, t0con::TMR0ON);
    }

    fn is_running(&self) -> bool {
        self.bus.any_set(regs::T0CON, t0con::TMR0ON)
    }

    fn counter(&mut self) -> u16 {
        // Reading TMR0L latches the high byte into TMR0H
        let low = self.bus.read(regs::TMR0L);
        let high = self.bus.read(regs::TMR0H);
        u16::from_le_bytes([low, high])
    }

    fn reset_counter(&mut self) {
        // TMR0H is buffered and transferred on the TMR0L write
        self.bus.write(regs::TMR0H, 0);
        self.bus.write(regs::TMR0L, 0);
    }

    fn overflow_pending(&self) -> bool {
        self.bus.any_set(regs::INTCON, intcon::TMR0IF)
    }

    fn clear_overflow(&mut self) {
        self.bus.clear_bits(regs::INTCON, intcon::TMR0IF);
    }

    fn enable_interrupt(&mut self) {
        self.bus.set_bits(regs::INTCON, intcon::TMR0IE);
    }

    fn disable_interrupt(&mut self) {
        self.bus.clear_bits(regs::INTCON, intcon::TMR0IE);
    }
}
