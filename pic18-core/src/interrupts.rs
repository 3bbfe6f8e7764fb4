//! Interrupt control
//!
//! Every PIC18F452 interrupt source has an enable bit, a flag bit and (except
//! INT0) a priority bit, spread over INTCON/INTCON2/INTCON3 for the core
//! sources and PIE/PIR/IPR 1-2 for the peripheral ones. [`Interrupt`] knows
//! where its bits live; [`Interrupts`] manipulates them.
//!
//! # Dispatch
//!
//! The interrupt service routine asks [`Interrupts::pending`] which enabled
//! sources have their flag set and calls the matching handlers, e.g.
//! `SystemTime::on_interrupt` for [`Interrupt::Timer0`]. With priority
//! levels enabled, [`Interrupts::pending_at`] splits the work between the
//! high (0x08) and low (0x18) vectors.

use pic18_hal::{Edge, EdgeInterrupt, RegisterBus};

use crate::regs::{self, intcon, intcon2, intcon3, pir1, pir2, rcon};

/// Interrupt control errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InterruptError {
    /// Source has a fixed priority (INT0 is always high priority)
    NoPriorityControl,
}

/// Interrupt priority level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Priority {
    High,
    Low,
}

/// Location of a single control bit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegBit {
    pub reg: u16,
    pub mask: u8,
}

impl RegBit {
    const fn new(reg: u16, mask: u8) -> Self {
        Self { reg, mask }
    }
}

/// Interrupt sources
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Interrupt {
    /// Timer0 overflow
    Timer0,
    /// External interrupt 0 (RB0)
    Int0,
    /// PORTB[7:4] change
    PortBChange,
    /// External interrupt 1 (RB1)
    Int1,
    /// External interrupt 2 (RB2)
    Int2,
    /// Parallel slave port read/write
    ParallelSlavePort,
    /// A/D conversion complete
    Adc,
    /// USART receive buffer full
    UsartRx,
    /// USART transmit buffer empty
    UsartTx,
    /// Master synchronous serial port
    Mssp,
    /// Capture/compare/PWM 1
    Ccp1,
    /// TMR2 to PR2 match
    Timer2,
    /// Timer1 overflow
    Timer1,
    /// Data EEPROM/flash write complete
    EepromWrite,
    /// Bus collision
    BusCollision,
    /// Low voltage detect
    LowVoltage,
    /// Timer3 overflow
    Timer3,
    /// Capture/compare/PWM 2
    Ccp2,
}

impl Interrupt {
    /// Every source, in the order the dispatcher checks them
    pub const ALL: [Interrupt; 18] = [
        Interrupt::Timer0,
        Interrupt::Int0,
        Interrupt::PortBChange,
        Interrupt::Int1,
        Interrupt::Int2,
        Interrupt::ParallelSlavePort,
        Interrupt::Adc,
        Interrupt::UsartRx,
        Interrupt::UsartTx,
        Interrupt::Mssp,
        Interrupt::Ccp1,
        Interrupt::Timer2,
        Interrupt::Timer1,
        Interrupt::EepromWrite,
        Interrupt::BusCollision,
        Interrupt::LowVoltage,
        Interrupt::Timer3,
        Interrupt::Ccp2,
    ];

    /// Enable bit of the source
    pub const fn enable_bit(self) -> RegBit {
        match self {
            Interrupt::Timer0 => RegBit::new(regs::INTCON, intcon::TMR0IE),
            Interrupt::Int0 => RegBit::new(regs::INTCON, intcon::INT0IE),
            Interrupt::PortBChange => RegBit::new(regs::INTCON, intcon::RBIE),
            Interrupt::Int1 => RegBit::new(regs::INTCON3, intcon3::INT1IE),
            Interrupt::Int2 => RegBit::new(regs::INTCON3, intcon3::INT2IE),
            _ => self.peripheral_bit(regs::PIE1, regs::PIE2),
        }
    }

    /// Flag bit of the source
    pub const fn flag_bit(self) -> RegBit {
        match self {
            Interrupt::Timer0 => RegBit::new(regs::INTCON, intcon::TMR0IF),
            Interrupt::Int0 => RegBit::new(regs::INTCON, intcon::INT0IF),
            Interrupt::PortBChange => RegBit::new(regs::INTCON, intcon::RBIF),
            Interrupt::Int1 => RegBit::new(regs::INTCON3, intcon3::INT1IF),
            Interrupt::Int2 => RegBit::new(regs::INTCON3, intcon3::INT2IF),
            _ => self.peripheral_bit(regs::PIR1, regs::PIR2),
        }
    }

    /// Priority bit of the source, `None` for INT0
    pub const fn priority_bit(self) -> Option<RegBit> {
        match self {
            Interrupt::Int0 => None,
            Interrupt::Timer0 => Some(RegBit::new(regs::INTCON2, intcon2::TMR0IP)),
            Interrupt::PortBChange => Some(RegBit::new(regs::INTCON2, intcon2::RBIP)),
            Interrupt::Int1 => Some(RegBit::new(regs::INTCON3, intcon3::INT1IP)),
            Interrupt::Int2 => Some(RegBit::new(regs::INTCON3, intcon3::INT2IP)),
            _ => Some(self.peripheral_bit(regs::IPR1, regs::IPR2)),
        }
    }

    /// Peripheral sources additionally need PEIE set to fire
    pub const fn is_peripheral(self) -> bool {
        !matches!(
            self,
            Interrupt::Timer0
                | Interrupt::Int0
                | Interrupt::PortBChange
                | Interrupt::Int1
                | Interrupt::Int2
        )
    }

    const fn peripheral_bit(self, group1: u16, group2: u16) -> RegBit {
        match self {
            Interrupt::ParallelSlavePort => RegBit::new(group1, pir1::PSP),
            Interrupt::Adc => RegBit::new(group1, pir1::AD),
            Interrupt::UsartRx => RegBit::new(group1, pir1::RC),
            Interrupt::UsartTx => RegBit::new(group1, pir1::TX),
            Interrupt::Mssp => RegBit::new(group1, pir1::SSP),
            Interrupt::Ccp1 => RegBit::new(group1, pir1::CCP1),
            Interrupt::Timer2 => RegBit::new(group1, pir1::TMR2),
            Interrupt::Timer1 => RegBit::new(group1, pir1::TMR1),
            Interrupt::EepromWrite => RegBit::new(group2, pir2::EE),
            Interrupt::BusCollision => RegBit::new(group2, pir2::BCL),
            Interrupt::LowVoltage => RegBit::new(group2, pir2::LVD),
            Interrupt::Timer3 => RegBit::new(group2, pir2::TMR3),
            // Core sources never reach here
            _ => RegBit::new(group2, pir2::CCP2),
        }
    }
}

/// External interrupt lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExternalLine {
    /// INT0 on RB0
    Int0,
    /// INT1 on RB1
    Int1,
    /// INT2 on RB2
    Int2,
}

impl ExternalLine {
    pub const fn interrupt(self) -> Interrupt {
        match self {
            ExternalLine::Int0 => Interrupt::Int0,
            ExternalLine::Int1 => Interrupt::Int1,
            ExternalLine::Int2 => Interrupt::Int2,
        }
    }

    /// INTEDGx bit in INTCON2 (set = rising edge)
    pub const fn edge_mask(self) -> u8 {
        match self {
            ExternalLine::Int0 => intcon2::INTEDG0,
            ExternalLine::Int1 => intcon2::INTEDG1,
            ExternalLine::Int2 => intcon2::INTEDG2,
        }
    }
}

/// Interrupt controller access
pub struct Interrupts<B> {
    bus: B,
}

impl<B: RegisterBus> Interrupts<B> {
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    /// Enable `source`
    pub fn enable(&self, source: Interrupt) {
        let bit = source.enable_bit();
        self.bus.set_bits(bit.reg, bit.mask);
    }

    /// Disable `source`
    pub fn disable(&self, source: Interrupt) {
        let bit = source.enable_bit();
        self.bus.clear_bits(bit.reg, bit.mask);
    }

    /// Enable every source in `sources`
    pub fn enable_all(&self, sources: &[Interrupt]) {
        for &source in sources {
            self.enable(source);
        }
    }

    /// Disable every source in `sources`
    pub fn disable_all(&self, sources: &[Interrupt]) {
        for &source in sources {
            self.disable(source);
        }
    }

    pub fn is_enabled(&self, source: Interrupt) -> bool {
        let bit = source.enable_bit();
        self.bus.any_set(bit.reg, bit.mask)
    }

    /// Check the flag of `source`, whether or not it is enabled
    pub fn is_pending(&self, source: Interrupt) -> bool {
        let bit = source.flag_bit();
        self.bus.any_set(bit.reg, bit.mask)
    }

    /// Clear the flag of `source`
    pub fn clear_flag(&self, source: Interrupt) {
        let bit = source.flag_bit();
        self.bus.clear_bits(bit.reg, bit.mask);
    }

    /// Assign `source` to the high or low priority vector
    pub fn set_priority(
        &self,
        source: Interrupt,
        priority: Priority,
    ) -> Result<(), InterruptError> {
        let bit = source
            .priority_bit()
            .ok_or(InterruptError::NoPriorityControl)?;
        match priority {
            Priority::High => self.bus.set_bits(bit.reg, bit.mask),
            Priority::Low => self.bus.clear_bits(bit.reg, bit.mask),
        }
        Ok(())
    }

    /// Priority currently assigned to `source`
    pub fn priority(&self, source: Interrupt) -> Priority {
        match source.priority_bit() {
            Some(bit) if !self.bus.any_set(bit.reg, bit.mask) => Priority::Low,
            _ => Priority::High,
        }
    }

    /// Set GIE (GIEH with priority levels)
    pub fn enable_global(&self) {
        self.bus.set_bits(regs::INTCON, intcon::GIE);
    }

    /// Clear GIE (GIEH with priority levels)
    pub fn disable_global(&self) {
        self.bus.clear_bits(regs::INTCON, intcon::GIE);
    }

    pub fn is_global_enabled(&self) -> bool {
        self.bus.any_set(regs::INTCON, intcon::GIE)
    }

    /// Set PEIE (GIEL with priority levels)
    pub fn enable_peripheral(&self) {
        self.bus.set_bits(regs::INTCON, intcon::PEIE);
    }

    /// Clear PEIE (GIEL with priority levels)
    pub fn disable_peripheral(&self) {
        self.bus.clear_bits(regs::INTCON, intcon::PEIE);
    }

    /// Enable high/low priority levels (RCON.IPEN)
    pub fn enable_priority_levels(&self) {
        self.bus.set_bits(regs::RCON, rcon::IPEN);
    }

    /// Return to single-vector compatibility mode
    pub fn disable_priority_levels(&self) {
        self.bus.clear_bits(regs::RCON, rcon::IPEN);
    }

    pub fn priority_levels_enabled(&self) -> bool {
        self.bus.any_set(regs::RCON, rcon::IPEN)
    }

    /// Select the edge an external interrupt line triggers on
    pub fn set_external_edge(&self, line: ExternalLine, edge: Edge) {
        match edge {
            Edge::Rising => self.bus.set_bits(regs::INTCON2, line.edge_mask()),
            Edge::Falling => self.bus.clear_bits(regs::INTCON2, line.edge_mask()),
        }
    }

    /// Sources that are both enabled and flagged
    pub fn pending(&self) -> impl Iterator<Item = Interrupt> + '_ {
        Interrupt::ALL
            .into_iter()
            .filter(move |&source| self.is_enabled(source) && self.is_pending(source))
    }

    /// Pending sources routed to the vector of `priority`
    ///
    /// Without priority levels every source goes to the high vector.
    pub fn pending_at(&self, priority: Priority) -> impl Iterator<Item = Interrupt> + '_ {
        let levels = self.priority_levels_enabled();
        self.pending().filter(move |&source| {
            let routed = if levels {
                self.priority(source)
            } else {
                Priority::High
            };
            routed == priority
        })
    }
}

/// One external interrupt line as an [`EdgeInterrupt`]
#[derive(Clone)]
pub struct ExternalInterrupt<B> {
    bus: B,
    line: ExternalLine,
}

impl<B: RegisterBus> ExternalInterrupt<B> {
    pub const fn new(bus: B, line: ExternalLine) -> Self {
        Self { bus, line }
    }

    pub fn line(&self) -> ExternalLine {
        self.line
    }
}

impl<B: RegisterBus> EdgeInterrupt for ExternalInterrupt<B> {
    fn set_edge(&mut self, edge: Edge) {
        Interrupts::new(&self.bus).set_external_edge(self.line, edge);
    }

    fn enable(&mut self) {
        Interrupts::new(&self.bus).enable(self.line.interrupt());
    }

    fn disable(&mut self) {
        Interrupts::new(&self.bus).disable(self.line.interrupt());
    }

    fn is_enabled(&self) -> bool {
        Interrupts::new(&self.bus).is_enabled(self.line.interrupt())
    }

    fn is_pending(&self) -> bool {
        Interrupts::new(&self.bus).is_pending(self.line.interrupt())
    }

    fn clear_pending(&mut self) {
        Interrupts::new(&self.bus).clear_flag(self.line.interrupt());
    }
}
