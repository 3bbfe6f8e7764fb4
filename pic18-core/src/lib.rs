//! Register-level peripheral logic for PIC18 microcontrollers
//!
//! This crate contains the PIC18F452 peripheral code, written against the
//! [`pic18_hal::RegisterBus`] seam:
//!
//! - Register map and bit-field constants
//! - Bit manipulation helpers
//! - GPIO port and pin control
//! - Interrupt enable/flag/priority control and ISR dispatch
//! - Timer0 and the millisecond/microsecond system timebase
//! - Hardware USART

#![no_std]
#![deny(unsafe_code)]

pub mod bits;
pub mod gpio;
pub mod interrupts;
pub mod regs;
pub mod systime;
pub mod timer0;
pub mod usart;

pub use gpio::{Gpio, PinId, Port, PortPin};
pub use interrupts::{ExternalInterrupt, ExternalLine, Interrupt, Interrupts, Priority};
pub use systime::{SystemTime, SystemTimeConfig};
pub use timer0::{Prescaler, Timer0, Timer0Config};
pub use usart::{Usart, UsartConfig, UsartError};
