//! pic18kit hardware seams
//!
//! This crate defines the narrow traits the PIC18 peripheral code is written
//! against. Register access, the timebase timer and the external interrupt
//! line used by the software UART all go through these traits, so the same
//! logic runs against real special function registers or against the
//! in-memory [`sfr::RegisterFile`] in host tests.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  pic18-drivers (software UART)          │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  pic18-core (GPIO, IRQ, Timer0, USART)  │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  pic18-hal (this crate - traits)        │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`sfr::RegisterBus`] - Special function register access
//! - [`timer::HardwareTimer`], [`timer::Clock`] - Timebase
//! - [`gpio::EdgeInterrupt`] - Edge-triggered external interrupt line
//! - [`uart::UartTx`], [`uart::UartRx`] - Serial communication

#![no_std]
#![deny(unsafe_code)]

pub mod gpio;
pub mod sfr;
pub mod timer;
pub mod uart;

// Re-export key traits at crate root for convenience
pub use gpio::{Edge, EdgeInterrupt};
pub use sfr::{RegisterBus, RegisterFile};
pub use timer::{Clock, HardwareTimer};
pub use uart::{UartRx, UartTx};
