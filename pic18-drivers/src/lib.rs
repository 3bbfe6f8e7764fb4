//! Peripheral drivers built on the pic18kit seams
//!
//! - Software UART: bit-banged transmitter, edge-triggered receiver and a
//!   ring buffer shared between the receive interrupt and the main loop

#![no_std]
#![deny(unsafe_code)]

pub mod soft_uart;

pub use soft_uart::{
    BaudRate, RxChannel, RxStatus, SoftUartConfig, SoftUartReader, SoftUartRx, SoftUartTx,
};
