//! Software UART transmitter looped back into the receiver, with the
//! receiver armed on INT0 of the register-level interrupt controller.

mod common;

use common::{RxPin, TxPin, Wire, WireDelay};
use embedded_io::Read;
use pic18_core::regs::{self, intcon, intcon2};
use pic18_core::{ExternalInterrupt, ExternalLine};
use pic18_drivers::soft_uart::RxEvent;
use pic18_drivers::{BaudRate, RxChannel, RxStatus, SoftUartConfig, SoftUartRx, SoftUartTx};
use pic18_hal::{RegisterBus, RegisterFile};
use proptest::prelude::*;

/// Deliver every frame on the wire to the receiver, one INT0 edge each
fn replay<const N: usize>(
    wire: &Wire,
    regs: &RegisterFile,
    rx: &mut SoftUartRx<'_, RxPin<'_>, WireDelay<'_>, ExternalInterrupt<&RegisterFile>, N>,
    config: SoftUartConfig,
) -> Vec<Option<RxEvent>> {
    let bit_ns = config.bit_time_ns() as u64;
    wire.frame_starts(bit_ns, 10)
        .into_iter()
        .map(|start| {
            wire.set_time(start);
            regs.set_bits(regs::INTCON, intcon::INT0IF);
            rx.on_interrupt().unwrap()
        })
        .collect()
}

fn transmit(wire: &Wire, config: SoftUartConfig, data: &[u8]) {
    let mut tx = SoftUartTx::new(TxPin(wire), WireDelay(wire), config).unwrap();
    tx.write_bytes(data).unwrap();
}

#[test]
fn test_loopback_text() {
    let config = SoftUartConfig::new(BaudRate::B19200);
    let wire = Wire::new();
    transmit(&wire, config, b"PIC18!");

    let regs = RegisterFile::new();
    let channel: RxChannel<16> = RxChannel::new();
    let line = ExternalInterrupt::new(&regs, ExternalLine::Int0);
    let mut rx = SoftUartRx::new(RxPin(&wire), WireDelay(&wire), line, &channel, config).unwrap();

    // INT0 armed for a falling edge
    assert!(regs.any_set(regs::INTCON, intcon::INT0IE));
    assert!(!regs.any_set(regs::INTCON2, intcon2::INTEDG0));

    let events = replay(&wire, &regs, &mut rx, config);
    assert_eq!(events.len(), 6);
    assert!(!regs.any_set(regs::INTCON, intcon::INT0IF));

    let mut reader = rx.reader();
    assert_eq!(reader.len(), 6);
    let mut buf = [0u8; 16];
    let n = reader.read(&mut buf).unwrap();
    assert_eq!(&buf[..n], b"PIC18!");
    assert!(reader.take_status().is_clear());
}

#[test]
fn test_full_buffer_drops_newest() {
    let config = SoftUartConfig::default();
    let wire = Wire::new();
    transmit(&wire, config, &[1, 2, 3, 4, 5, 6]);

    let regs = RegisterFile::new();
    let channel: RxChannel<4> = RxChannel::new();
    let line = ExternalInterrupt::new(&regs, ExternalLine::Int0);
    let mut rx = SoftUartRx::new(RxPin(&wire), WireDelay(&wire), line, &channel, config).unwrap();

    replay(&wire, &regs, &mut rx, config);

    let mut reader = rx.reader();
    let mut got = Vec::new();
    while let Some(b) = reader.read_byte() {
        got.push(b);
    }
    assert_eq!(got, vec![1, 2, 3, 4]);
    assert_eq!(reader.take_status().bits(), RxStatus::OVERFLOW);
}

#[test]
fn test_break_is_framing_error() {
    let config = SoftUartConfig::default();
    let bit_ns = config.bit_time_ns() as u64;
    let wire = Wire::new();
    wire.set_time(bit_ns);
    wire.drive(false);
    wire.set_time(13 * bit_ns);
    wire.drive(true);

    let regs = RegisterFile::new();
    let channel: RxChannel<4> = RxChannel::new();
    let line = ExternalInterrupt::new(&regs, ExternalLine::Int0);
    let mut rx = SoftUartRx::new(RxPin(&wire), WireDelay(&wire), line, &channel, config).unwrap();

    let events = replay(&wire, &regs, &mut rx, config);
    assert_eq!(events, vec![Some(RxEvent::FramingError)]);

    let reader = rx.reader();
    assert!(!reader.available());
    assert_eq!(reader.status().bits(), RxStatus::FRAMING_ERROR);
}

#[test]
fn test_suspend_and_resume() {
    let config = SoftUartConfig::new(BaudRate::B38400);
    let wire = Wire::new();
    transmit(&wire, config, b"ab");

    let regs = RegisterFile::new();
    let channel: RxChannel<4> = RxChannel::new();
    let line = ExternalInterrupt::new(&regs, ExternalLine::Int0);
    let mut rx = SoftUartRx::new(RxPin(&wire), WireDelay(&wire), line, &channel, config).unwrap();
    let mut reader = rx.reader();

    reader.suspend();
    assert!(!regs.any_set(regs::INTCON, intcon::INT0IE));
    assert_eq!(replay(&wire, &regs, &mut rx, config), vec![None, None]);
    assert!(!reader.available());

    // Stale edge from the suspended period is discarded
    regs.set_bits(regs::INTCON, intcon::INT0IF);
    reader.resume();
    assert!(regs.any_set(regs::INTCON, intcon::INT0IE));
    assert!(!regs.any_set(regs::INTCON, intcon::INT0IF));

    replay(&wire, &regs, &mut rx, config);
    assert_eq!(reader.read_byte(), Some(b'a'));
    assert_eq!(reader.read_byte(), Some(b'b'));
}

#[test]
fn test_transmitter_writes_through_embedded_io() {
    use embedded_io::Write;

    let config = SoftUartConfig::default();
    let wire = Wire::new();
    let mut tx = SoftUartTx::new(TxPin(&wire), WireDelay(&wire), config).unwrap();
    write!(tx, "{}", 42).unwrap();

    let bit_ns = config.bit_time_ns() as u64;
    assert_eq!(wire.frame_starts(bit_ns, 10).len(), 2);
    assert_eq!(wire.now(), 20 * bit_ns);
}

fn rx_baud() -> impl Strategy<Value = BaudRate> {
    prop_oneof![
        Just(BaudRate::B9600),
        Just(BaudRate::B19200),
        Just(BaudRate::B38400),
        Just(BaudRate::B57600),
    ]
}

proptest! {
    #[test]
    fn prop_loopback_any_bytes(
        data in proptest::collection::vec(any::<u8>(), 1..12),
        baud in rx_baud(),
    ) {
        let config = SoftUartConfig::new(baud);
        let wire = Wire::new();
        transmit(&wire, config, &data);

        let regs = RegisterFile::new();
        let channel: RxChannel<16> = RxChannel::new();
        let line = ExternalInterrupt::new(&regs, ExternalLine::Int0);
        let mut rx =
            SoftUartRx::new(RxPin(&wire), WireDelay(&wire), line, &channel, config).unwrap();
        replay(&wire, &regs, &mut rx, config);

        let mut reader = rx.reader();
        let mut got = Vec::new();
        while let Some(b) = reader.read_byte() {
            got.push(b);
        }
        prop_assert_eq!(got, data);
        prop_assert!(reader.status().is_clear());
    }
}
