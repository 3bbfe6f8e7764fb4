//! Simulated serial wire shared by transmitter and receiver pins
//!
//! Time only moves when a delay runs; pin reads see the level driven at the
//! current simulated instant.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::convert::Infallible;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

pub struct Wire {
    now_ns: Cell<u64>,
    /// (time, level) transitions, idle high before the first one
    edges: RefCell<Vec<(u64, bool)>>,
}

impl Wire {
    pub fn new() -> Self {
        Self {
            now_ns: Cell::new(0),
            edges: RefCell::new(Vec::new()),
        }
    }

    pub fn now(&self) -> u64 {
        self.now_ns.get()
    }

    pub fn set_time(&self, ns: u64) {
        self.now_ns.set(ns);
    }

    pub fn advance(&self, ns: u64) {
        self.now_ns.set(self.now_ns.get() + ns);
    }

    pub fn level_at(&self, ns: u64) -> bool {
        self.edges
            .borrow()
            .iter()
            .rev()
            .find(|(at, _)| *at <= ns)
            .map_or(true, |&(_, level)| level)
    }

    pub fn drive(&self, level: bool) {
        let now = self.now();
        if self.level_at(now) != level {
            self.edges.borrow_mut().push((now, level));
        }
    }

    /// Falling edges that begin a frame of `frame_bits` bit periods
    pub fn frame_starts(&self, bit_ns: u64, frame_bits: u64) -> Vec<u64> {
        let mut starts = Vec::new();
        let mut next_allowed = 0;
        for &(at, level) in self.edges.borrow().iter() {
            if !level && at >= next_allowed {
                starts.push(at);
                next_allowed = at + (frame_bits - 1) * bit_ns + bit_ns / 2;
            }
        }
        starts
    }
}

pub struct TxPin<'a>(pub &'a Wire);

impl ErrorType for TxPin<'_> {
    type Error = Infallible;
}

impl OutputPin for TxPin<'_> {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.0.drive(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.0.drive(true);
        Ok(())
    }
}

pub struct RxPin<'a>(pub &'a Wire);

impl ErrorType for RxPin<'_> {
    type Error = Infallible;
}

impl InputPin for RxPin<'_> {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        Ok(self.0.level_at(self.0.now()))
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        self.is_high().map(|high| !high)
    }
}

pub struct WireDelay<'a>(pub &'a Wire);

impl DelayNs for WireDelay<'_> {
    fn delay_ns(&mut self, ns: u32) {
        self.0.advance(ns as u64);
    }
}
