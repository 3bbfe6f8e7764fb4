//! Receive state machine
//!
//! Fed one line sample per bit period, starting half a bit after the
//! falling edge of the start bit.

/// Outcome of a completed frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RxEvent {
    /// A byte with a valid stop bit
    Byte(u8),
    /// Stop bit sampled low; the byte is discarded
    FramingError,
    /// Line back high at mid start bit (glitch)
    FalseStart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShiftState {
    Idle,
    Start,
    Data { bit: u8, value: u8 },
    Stop { value: u8 },
}

/// Start/data/stop bit shifter
#[derive(Debug, Clone)]
pub struct RxShifter {
    state: ShiftState,
}

impl Default for RxShifter {
    fn default() -> Self {
        Self::new()
    }
}

impl RxShifter {
    pub const fn new() -> Self {
        Self {
            state: ShiftState::Idle,
        }
    }

    /// Falling edge seen: the next sample is the start bit
    pub fn begin(&mut self) {
        self.state = ShiftState::Start;
    }

    /// Abandon the current frame
    pub fn reset(&mut self) {
        self.state = ShiftState::Idle;
    }

    pub fn is_idle(&self) -> bool {
        self.state == ShiftState::Idle
    }

    /// Feed one sample (`true` = line high)
    ///
    /// Returns an event when the frame ends. Samples while idle are ignored.
    pub fn sample(&mut self, high: bool) -> Option<RxEvent> {
        match self.state {
            ShiftState::Idle => None,
            ShiftState::Start => {
                if high {
                    self.state = ShiftState::Idle;
                    Some(RxEvent::FalseStart)
                } else {
                    self.state = ShiftState::Data { bit: 0, value: 0 };
                    None
                }
            }
            ShiftState::Data { bit, value } => {
                let value = value | ((high as u8) << bit);
                self.state = if bit == 7 {
                    ShiftState::Stop { value }
                } else {
                    ShiftState::Data {
                        bit: bit + 1,
                        value,
                    }
                };
                None
            }
            ShiftState::Stop { value } => {
                self.state = ShiftState::Idle;
                if high {
                    Some(RxEvent::Byte(value))
                } else {
                    Some(RxEvent::FramingError)
                }
            }
        }
    }
}
