//! Timebase abstractions
//!
//! The system timebase counts overflows of a free-running 16-bit hardware
//! timer. [`HardwareTimer`] is the register-level view of that timer and
//! [`Clock`] is what time-out aware code consumes.

/// Free-running 16-bit hardware timer with an overflow flag
pub trait HardwareTimer {
    /// Start counting
    fn start(&mut self);

    /// Stop counting; the counter keeps its value
    fn stop(&mut self);

    /// Check if the timer is counting
    fn is_running(&self) -> bool;

    /// Current counter value
    fn counter(&mut self) -> u16;

    /// Reset the counter to zero
    fn reset_counter(&mut self);

    /// Check if the overflow flag is set
    fn overflow_pending(&self) -> bool;

    /// Clear the overflow flag
    fn clear_overflow(&mut self);

    /// Enable the overflow interrupt
    fn enable_interrupt(&mut self);

    /// Disable the overflow interrupt
    fn disable_interrupt(&mut self);
}

/// Monotonic time source
///
/// Both readings wrap around on overflow; compare them with
/// `wrapping_sub`.
pub trait Clock {
    /// Milliseconds elapsed since the timebase started
    fn now_ms(&self) -> u32;

    /// Microseconds elapsed since the timebase started
    fn now_us(&self) -> u32;

    /// Milliseconds elapsed since `start` (a previous [`Clock::now_ms`] value)
    fn elapsed_ms(&self, start: u32) -> u32 {
        self.now_ms().wrapping_sub(start)
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> u32 {
        (**self).now_ms()
    }

    fn now_us(&self) -> u32 {
        (**self).now_us()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    struct FixedClock {
        ms: Cell<u32>,
    }

    impl Clock for FixedClock {
        fn now_ms(&self) -> u32 {
            self.ms.get()
        }

        fn now_us(&self) -> u32 {
            self.ms.get().wrapping_mul(1000)
        }
    }

    #[test]
    fn test_elapsed_wraps() {
        let clock = FixedClock {
            ms: Cell::new(u32::MAX - 4),
        };
        let start = clock.now_ms();
        clock.ms.set(5);

        assert_eq!(clock.elapsed_ms(start), 10);
    }
}
