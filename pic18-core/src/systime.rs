//! System timebase
//!
//! Millisecond and microsecond time since start-up, built on a free-running
//! 16-bit hardware timer (Timer0). The timer overflow interrupt calls
//! [`SystemTime::on_interrupt`], which counts overflows; readers combine the
//! overflow count with the live counter value.
//!
//! ```text
//! elapsed_us = (overflows << 16 | counter) * 4 * prescale / osc_mhz
//! ```
//!
//! The overflow count is shared with the ISR through an atomic and the timer
//! lives behind a critical-section mutex, so a `SystemTime` can be a
//! `static` read from both contexts.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embedded_hal::delay::DelayNs;
use pic18_hal::{Clock, HardwareTimer, RegisterBus};
use portable_atomic::{AtomicBool, AtomicU64, Ordering};

use crate::timer0::{Prescaler, Timer0, Timer0Config};

/// Highest supported oscillator frequency
pub const MAX_OSC_MHZ: u8 = 40;

/// Instruction clock is Fosc / 4
const CLOCKS_PER_INSTRUCTION: u64 = 4;

/// Timebase configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Oscillator frequency outside 1..=40 MHz
    InvalidOscillator,
}

/// Timebase configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SystemTimeConfig {
    /// Device oscillator frequency in MHz (1-40)
    pub osc_mhz: u8,
    /// Timer prescaler, `None` for one count per instruction cycle
    pub prescaler: Option<Prescaler>,
}

impl Default for SystemTimeConfig {
    fn default() -> Self {
        Self {
            osc_mhz: 4,
            prescaler: None,
        }
    }
}

impl SystemTimeConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.osc_mhz == 0 || self.osc_mhz > MAX_OSC_MHZ {
            return Err(ConfigError::InvalidOscillator);
        }
        Ok(())
    }

    /// Timer settings matching this configuration
    pub fn timer0(&self) -> Timer0Config {
        Timer0Config {
            prescaler: self.prescaler,
        }
    }

    fn divisor(&self) -> u64 {
        self.prescaler.map_or(1, Prescaler::divisor) as u64
    }

    /// Convert raw timer counts to microseconds
    pub fn counts_to_us(&self, counts: u64) -> u64 {
        counts * CLOCKS_PER_INSTRUCTION * self.divisor() / self.osc_mhz.max(1) as u64
    }

    /// Timer counts covering at least `ns` nanoseconds
    pub fn ns_to_counts(&self, ns: u32) -> u64 {
        let per_count_x1000 = CLOCKS_PER_INSTRUCTION * self.divisor() * 1000;
        (ns as u64 * self.osc_mhz.max(1) as u64).div_ceil(per_count_x1000)
    }

    /// Timer counts covering at least `us` microseconds
    pub fn us_to_counts(&self, us: u64) -> u64 {
        let per_count = CLOCKS_PER_INSTRUCTION * self.divisor();
        (us * self.osc_mhz.max(1) as u64).div_ceil(per_count)
    }
}

/// Timer-driven system timebase
pub struct SystemTime<T> {
    timer: Mutex<CriticalSectionRawMutex, RefCell<T>>,
    overflows: AtomicU64,
    suspended: AtomicBool,
    config: SystemTimeConfig,
}

impl<T: HardwareTimer> SystemTime<T> {
    /// Wrap `timer`; nothing runs until [`SystemTime::init`]
    pub const fn new(timer: T, config: SystemTimeConfig) -> Self {
        Self {
            timer: Mutex::new(RefCell::new(timer)),
            overflows: AtomicU64::new(0),
            suspended: AtomicBool::new(false),
            config,
        }
    }

    pub fn config(&self) -> &SystemTimeConfig {
        &self.config
    }

    /// Reset the count and start the timer with its overflow interrupt
    ///
    /// Global interrupts must be enabled separately for the overflow
    /// interrupt to reach [`SystemTime::on_interrupt`].
    pub fn init(&self) -> Result<(), ConfigError> {
        self.config.validate()?;
        self.timer.lock(|timer| {
            let mut timer = timer.borrow_mut();
            timer.stop();
            timer.reset_counter();
            timer.clear_overflow();
            self.overflows.store(0, Ordering::Relaxed);
            timer.enable_interrupt();
            timer.start();
        });
        self.suspended.store(false, Ordering::Relaxed);

        #[cfg(feature = "defmt")]
        defmt::debug!("systime: started at {} MHz", self.config.osc_mhz);

        Ok(())
    }

    /// Timer overflow handler, to be called from the interrupt service routine
    ///
    /// Returns `true` if the overflow flag was set and has been accounted.
    pub fn on_interrupt(&self) -> bool {
        self.timer.lock(|timer| {
            let mut timer = timer.borrow_mut();
            if !timer.overflow_pending() {
                return false;
            }
            timer.clear_overflow();
            self.overflows.fetch_add(1, Ordering::Relaxed);
            true
        })
    }

    /// Raw timer counts since [`SystemTime::init`]
    ///
    /// An overflow that is flagged but not yet serviced is accounted here,
    /// so the count stays monotonic across several wraps even when the
    /// overflow interrupt is held off.
    pub fn counts(&self) -> u64 {
        self.timer.lock(|timer| {
            let mut timer = timer.borrow_mut();
            let mut counter = timer.counter();
            if timer.overflow_pending() {
                // Re-read so the counter is known to be past the wrap
                timer.clear_overflow();
                self.overflows.fetch_add(1, Ordering::Relaxed);
                counter = timer.counter();
            }
            let overflows = self.overflows.load(Ordering::Relaxed);
            (overflows << 16) | counter as u64
        })
    }

    /// Microseconds since start-up, as a 64-bit value
    pub fn micros(&self) -> u64 {
        self.config.counts_to_us(self.counts())
    }

    /// Milliseconds since start-up (wraps after ~49 days)
    pub fn tick_ms(&self) -> u32 {
        (self.micros() / 1000) as u32
    }

    /// Microseconds since start-up (wraps after ~71 minutes)
    pub fn tick_us(&self) -> u32 {
        self.micros() as u32
    }

    /// Busy-wait for at least `ms` milliseconds
    ///
    /// Returns immediately while the timebase is suspended.
    pub fn wait_ms(&self, ms: u32) {
        if self.is_suspended() {
            #[cfg(feature = "defmt")]
            defmt::warn!("systime: wait_ms({}) while suspended", ms);
            return;
        }
        self.wait_counts(self.config.us_to_counts(ms as u64 * 1000));
    }

    /// Busy-wait for at least `us` microseconds
    pub fn wait_us(&self, us: u32) {
        self.wait_counts(self.config.us_to_counts(us as u64));
    }

    fn wait_counts(&self, counts: u64) {
        if counts == 0 || self.is_suspended() {
            return;
        }
        let start = self.counts();
        while self.counts().wrapping_sub(start) < counts {}
    }

    /// Stop the timer; time stands still until [`SystemTime::resume`]
    pub fn suspend(&self) {
        self.timer.lock(|timer| {
            let mut timer = timer.borrow_mut();
            timer.stop();
            timer.disable_interrupt();
        });
        self.suspended.store(true, Ordering::Relaxed);

        #[cfg(feature = "defmt")]
        defmt::debug!("systime: suspended");
    }

    /// Restart the timer after [`SystemTime::suspend`]
    pub fn resume(&self) {
        self.timer.lock(|timer| {
            let mut timer = timer.borrow_mut();
            timer.enable_interrupt();
            timer.start();
        });
        self.suspended.store(false, Ordering::Relaxed);

        #[cfg(feature = "defmt")]
        defmt::debug!("systime: resumed");
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended.load(Ordering::Relaxed)
    }

    /// Delay provider backed by this timebase
    pub fn delay(&self) -> Delay<'_, T> {
        Delay { time: self }
    }
}

impl<B: RegisterBus> SystemTime<Timer0<B>> {
    /// Apply the Timer0 settings of the configuration, then [`SystemTime::init`]
    pub fn init_timer0(&self) -> Result<(), ConfigError> {
        self.config.validate()?;
        let timer0 = self.config.timer0();
        self.timer
            .lock(|timer| timer.borrow_mut().configure(&timer0));
        self.init()
    }
}

impl<T: HardwareTimer> Clock for SystemTime<T> {
    fn now_ms(&self) -> u32 {
        self.tick_ms()
    }

    fn now_us(&self) -> u32 {
        self.tick_us()
    }
}

/// Busy-wait delay on top of a [`SystemTime`]
///
/// Every delay counts timer ticks, so it lasts at least the requested time.
/// While the timebase is suspended the timer is stopped and delays return
/// at once: do not drive bit timing (e.g. a software UART) from a suspended
/// timebase.
pub struct Delay<'a, T> {
    time: &'a SystemTime<T>,
}

impl<T: HardwareTimer> DelayNs for Delay<'_, T> {
    fn delay_ns(&mut self, ns: u32) {
        if self.time.is_suspended() {
            #[cfg(feature = "defmt")]
            defmt::warn!("systime: delay_ns({}) skipped, timebase suspended", ns);
            return;
        }
        self.time.wait_counts(self.time.config.ns_to_counts(ns));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Mock timer that advances by `step` counts on every read
    struct MockTimer {
        counter: u16,
        step: u16,
        running: bool,
        pending: bool,
        irq_enabled: bool,
    }

    impl MockTimer {
        fn new(step: u16) -> Self {
            Self {
                counter: 0x1234,
                step,
                running: false,
                pending: true,
                irq_enabled: false,
            }
        }
    }

    impl HardwareTimer for MockTimer {
        fn start(&mut self) {
            self.running = true;
        }

        fn stop(&mut self) {
            self.running = false;
        }

        fn is_running(&self) -> bool {
            self.running
        }

        fn counter(&mut self) -> u16 {
            if self.running {
                let (next, wrapped) = self.counter.overflowing_add(self.step);
                self.counter = next;
                self.pending |= wrapped;
            }
            self.counter
        }

        fn reset_counter(&mut self) {
            self.counter = 0;
        }

        fn overflow_pending(&self) -> bool {
            self.pending
        }

        fn clear_overflow(&mut self) {
            self.pending = false;
        }

        fn enable_interrupt(&mut self) {
            self.irq_enabled = true;
        }

        fn disable_interrupt(&mut self) {
            self.irq_enabled = false;
        }
    }

    fn with_timer<R>(time: &SystemTime<MockTimer>, f: impl FnOnce(&mut MockTimer) -> R) -> R {
        time.timer.lock(|t| f(&mut t.borrow_mut()))
    }

    fn started(step: u16, config: SystemTimeConfig) -> SystemTime<MockTimer> {
        let time = SystemTime::new(MockTimer::new(step), config);
        time.init().unwrap();
        time
    }

    #[test]
    fn test_init_resets_and_starts() {
        let time = started(0, SystemTimeConfig::default());

        with_timer(&time, |t| {
            assert!(t.running);
            assert!(t.irq_enabled);
            assert!(!t.pending);
            assert_eq!(t.counter, 0);
        });
        assert_eq!(time.tick_us(), 0);
        assert!(!time.is_suspended());
    }

    #[test]
    fn test_invalid_oscillator() {
        for osc_mhz in [0, 41] {
            let time = SystemTime::new(
                MockTimer::new(0),
                SystemTimeConfig {
                    osc_mhz,
                    prescaler: None,
                },
            );
            assert_eq!(time.init(), Err(ConfigError::InvalidOscillator));
        }
    }

    #[test]
    fn test_counts_to_time_at_4mhz() {
        let time = started(0, SystemTimeConfig::default());
        with_timer(&time, |t| t.counter = 2500);

        // 4 MHz, no prescaler: one count per microsecond
        assert_eq!(time.tick_us(), 2500);
        assert_eq!(time.tick_ms(), 2);
    }

    #[test]
    fn test_overflows_accumulate() {
        let time = started(0, SystemTimeConfig::default());

        assert!(!time.on_interrupt());
        with_timer(&time, |t| t.pending = true);
        assert!(time.on_interrupt());
        with_timer(&time, |t| t.pending = true);
        assert!(time.on_interrupt());
        with_timer(&time, |t| t.counter = 100);

        assert_eq!(time.counts(), 2 * 65536 + 100);
        assert_eq!(time.tick_us(), 131_172);
        assert_eq!(time.tick_ms(), 131);
    }

    #[test]
    fn test_unserviced_overflow_is_counted() {
        let time = started(0, SystemTimeConfig::default());
        with_timer(&time, |t| {
            t.counter = 10;
            t.pending = true;
        });

        assert_eq!(time.counts(), 65536 + 10);
        // Already accounted: the late interrupt finds nothing to do
        assert!(!time.on_interrupt());
        assert_eq!(time.counts(), 65536 + 10);
    }

    #[test]
    fn test_oscillator_and_prescaler_scaling() {
        let time = started(
            0,
            SystemTimeConfig {
                osc_mhz: 16,
                prescaler: None,
            },
        );
        with_timer(&time, |t| t.counter = 4000);
        assert_eq!(time.tick_us(), 1000);

        let time = started(
            0,
            SystemTimeConfig {
                osc_mhz: 4,
                prescaler: Some(Prescaler::Div8),
            },
        );
        with_timer(&time, |t| t.counter = 125);
        assert_eq!(time.tick_us(), 1000);
        assert_eq!(time.tick_ms(), 1);
    }

    #[test]
    fn test_tick_us_wraps() {
        let time = started(0, SystemTimeConfig::default());
        // 2^32 us at one count per us = 65536 overflows
        time.overflows.store(65536, Ordering::Relaxed);
        with_timer(&time, |t| t.counter = 7);

        assert_eq!(time.tick_us(), 7);
        assert_eq!(time.tick_ms(), 4_294_967);
    }

    #[test]
    fn test_suspend_freezes_time() {
        let time = started(50, SystemTimeConfig::default());
        let before = time.tick_us();
        assert!(before > 0);

        time.suspend();
        assert!(time.is_suspended());
        with_timer(&time, |t| {
            assert!(!t.running);
            assert!(!t.irq_enabled);
        });
        let frozen = time.tick_us();
        assert_eq!(time.tick_us(), frozen);

        // Returns at once instead of spinning forever
        time.wait_ms(10);

        time.resume();
        assert!(!time.is_suspended());
        assert!(time.tick_us() > frozen);
    }

    #[test]
    fn test_wait_ms() {
        let time = started(100, SystemTimeConfig::default());
        let start = time.tick_ms();

        time.wait_ms(20);
        assert!(time.tick_ms().wrapping_sub(start) >= 20);
    }

    #[test]
    fn test_wait_spans_many_wraps_without_interrupts() {
        // 4096 counts per read: a wrap every 16 reads, never serviced by an ISR
        let time = started(4096, SystemTimeConfig::default());
        let start = time.tick_ms();

        time.wait_ms(500);
        let elapsed = time.tick_ms().wrapping_sub(start);
        assert!((500..530).contains(&elapsed), "waited {} ms", elapsed);
    }

    #[test]
    fn test_delay_ms_lasts_full_millisecond() {
        // Start 3 us short of a millisecond boundary, 1 us per read
        let time = started(1, SystemTimeConfig::default());
        with_timer(&time, |t| t.counter = 997);

        time.delay().delay_ms(1);
        let end = with_timer(&time, |t| t.counter);
        assert!(end - 997 >= 1000, "returned after {} us", end - 997);
    }

    #[test]
    fn test_delay_returns_while_suspended() {
        let time = started(1, SystemTimeConfig::default());
        time.suspend();
        let frozen = time.counts();

        time.delay().delay_us(100);
        assert_eq!(time.counts(), frozen);
    }

    #[test]
    fn test_delay_ns_rounds_up() {
        let config = SystemTimeConfig::default();
        assert_eq!(config.ns_to_counts(0), 0);
        assert_eq!(config.ns_to_counts(1), 1);
        assert_eq!(config.ns_to_counts(1000), 1);
        assert_eq!(config.ns_to_counts(104_167), 105);

        let config = SystemTimeConfig {
            osc_mhz: 40,
            prescaler: None,
        };
        // 100 ns per count
        assert_eq!(config.ns_to_counts(1000), 10);
        assert_eq!(config.us_to_counts(3), 30);

        let config = SystemTimeConfig {
            osc_mhz: 4,
            prescaler: Some(Prescaler::Div8),
        };
        // 8 us per count
        assert_eq!(config.us_to_counts(500_000), 62_500);
        assert_eq!(config.us_to_counts(9), 2);
    }

    #[test]
    fn test_delay_provider() {
        let time = started(10, SystemTimeConfig::default());
        let mut delay = time.delay();
        let start = time.counts();

        delay.delay_us(500);
        assert!(time.counts() - start >= 500);
    }

    #[test]
    fn test_clock_impl() {
        let time = started(0, SystemTimeConfig::default());
        with_timer(&time, |t| t.counter = 3000);

        assert_eq!(time.now_ms(), 3);
        assert_eq!(time.now_us(), 3000);
    }
}
