//! Receive buffer shared between the RX interrupt and the main loop

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use heapless::Deque;
use portable_atomic::{AtomicBool, Ordering};

/// Receive error flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RxStatus {
    /// A byte arrived while the buffer was full and was dropped
    pub overflow: bool,
    /// A frame with a low stop bit was dropped
    pub framing_error: bool,
}

impl RxStatus {
    pub const OVERFLOW: u8 = 0x01;
    pub const FRAMING_ERROR: u8 = 0x02;

    /// Status byte: bit 0 overflow, bit 1 framing error
    pub fn bits(&self) -> u8 {
        let mut bits = 0;
        if self.overflow {
            bits |= Self::OVERFLOW;
        }
        if self.framing_error {
            bits |= Self::FRAMING_ERROR;
        }
        bits
    }

    pub fn is_clear(&self) -> bool {
        !self.overflow && !self.framing_error
    }
}

struct RxState<const N: usize> {
    buf: Deque<u8, N>,
    status: RxStatus,
}

/// Bounded FIFO of received bytes plus error flags
///
/// Meant to live in a `static`; the interrupt handler pushes and the main
/// loop pops, each access inside a critical section.
pub struct RxChannel<const N: usize> {
    state: Mutex<CriticalSectionRawMutex, RefCell<RxState<N>>>,
    suspended: AtomicBool,
}

impl<const N: usize> Default for RxChannel<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> RxChannel<N> {
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(RefCell::new(RxState {
                buf: Deque::new(),
                status: RxStatus {
                    overflow: false,
                    framing_error: false,
                },
            })),
            suspended: AtomicBool::new(false),
        }
    }

    /// Buffer capacity
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Append a received byte
    ///
    /// When full the byte is dropped, the overflow flag set and `false`
    /// returned.
    pub fn push(&self, byte: u8) -> bool {
        self.state.lock(|s| {
            let mut s = s.borrow_mut();
            if s.buf.push_back(byte).is_err() {
                s.status.overflow = true;
                false
            } else {
                true
            }
        })
    }

    pub fn pop(&self) -> Option<u8> {
        self.state.lock(|s| s.borrow_mut().buf.pop_front())
    }

    pub fn len(&self) -> usize {
        self.state.lock(|s| s.borrow().buf.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Discard buffered bytes; status flags are kept
    pub fn clear(&self) {
        self.state.lock(|s| s.borrow_mut().buf.clear());
    }

    pub fn set_framing_error(&self) {
        self.state.lock(|s| s.borrow_mut().status.framing_error = true);
    }

    pub fn status(&self) -> RxStatus {
        self.state.lock(|s| s.borrow().status)
    }

    /// Read and clear the status flags
    pub fn take_status(&self) -> RxStatus {
        self.state
            .lock(|s| core::mem::take(&mut s.borrow_mut().status))
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended.load(Ordering::Acquire)
    }

    pub fn set_suspended(&self, suspended: bool) {
        self.suspended.store(suspended, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static SHARED: RxChannel<4> = RxChannel::new();

    #[test]
    fn test_fifo_order() {
        let channel: RxChannel<4> = RxChannel::new();
        assert!(channel.is_empty());
        channel.push(1);
        channel.push(2);
        assert_eq!(channel.len(), 2);
        assert_eq!(channel.pop(), Some(1));
        assert_eq!(channel.pop(), Some(2));
        assert_eq!(channel.pop(), None);
    }

    #[test]
    fn test_overflow_drops_newest() {
        let channel: RxChannel<2> = RxChannel::new();
        assert!(channel.push(1));
        assert!(channel.push(2));
        assert!(!channel.push(3));

        assert!(channel.status().overflow);
        assert_eq!(channel.pop(), Some(1));
        assert_eq!(channel.pop(), Some(2));
        assert_eq!(channel.pop(), None);
    }

    #[test]
    fn test_status_bits() {
        let channel: RxChannel<1> = RxChannel::new();
        assert!(channel.status().is_clear());

        channel.set_framing_error();
        channel.push(0);
        channel.push(0);
        let status = channel.take_status();
        assert_eq!(status.bits(), RxStatus::OVERFLOW | RxStatus::FRAMING_ERROR);
        assert!(channel.status().is_clear());
    }

    #[test]
    fn test_clear_keeps_status() {
        let channel: RxChannel<1> = RxChannel::new();
        channel.push(5);
        channel.push(6);
        channel.clear();
        assert!(channel.is_empty());
        assert!(channel.status().overflow);
    }

    #[test]
    fn test_static_channel() {
        SHARED.set_suspended(true);
        assert!(SHARED.is_suspended());
        SHARED.set_suspended(false);
        assert_eq!(SHARED.capacity(), 4);
    }
}
