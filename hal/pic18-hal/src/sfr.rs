//! Special function register access
//!
//! PIC18 peripherals are controlled through byte-wide special function
//! registers (SFRs) in the top of the data memory (0xF80-0xFFF on the
//! PIC18F452). Everything in this workspace reaches the hardware through
//! [`RegisterBus`], so peripheral logic can be exercised against
//! [`RegisterFile`] on the host.

use core::cell::Cell;

/// First address of the SFR bank
pub const SFR_BANK_START: u16 = 0xF80;

/// Number of byte registers in the SFR bank
pub const SFR_BANK_SIZE: usize = 0x80;

/// Byte-wide register access by address
///
/// Methods take `&self`: registers behave like volatile memory cells and
/// several peripheral drivers share the same bus.
pub trait RegisterBus {
    /// Read the register at `addr`
    fn read(&self, addr: u16) -> u8;

    /// Write `value` to the register at `addr`
    fn write(&self, addr: u16, value: u8);

    /// Read-modify-write the register at `addr`
    fn modify<F: FnOnce(u8) -> u8>(&self, addr: u16, f: F) {
        let value = self.read(addr);
        self.write(addr, f(value));
    }

    /// Set every bit of `mask` in the register at `addr`
    fn set_bits(&self, addr: u16, mask: u8) {
        self.modify(addr, |v| v | mask);
    }

    /// Clear every bit of `mask` in the register at `addr`
    fn clear_bits(&self, addr: u16, mask: u8) {
        self.modify(addr, |v| v & !mask);
    }

    /// Check whether any bit of `mask` is set in the register at `addr`
    fn any_set(&self, addr: u16, mask: u8) -> bool {
        self.read(addr) & mask != 0
    }
}

impl<B: RegisterBus + ?Sized> RegisterBus for &B {
    fn read(&self, addr: u16) -> u8 {
        (**self).read(addr)
    }

    fn write(&self, addr: u16, value: u8) {
        (**self).write(addr, value)
    }
}

/// In-memory SFR bank
///
/// Plain storage for 0xF80-0xFFF with no side effects: writing a flag
/// register does not trigger anything and read-only bits are writable.
/// Accesses outside the bank read as zero and writes are dropped.
pub struct RegisterFile {
    regs: [Cell<u8>; SFR_BANK_SIZE],
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::new()
    }
}

impl RegisterFile {
    /// Create a register file with every register cleared
    pub fn new() -> Self {
        Self {
            regs: core::array::from_fn(|_| Cell::new(0)),
        }
    }

    fn slot(&self, addr: u16) -> Option<&Cell<u8>> {
        let index = addr.checked_sub(SFR_BANK_START)? as usize;
        self.regs.get(index)
    }
}

impl RegisterBus for RegisterFile {
    fn read(&self, addr: u16) -> u8 {
        self.slot(addr).map(Cell::get).unwrap_or(0)
    }

    fn write(&self, addr: u16, value: u8) {
        if let Some(slot) = self.slot(addr) {
            slot.set(value);
        }
    }
}
