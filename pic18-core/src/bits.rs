//! Bit manipulation helpers for byte registers

/// Read bit `bit` of `reg`
#[inline]
pub const fn read(reg: u8, bit: u8) -> bool {
    (reg >> bit) & 0x01 != 0
}

/// Return `reg` with bit `bit` set
#[inline]
pub const fn set(reg: u8, bit: u8) -> u8 {
    reg | (1 << bit)
}

/// Return `reg` with bit `bit` cleared
#[inline]
pub const fn clear(reg: u8, bit: u8) -> u8 {
    reg & !(1 << bit)
}

/// Return `reg` with bit `bit` inverted
#[inline]
pub const fn toggle(reg: u8, bit: u8) -> u8 {
    reg ^ (1 << bit)
}

/// Return `reg` with bit `bit` forced to `high`
#[inline]
pub const fn write(reg: u8, bit: u8, high: bool) -> u8 {
    if high {
        set(reg, bit)
    } else {
        clear(reg, bit)
    }
}

/// Replace the bits selected by `mask` in `data` with those of `value`
///
/// Bits outside `mask` keep their value from `data`.
#[inline]
pub const fn modify(mask: u8, data: u8, value: u8) -> u8 {
    (data & !mask) | (value & mask)
}
