//! GPIO interrupt abstractions
//!
//! Digital pins themselves use the `embedded-hal` traits; this module only
//! covers the edge-triggered external interrupt lines (INT0-INT2 on PIC18)
//! the software UART receiver is driven by.

/// Signal edge that triggers an external interrupt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    /// Low-to-high transition
    Rising,
    /// High-to-low transition
    Falling,
}

/// Edge-triggered interrupt line
pub trait EdgeInterrupt {
    /// Select the triggering edge
    fn set_edge(&mut self, edge: Edge);

    /// Enable the interrupt
    fn enable(&mut self);

    /// Disable the interrupt
    fn disable(&mut self);

    /// Check if the interrupt is enabled
    fn is_enabled(&self) -> bool;

    /// Check if the interrupt flag is set
    fn is_pending(&self) -> bool;

    /// Clear the interrupt flag
    fn clear_pending(&mut self);
}
