//! Software UART configuration

use pic18_hal::uart::StopBits;

/// Highest baud rate the receiver can sample reliably
pub const MAX_RX_BPS: u32 = 57_600;

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Not one of the supported baud rates
    UnsupportedBaud,
    /// Baud rate too fast for the receiver
    RxBaudTooHigh,
}

/// Supported baud rates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BaudRate {
    B9600,
    B19200,
    B38400,
    B57600,
    B115200,
    B128000,
}

impl BaudRate {
    pub const ALL: [BaudRate; 6] = [
        BaudRate::B9600,
        BaudRate::B19200,
        BaudRate::B38400,
        BaudRate::B57600,
        BaudRate::B115200,
        BaudRate::B128000,
    ];

    /// Bits per second
    pub const fn bps(self) -> u32 {
        match self {
            BaudRate::B9600 => 9_600,
            BaudRate::B19200 => 19_200,
            BaudRate::B38400 => 38_400,
            BaudRate::B57600 => 57_600,
            BaudRate::B115200 => 115_200,
            BaudRate::B128000 => 128_000,
        }
    }

    /// Duration of one bit in nanoseconds
    pub const fn bit_time_ns(self) -> u32 {
        1_000_000_000 / self.bps()
    }

    /// Check if the receiver can run at this rate
    pub const fn supports_rx(self) -> bool {
        self.bps() <= MAX_RX_BPS
    }

    /// Look up a baud rate by its value in bits per second
    pub fn from_bps(bps: u32) -> Result<Self, ConfigError> {
        Self::ALL
            .into_iter()
            .find(|b| b.bps() == bps)
            .ok_or(ConfigError::UnsupportedBaud)
    }
}

/// Software UART configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SoftUartConfig {
    pub baud: BaudRate,
    /// Stop bits sent by the transmitter; the receiver checks one
    pub stop_bits: StopBits,
}

impl Default for SoftUartConfig {
    fn default() -> Self {
        Self {
            baud: BaudRate::B9600,
            stop_bits: StopBits::One,
        }
    }
}

impl SoftUartConfig {
    pub fn new(baud: BaudRate) -> Self {
        Self {
            baud,
            ..Self::default()
        }
    }

    /// Check the configuration for use by a receiver
    pub fn validate_rx(&self) -> Result<(), ConfigError> {
        if self.baud.supports_rx() {
            Ok(())
        } else {
            Err(ConfigError::RxBaudTooHigh)
        }
    }

    pub fn bit_time_ns(&self) -> u32 {
        self.baud.bit_time_ns()
    }

    /// Number of stop bit periods sent per frame
    pub fn stop_bit_count(&self) -> u8 {
        match self.stop_bits {
            StopBits::One => 1,
            StopBits::Two => 2,
        }
    }

    /// Line bit periods per transmitted frame
    pub fn frame_bits(&self) -> u8 {
        1 + 8 + self.stop_bit_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_times() {
        assert_eq!(BaudRate::B9600.bit_time_ns(), 104_166);
        assert_eq!(BaudRate::B57600.bit_time_ns(), 17_361);
        assert_eq!(BaudRate::B128000.bit_time_ns(), 7_812);
    }

    #[test]
    fn test_rx_limit() {
        assert!(BaudRate::B57600.supports_rx());
        assert!(!BaudRate::B115200.supports_rx());

        let fast = SoftUartConfig::new(BaudRate::B115200);
        assert_eq!(fast.validate_rx(), Err(ConfigError::RxBaudTooHigh));
        assert_eq!(SoftUartConfig::default().validate_rx(), Ok(()));
    }

    #[test]
    fn test_from_bps() {
        assert_eq!(BaudRate::from_bps(38_400), Ok(BaudRate::B38400));
        assert_eq!(BaudRate::from_bps(4_800), Err(ConfigError::UnsupportedBaud));
    }

    #[test]
    fn test_frame_bits() {
        assert_eq!(SoftUartConfig::default().frame_bits(), 10);
        let two = SoftUartConfig {
            stop_bits: StopBits::Two,
            ..SoftUartConfig::default()
        };
        assert_eq!(two.frame_bits(), 11);
    }
}
