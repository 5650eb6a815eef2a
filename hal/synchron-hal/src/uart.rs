//! UART serial communication abstractions
//!
//! Provides the transmit trait and frame format description used by the
//! telegram transport. The frame format also feeds the lead-time
//! calculation, so it must describe the wire exactly.

/// UART transmitter
pub trait UartTx {
    /// Error type for transmit operations
    type Error;

    /// Write data to the UART
    ///
    /// Blocks until all data has been accepted by the peripheral or an
    /// error occurs.
    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Block until all written data has left the shift register
    fn flush(&mut self) -> Result<(), Self::Error>;
}

/// UART configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartConfig {
    /// Baud rate in bits per second
    pub baudrate: u32,
    /// Number of data bits
    pub data_bits: DataBits,
    /// Parity mode
    pub parity: Parity,
    /// Number of stop bits
    pub stop_bits: StopBits,
}

impl Default for UartConfig {
    fn default() -> Self {
        Self {
            baudrate: 115200,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
        }
    }
}

impl UartConfig {
    /// Bits on the wire for one character, including start, parity and stop bits
    pub const fn bits_per_char(&self) -> u32 {
        1 + self.data_bits.count() + self.parity.count() + self.stop_bits.count()
    }
}

/// Number of data bits per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataBits {
    Seven,
    Eight,
}

impl DataBits {
    /// Number of bits
    pub const fn count(self) -> u32 {
        match self {
            DataBits::Seven => 7,
            DataBits::Eight => 8,
        }
    }
}

/// Parity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    None,
    Even,
    Odd,
}

impl Parity {
    /// Number of parity bits on the wire
    pub const fn count(self) -> u32 {
        match self {
            Parity::None => 0,
            Parity::Even | Parity::Odd => 1,
        }
    }
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopBits {
    One,
    Two,
}

impl StopBits {
    /// Number of bits
    pub const fn count(self) -> u32 {
        match self {
            StopBits::One => 1,
            StopBits::Two => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bits_per_char_8n1() {
        assert_eq!(UartConfig::default().bits_per_char(), 10);
    }

    #[test]
    fn test_bits_per_char_7e1() {
        let config = UartConfig {
            baudrate: 9600,
            data_bits: DataBits::Seven,
            parity: Parity::Even,
            stop_bits: StopBits::One,
        };
        assert_eq!(config.bits_per_char(), 10);
    }

    #[test]
    fn test_bits_per_char_8o2() {
        let config = UartConfig {
            baudrate: 9600,
            data_bits: DataBits::Eight,
            parity: Parity::Odd,
            stop_bits: StopBits::Two,
        };
        assert_eq!(config.bits_per_char(), 12);
    }
}
