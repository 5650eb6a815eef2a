//! Blocking UART transmitter
//!
//! The telegram must leave the line in one uninterrupted burst, so the
//! transport uses the blocking driver: the write returns once the FIFO has
//! accepted the last byte and the flush returns once it has been shifted out.

use embassy_rp::uart::{self, Blocking};
use synchron_hal::{DataBits, Parity, StopBits, UartConfig, UartTx};

/// UART transmit errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UartError {
    /// Peripheral reported a line error
    Line,
}

impl From<uart::Error> for UartError {
    fn from(_: uart::Error) -> Self {
        UartError::Line
    }
}

/// Convert a frame description into the embassy-rp configuration
pub fn rp_uart_config(config: &UartConfig) -> uart::Config {
    let mut cfg = uart::Config::default();
    cfg.baudrate = config.baudrate;
    cfg.data_bits = match config.data_bits {
        DataBits::Seven => uart::DataBits::DataBits7,
        DataBits::Eight => uart::DataBits::DataBits8,
    };
    cfg.parity = match config.parity {
        Parity::None => uart::Parity::ParityNone,
        Parity::Even => uart::Parity::ParityEven,
        Parity::Odd => uart::Parity::ParityOdd,
    };
    cfg.stop_bits = match config.stop_bits {
        StopBits::One => uart::StopBits::STOP1,
        StopBits::Two => uart::StopBits::STOP2,
    };
    cfg
}

/// Telegram transport on an RP2040 UART
pub struct RpUartTx<'d> {
    tx: uart::UartTx<'d, Blocking>,
}

impl<'d> RpUartTx<'d> {
    pub fn new(tx: uart::UartTx<'d, Blocking>) -> Self {
        Self { tx }
    }
}

impl UartTx for RpUartTx<'_> {
    type Error = UartError;

    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.tx.blocking_write(data)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.tx.blocking_flush()?;
        Ok(())
    }
}
