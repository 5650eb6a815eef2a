//! RP2040-specific HAL for the telegram generator
//!
//! This crate provides RP2040 implementations of the shared
//! `synchron-hal` traits on top of `embassy-rp`:
//!
//! - Blocking UART transmitter for the telegram line (7E1)
//! - GPIO output for the status LED

#![no_std]

pub mod gpio;
pub mod uart;

pub use gpio::RpOutput;
pub use uart::{rp_uart_config, RpUartTx, UartError};
