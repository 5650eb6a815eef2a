//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in synchron-core for the generator's peripherals:
//!
//! - Real-time clock (DS3231): time source and 1 Hz pulse source
//! - Status LED blinking the generator state

#![no_std]
#![deny(unsafe_code)]

pub mod rtc;
pub mod status_led;
