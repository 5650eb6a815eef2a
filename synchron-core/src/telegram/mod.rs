//! IF482 time telegram
//!
//! The IF482 telegram announces date and time as 17 ASCII characters over a
//! serial line (9600 baud, 7 data bits, even parity, 1 stop bit). The
//! telegram ends at the beginning of the second it announces.
//!
//! ```text
//! ┌───┬─────┬────────┬──────────┬─────────┬──────────┬────┐
//! │ O │ MON │ SEASON │ YY MM DD │ WEEKDAY │ hh mm ss │ CR │
//! │ 1 │ 1   │ 1      │ 6        │ 1       │ 6        │ 1  │
//! └───┴─────┴────────┴──────────┴─────────┴──────────┴────┘
//! ```

pub mod encoder;

pub use encoder::{encode, encode_with_sentinel, Telegram};

use synchron_hal::{DataBits, Parity, StopBits, UartConfig};

/// Length of every telegram in bytes
pub const TELEGRAM_LEN: usize = 17;

/// Start of telegram
pub const START_BYTE: u8 = b'O';

/// End of telegram (carriage return)
pub const END_BYTE: u8 = b'\r';

/// Season byte: local time
pub const SEASON_LOCAL: u8 = b'L';

/// Monitor byte: time received correctly
pub const MONITOR_FRESH: u8 = b'A';

/// Monitor byte: time source lost
pub const MONITOR_STALE: u8 = b'M';

/// Monitor byte: no time ever established
pub const MONITOR_UNSET: u8 = b'?';

/// Date/time region sent when no confident time is available
pub const FALLBACK_DIGITS: &[u8; 13] = b"000000F000000";

/// Default IF482 baud rate
pub const DEFAULT_BAUDRATE: u32 = 9600;

/// Serial frame format mandated by IF482 (7E1) at the given baud rate
pub const fn serial_config(baudrate: u32) -> UartConfig {
    UartConfig {
        baudrate,
        data_bits: DataBits::Seven,
        parity: Parity::Even,
        stop_bits: StopBits::One,
    }
}
