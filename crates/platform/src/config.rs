//! Application configuration and constants
//!
//! Central configuration values used across the firmware. Device ids follow
//! the hardware handoff: one PS UART and one AXI DMA core in the PL.

/// The application name
pub const APP_NAME: &str = "BiSS DMA Monitor";

/// Application version (synchronized with Cargo.toml)
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Banner printed on the serial console once the UART is up.
pub const BANNER: &str = "Starting DMA->UART example";

/// Serial console device id (first PS UART instance in the handoff).
pub const UART_DEVICE_ID: u16 = 0;

/// AXI DMA device id (first AXI DMA core in the handoff).
pub const DMA_DEVICE_ID: u16 = 0;

/// Bytes moved per S2MM transfer.
pub const TRANSFER_LEN: usize = 256;

/// Delay between CSV records (ms).
pub const REPORT_INTERVAL_MS: u32 = 100;

/// Delay between raw echo frames (ms), as used by the first board bring-up.
pub const RAW_ECHO_INTERVAL_MS: u32 = 1_000;

/// Serial console baud rate.
pub const CONSOLE_BAUD_RATE: u32 = 115_200;
