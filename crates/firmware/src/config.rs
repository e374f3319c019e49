//! Acquisition configuration
//!
//! Runtime value type assembled from the compile-time constants in
//! [`platform::config`]. Two presets exist: [`AcquisitionConfig::csv`] is the
//! production behaviour; [`AcquisitionConfig::raw_echo`] reproduces the first
//! board bring-up, which forwarded the raw buffer without decoding it.

use platform::config::{
    DMA_DEVICE_ID, RAW_ECHO_INTERVAL_MS, REPORT_INTERVAL_MS, TRANSFER_LEN, UART_DEVICE_ID,
};
use platform::{PollLimit, UartConfig};

/// What the console receives each cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputFormat {
    /// Header once, then one decoded record per cycle.
    #[default]
    Csv,
    /// The whole receive buffer, byte for byte, every cycle.
    RawEcho,
}

/// Settings for bring-up and the acquisition loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AcquisitionConfig {
    /// Serial console device id
    pub uart_device_id: u16,
    /// AXI DMA device id
    pub dma_device_id: u16,
    /// Bytes per transfer (clamped to the buffer handle's size)
    pub transfer_len: usize,
    /// Pacing delay between cycles (ms)
    pub report_interval_ms: u32,
    /// Console output mode
    pub output: OutputFormat,
    /// Completion wait policy
    pub poll_limit: PollLimit,
    /// Console line settings
    pub line: UartConfig,
}

impl AcquisitionConfig {
    /// CSV records every 100 ms, unbounded completion wait.
    pub const fn csv() -> Self {
        Self {
            uart_device_id: UART_DEVICE_ID,
            dma_device_id: DMA_DEVICE_ID,
            transfer_len: TRANSFER_LEN,
            report_interval_ms: REPORT_INTERVAL_MS,
            output: OutputFormat::Csv,
            poll_limit: PollLimit::Unbounded,
            line: default_line(),
        }
    }

    /// Raw buffer echo every second.
    pub const fn raw_echo() -> Self {
        Self {
            report_interval_ms: RAW_ECHO_INTERVAL_MS,
            output: OutputFormat::RawEcho,
            ..Self::csv()
        }
    }

    /// Give up waiting for the engine after `polls` busy polls.
    pub const fn with_poll_limit(mut self, polls: u32) -> Self {
        self.poll_limit = PollLimit::MaxPolls(polls);
        self
    }

    /// Override the pacing delay.
    pub const fn with_interval_ms(mut self, ms: u32) -> Self {
        self.report_interval_ms = ms;
        self
    }
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self::csv()
    }
}

// `UartConfig::default()` is not const.
const fn default_line() -> UartConfig {
    UartConfig {
        baud_rate: platform::config::CONSOLE_BAUD_RATE,
        data_bits: platform::DataBits::Eight,
        parity: platform::Parity::None,
        stop_bits: platform::StopBits::One,
    }
}
