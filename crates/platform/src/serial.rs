//! Serial console abstraction
//!
//! The console is a blocking byte sink. Writing uses [`embedded_io::Write`]
//! so `write!` and `write_all` work on any implementation; this module only
//! adds the vendor-style lookup and initialize lifecycle plus line settings.

use crate::config::CONSOLE_BAUD_RATE;

/// Blocking serial console with a lookup/initialize lifecycle.
pub trait SerialConsole: embedded_io::Write {
    /// Static hardware configuration for one UART instance.
    type Config;

    /// Find the configuration for `device_id`, `None` if no such UART exists.
    fn lookup_config(&self, device_id: u16) -> Option<Self::Config>;

    /// Initialize the UART with the given line settings.
    fn initialize(&mut self, config: &Self::Config, line: UartConfig) -> Result<(), Self::Error>;
}

impl<T: SerialConsole + ?Sized> SerialConsole for &mut T {
    type Config = T::Config;

    fn lookup_config(&self, device_id: u16) -> Option<Self::Config> {
        (**self).lookup_config(device_id)
    }

    fn initialize(&mut self, config: &Self::Config, line: UartConfig) -> Result<(), Self::Error> {
        (**self).initialize(config, line)
    }
}

/// UART line configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartConfig {
    /// Baud rate
    pub baud_rate: u32,
    /// Data bits
    pub data_bits: DataBits,
    /// Parity
    pub parity: Parity,
    /// Stop bits
    pub stop_bits: StopBits,
}

impl Default for UartConfig {
    /// 115200 8N1.
    fn default() -> Self {
        Self {
            baud_rate: CONSOLE_BAUD_RATE,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
        }
    }
}

/// Data bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DataBits {
    /// 6 data bits
    Six,
    /// 7 data bits
    Seven,
    /// 8 data bits
    Eight,
}

/// Parity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    /// No parity
    None,
    /// Even parity
    Even,
    /// Odd parity
    Odd,
}

/// Stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopBits {
    /// 1 stop bit
    One,
    /// 1.5 stop bits
    OnePointFive,
    /// 2 stop bits
    Two,
}
