//! Zynq PS UART (Cadence UART) in polled mode.
//!
//! Transmit only: the acquisition loop never reads the console. Writes
//! block while the 64-byte TX FIFO is full.

use embedded_io::{ErrorKind, ErrorType, Write};
use platform::{DataBits, Parity, SerialConsole, StopBits, UartConfig};

use super::{Mmio, UART1_BASE, UART_REF_CLK_HZ};

const CR: usize = 0x00;
const MR: usize = 0x04;
const BAUDGEN: usize = 0x18;
const SR: usize = 0x2C;
const FIFO: usize = 0x30;
const BAUDDIV: usize = 0x34;

const CR_RXRST: u32 = 1 << 0;
const CR_TXRST: u32 = 1 << 1;
const CR_RX_EN: u32 = 1 << 2;
const CR_RX_DIS: u32 = 1 << 3;
const CR_TX_EN: u32 = 1 << 4;
const CR_TX_DIS: u32 = 1 << 5;

const MR_CHRL_8: u32 = 0b00 << 1;
const MR_CHRL_7: u32 = 0b10 << 1;
const MR_CHRL_6: u32 = 0b11 << 1;
const MR_PAR_EVEN: u32 = 0b000 << 3;
const MR_PAR_ODD: u32 = 0b001 << 3;
const MR_PAR_NONE: u32 = 0b100 << 3;
const MR_STOP_1: u32 = 0b00 << 6;
const MR_STOP_1_5: u32 = 0b01 << 6;
const MR_STOP_2: u32 = 0b10 << 6;

const SR_TXEMPTY: u32 = 1 << 3;
const SR_TXFULL: u32 = 1 << 4;

const BDIV_MIN: u32 = 4;
const BDIV_MAX: u32 = 254;
const CD_MAX: u32 = 0xFFFF;

/// Largest accepted baud error, in percent.
pub const MAX_BAUD_ERROR_PERCENT: u32 = 3;

/// Static description of one PS UART.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartPsConfig {
    /// Device id
    pub device_id: u16,
    /// Register block base address
    pub base: usize,
    /// UART reference clock
    pub ref_clk_hz: u32,
}

/// The console UART wired to the board's USB-serial bridge.
pub const UART_PS_CONFIGS: &[UartPsConfig] = &[UartPsConfig {
    device_id: 0,
    base: UART1_BASE,
    ref_clk_hz: UART_REF_CLK_HZ,
}];

/// PS UART errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UartPsError {
    /// Written before `initialize`
    NotInitialized,
    /// No divisor pair reaches the baud rate within tolerance
    BaudRate {
        /// Requested baud rate
        baud: u32,
    },
}

impl embedded_io::Error for UartPsError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::NotInitialized => ErrorKind::Other,
            Self::BaudRate { .. } => ErrorKind::InvalidInput,
        }
    }
}

/// Baud rate generator settings: `baud = ref_clk / (cd * (bdiv + 1))`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BaudDivisors {
    /// Clock divisor (BAUDGEN.CD)
    pub cd: u32,
    /// Bit-period divisor (BAUDDIV.BDIV)
    pub bdiv: u32,
    /// Baud rate actually produced
    pub actual: u32,
}

/// Divisor pair closest to `baud`, or `None` if the best is more than
/// [`MAX_BAUD_ERROR_PERCENT`] off.
pub fn baud_divisors(ref_clk_hz: u32, baud: u32) -> Option<BaudDivisors> {
    let mut best: Option<(u32, BaudDivisors)> = None;
    for bdiv in BDIV_MIN..=BDIV_MAX {
        let Some(divisor) = baud.checked_mul(bdiv.wrapping_add(1)) else {
            break;
        };
        let Some(cd) = ref_clk_hz
            .checked_add(divisor / 2)
            .and_then(|n| n.checked_div(divisor))
        else {
            continue;
        };
        if cd == 0 || cd > CD_MAX {
            continue;
        }
        let Some(actual) = cd
            .checked_mul(bdiv.wrapping_add(1))
            .and_then(|d| ref_clk_hz.checked_div(d))
        else {
            continue;
        };
        let error = actual.abs_diff(baud);
        match best {
            Some((e, _)) if e <= error => {}
            _ => best = Some((error, BaudDivisors { cd, bdiv, actual })),
        }
    }
    let (error, divisors) = best?;
    let limit = u64::from(baud).saturating_mul(u64::from(MAX_BAUD_ERROR_PERCENT)) / 100;
    (u64::from(error) <= limit).then_some(divisors)
}

/// Mode register value for a line configuration.
pub fn mode_bits(line: &UartConfig) -> u32 {
    let chrl = match line.data_bits {
        DataBits::Eight => MR_CHRL_8,
        DataBits::Seven => MR_CHRL_7,
        DataBits::Six => MR_CHRL_6,
    };
    let parity = match line.parity {
        Parity::None => MR_PAR_NONE,
        Parity::Even => MR_PAR_EVEN,
        Parity::Odd => MR_PAR_ODD,
    };
    let stop = match line.stop_bits {
        StopBits::One => MR_STOP_1,
        StopBits::OnePointFive => MR_STOP_1_5,
        StopBits::Two => MR_STOP_2,
    };
    chrl | parity | stop
}

/// Polled PS UART
pub struct UartPs {
    configs: &'static [UartPsConfig],
    regs: Option<Mmio>,
}

impl UartPs {
    /// Driver over a configuration table.
    ///
    /// # Safety
    ///
    /// Every `base` in `configs` must be a PS UART register block that
    /// nothing else drives.
    pub const unsafe fn new(configs: &'static [UartPsConfig]) -> Self {
        Self {
            configs,
            regs: None,
        }
    }

    fn write_byte(regs: Mmio, byte: u8) {
        while regs.read(SR) & SR_TXFULL != 0 {
            core::hint::spin_loop();
        }
        regs.write(FIFO, u32::from(byte));
    }
}

impl ErrorType for UartPs {
    type Error = UartPsError;
}

impl Write for UartPs {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        let regs = self.regs.ok_or(UartPsError::NotInitialized)?;
        for &byte in buf {
            Self::write_byte(regs, byte);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        let regs = self.regs.ok_or(UartPsError::NotInitialized)?;
        while regs.read(SR) & SR_TXEMPTY == 0 {
            core::hint::spin_loop();
        }
        Ok(())
    }
}

impl SerialConsole for UartPs {
    type Config = UartPsConfig;

    fn lookup_config(&self, device_id: u16) -> Option<Self::Config> {
        self.configs
            .iter()
            .find(|c| c.device_id == device_id)
            .copied()
    }

    fn initialize(&mut self, config: &Self::Config, line: UartConfig) -> Result<(), Self::Error> {
        let divisors = baud_divisors(config.ref_clk_hz, line.baud_rate)
            .ok_or(UartPsError::BaudRate { baud: line.baud_rate })?;

        // SAFETY: config came from the table this driver was built over.
        let regs = unsafe { Mmio::new(config.base) };
        regs.write(CR, CR_TXRST | CR_RXRST | CR_TX_DIS | CR_RX_DIS);
        regs.write(MR, mode_bits(&line));
        regs.write(BAUDGEN, divisors.cd);
        regs.write(BAUDDIV, divisors.bdiv);
        regs.write(CR, CR_TX_EN | CR_RX_EN);
        self.regs = Some(regs);

        #[cfg(feature = "defmt")]
        defmt::info!(
            "UART {=u16}: {=u32} baud (cd={=u32}, bdiv={=u32})",
            config.device_id,
            divisors.actual,
            divisors.cd,
            divisors.bdiv
        );
        Ok(())
    }
}
