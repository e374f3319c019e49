//! Fatal error taxonomy
//!
//! Every failure the firmware detects is fatal: it prints a diagnostic and
//! stops. The exit status is the same for every cause; only the diagnostic
//! text tells them apart.

use platform::TransferStalled;

/// Generic failure status returned by the board support code.
pub const XST_FAILURE: i32 = 1;

/// Unrecoverable bring-up or acquisition failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FatalError {
    /// No serial console configuration for the device id.
    SerialLookup,
    /// Serial console rejected its configuration.
    SerialInit,
    /// No DMA engine configuration for the device id.
    DmaLookup,
    /// DMA engine failed to reset or initialize.
    DmaInit,
    /// DMA engine was built with scatter-gather descriptors.
    ScatterGatherMode,
    /// DMA engine refused to start a simple transfer.
    TransferStart,
    /// DMA engine still busy after the configured number of polls.
    TransferStalled {
        /// Busy polls observed
        polls: u32,
    },
    /// Receive buffer cannot hold one status word.
    BufferTooSmall {
        /// Buffer length in bytes
        len: usize,
    },
}

impl FatalError {
    /// Process status for this failure.
    pub const fn status(self) -> i32 {
        XST_FAILURE
    }

    /// Console diagnostic, without line terminator.
    pub const fn diagnostic(self) -> &'static str {
        match self {
            Self::SerialLookup => "UART lookup config failed",
            Self::SerialInit => "UART init failed",
            Self::DmaLookup => "DMA lookup config failed",
            Self::DmaInit => "DMA init failed",
            Self::ScatterGatherMode => {
                "DMA configured in Scatter-Gather mode; acquisition expects Simple mode"
            }
            Self::TransferStart => "DMA transfer start failed",
            Self::TransferStalled { .. } => "DMA transfer did not complete",
            Self::BufferTooSmall { .. } => "DMA receive buffer too small",
        }
    }
}

impl From<TransferStalled> for FatalError {
    fn from(stall: TransferStalled) -> Self {
        Self::TransferStalled { polls: stall.polls }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for FatalError {}

impl core::fmt::Display for FatalError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::TransferStalled { polls } => {
                write!(f, "{} after {polls} polls", self.diagnostic())
            }
            Self::BufferTooSmall { len } => write!(f, "{} ({len} bytes)", self.diagnostic()),
            _ => f.write_str(self.diagnostic()),
        }
    }
}
