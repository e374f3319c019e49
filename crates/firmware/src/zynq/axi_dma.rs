//! AXI DMA (PG021) register driver, simple (direct register) mode.
//!
//! Only the register-level operations the acquisition loop needs: reset,
//! single-buffer transfers and idle polling. Scatter-gather builds of the
//! core are detected and refused.
//!
//! # Register map (PG021 table 2-6)
//!
//! | Offset | Register | Used bits |
//! |--------|----------|-----------|
//! | 0x00 | MM2S_DMACR | RS (0), Reset (2) |
//! | 0x04 | MM2S_DMASR | Halted (0), Idle (1), SGIncld (3), errors (4..=6) |
//! | 0x18 | MM2S_SA | source address |
//! | 0x28 | MM2S_LENGTH | byte count; writing it starts the transfer |
//! | 0x30 | S2MM_DMACR | RS (0), Reset (2) |
//! | 0x34 | S2MM_DMASR | Halted (0), Idle (1), SGIncld (3), errors (4..=6) |
//! | 0x48 | S2MM_DA | destination address |
//! | 0x58 | S2MM_LENGTH | byte count; writing it starts the transfer |

use platform::{Direction, DmaBufferMut, TransferEngine};

use super::{Mmio, AXI_DMA_0_BASE};

const MM2S_DMACR: usize = 0x00;
const MM2S_DMASR: usize = 0x04;
const MM2S_SA: usize = 0x18;
const MM2S_LENGTH: usize = 0x28;
const S2MM_DMACR: usize = 0x30;
const S2MM_DMASR: usize = 0x34;
const S2MM_DA: usize = 0x48;
const S2MM_LENGTH: usize = 0x58;

const CR_RUN_STOP: u32 = 0x0000_0001;
const CR_RESET: u32 = 0x0000_0004;

const SR_HALTED: u32 = 0x0000_0001;
const SR_IDLE: u32 = 0x0000_0002;
const SR_SG_INCLUDED: u32 = 0x0000_0008;
const SR_ERRORS: u32 = 0x0000_0070;

/// Polls of the reset bit before giving up.
pub const RESET_TIMEOUT_POLLS: u32 = 500;

/// Static description of one AXI DMA instance, as exported by the hardware
/// handoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxiDmaConfig {
    /// Device id
    pub device_id: u16,
    /// Register block base address
    pub base: usize,
    /// Core built with the scatter-gather engine
    pub has_sg: bool,
    /// S2MM channel present
    pub has_s2mm: bool,
    /// MM2S channel present
    pub has_mm2s: bool,
    /// Largest byte count the LENGTH register accepts
    pub max_transfer_len: usize,
}

/// Configuration table for this board's design: one S2MM-only core in
/// simple mode with a 23-bit length register.
pub const AXI_DMA_CONFIGS: &[AxiDmaConfig] = &[AxiDmaConfig {
    device_id: 0,
    base: AXI_DMA_0_BASE,
    has_sg: false,
    has_s2mm: true,
    has_mm2s: false,
    max_transfer_len: 0x007F_FFFF,
}];

/// AXI DMA driver errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AxiDmaError {
    /// `initialize` has not completed
    NotInitialized,
    /// Reset bit did not self-clear
    ResetTimeout,
    /// Core is in scatter-gather mode
    ScatterGather,
    /// Requested channel is not built into the core
    NoChannel,
    /// Channel is running and not idle
    Busy,
    /// Zero or over-long transfer
    InvalidLength {
        /// Requested length
        len: usize,
    },
    /// Buffer address does not fit the 32-bit address register
    AddressOutOfRange,
}

/// Snapshot of one channel's status register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelStatus(pub u32);

impl ChannelStatus {
    /// Channel halted (RS clear or after an error)
    pub const fn halted(self) -> bool {
        self.0 & SR_HALTED != 0
    }

    /// Last transfer complete
    pub const fn idle(self) -> bool {
        self.0 & SR_IDLE != 0
    }

    /// Internal, slave or decode error flagged
    pub const fn has_error(self) -> bool {
        self.0 & SR_ERRORS != 0
    }

    /// Running with a transfer in flight
    pub const fn is_busy(self) -> bool {
        !self.halted() && !self.idle()
    }
}

/// AXI DMA engine
pub struct AxiDma {
    configs: &'static [AxiDmaConfig],
    active: Option<(Mmio, AxiDmaConfig)>,
}

impl AxiDma {
    /// Driver over a configuration table.
    ///
    /// # Safety
    ///
    /// Every `base` in `configs` must be the register block of an AXI DMA
    /// core that nothing else drives.
    pub const unsafe fn new(configs: &'static [AxiDmaConfig]) -> Self {
        Self {
            configs,
            active: None,
        }
    }

    /// Status register of the channel for `direction`.
    pub fn channel_status(&self, direction: Direction) -> Option<ChannelStatus> {
        let (regs, _) = self.active?;
        Some(ChannelStatus(regs.read(status_offset(direction))))
    }

    fn reset(regs: Mmio) -> Result<(), AxiDmaError> {
        // Reset through either channel resets the whole core.
        regs.write(S2MM_DMACR, CR_RESET);
        for _ in 0..RESET_TIMEOUT_POLLS {
            if regs.read(S2MM_DMACR) & CR_RESET == 0 {
                return Ok(());
            }
            core::hint::spin_loop();
        }
        Err(AxiDmaError::ResetTimeout)
    }

    #[cfg(test)]
    fn attach(&mut self, config: AxiDmaConfig) {
        // SAFETY: test tables point at RAM-backed fakes.
        let regs = unsafe { Mmio::new(config.base) };
        self.active = Some((regs, config));
    }
}

const fn status_offset(direction: Direction) -> usize {
    match direction {
        Direction::DeviceToMemory => S2MM_DMASR,
        Direction::MemoryToDevice => MM2S_DMASR,
    }
}

impl TransferEngine for AxiDma {
    type Config = AxiDmaConfig;
    type Error = AxiDmaError;

    fn lookup_config(&self, device_id: u16) -> Option<Self::Config> {
        self.configs
            .iter()
            .find(|c| c.device_id == device_id)
            .copied()
    }

    fn initialize(&mut self, config: &Self::Config) -> Result<(), Self::Error> {
        // SAFETY: config came from the table this driver was built over.
        let regs = unsafe { Mmio::new(config.base) };
        self.active = None;
        Self::reset(regs)?;
        self.active = Some((regs, *config));
        #[cfg(feature = "defmt")]
        defmt::info!("AXI DMA {=u16} reset at {=usize:#x}", config.device_id, config.base);
        Ok(())
    }

    fn has_scatter_gather(&self) -> bool {
        match self.active {
            Some((regs, config)) => config.has_sg || regs.read(S2MM_DMASR) & SR_SG_INCLUDED != 0,
            None => false,
        }
    }

    fn start_simple_transfer<B>(
        &mut self,
        buffer: &mut B,
        direction: Direction,
    ) -> Result<(), Self::Error>
    where
        B: DmaBufferMut + ?Sized,
    {
        let (regs, config) = self.active.ok_or(AxiDmaError::NotInitialized)?;
        if self.has_scatter_gather() {
            return Err(AxiDmaError::ScatterGather);
        }

        let len = buffer.len();
        if len == 0 || len > config.max_transfer_len {
            return Err(AxiDmaError::InvalidLength { len });
        }
        let length = u32::try_from(len).map_err(|_| AxiDmaError::InvalidLength { len })?;
        let address =
            u32::try_from(buffer.address()).map_err(|_| AxiDmaError::AddressOutOfRange)?;

        let (present, cr, sr, addr_reg, len_reg) = match direction {
            Direction::DeviceToMemory => {
                (config.has_s2mm, S2MM_DMACR, S2MM_DMASR, S2MM_DA, S2MM_LENGTH)
            }
            Direction::MemoryToDevice => {
                (config.has_mm2s, MM2S_DMACR, MM2S_DMASR, MM2S_SA, MM2S_LENGTH)
            }
        };
        if !present {
            return Err(AxiDmaError::NoChannel);
        }
        if ChannelStatus(regs.read(sr)).is_busy() {
            return Err(AxiDmaError::Busy);
        }

        regs.write(addr_reg, address);
        regs.modify(cr, |v| v | CR_RUN_STOP);
        // Writing LENGTH starts the transfer; it must come last.
        regs.write(len_reg, length);
        Ok(())
    }

    fn is_busy(&self, direction: Direction) -> bool {
        self.channel_status(direction)
            .is_some_and(|status| !status.idle())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::zynq::fake::FakeRegs;
    use platform::DmaBuffer;

    /// Buffer that reports a fixed bus address, like the pinned DDR region.
    struct Pinned {
        address: usize,
        bytes: [u8; 256],
    }

    impl Pinned {
        fn at(address: usize) -> Self {
            Self { address, bytes: [0; 256] }
        }
    }

    impl DmaBuffer for Pinned {
        fn as_slice(&self) -> &[u8] {
            &self.bytes
        }
        fn address(&self) -> usize {
            self.address
        }
    }

    impl DmaBufferMut for Pinned {
        fn as_mut_slice(&mut self) -> &mut [u8] {
            &mut self.bytes
        }
    }

    fn config_for(regs: &mut FakeRegs) -> AxiDmaConfig {
        AxiDmaConfig {
            base: regs.mmio().base(),
            ..AXI_DMA_CONFIGS[0]
        }
    }

    fn attached(regs: &mut FakeRegs) -> AxiDma {
        // SAFETY: the table is empty; `attach` points at the fake.
        let mut dma = unsafe { AxiDma::new(&[]) };
        dma.attach(config_for(regs));
        dma
    }

    #[test]
    fn lookup_finds_board_core() {
        // SAFETY: nothing is accessed before `initialize`.
        let dma = unsafe { AxiDma::new(AXI_DMA_CONFIGS) };
        let config = dma.lookup_config(0).unwrap();
        assert_eq!(config.base, 0x4040_0000);
        assert!(!config.has_sg);
        assert!(dma.lookup_config(1).is_none());
    }

    #[test]
    fn reset_that_never_clears_times_out() {
        let mut regs = FakeRegs::new();
        let config = config_for(&mut regs);
        // SAFETY: the config points at the fake.
        let mut dma = unsafe { AxiDma::new(&[]) };
        assert_eq!(dma.initialize(&config), Err(AxiDmaError::ResetTimeout));
        assert_eq!(regs.mmio().read(S2MM_DMACR), CR_RESET);
        assert!(matches!(
            dma.start_simple_transfer(&mut Pinned::at(0x0110_0000), Direction::DeviceToMemory),
            Err(AxiDmaError::NotInitialized)
        ));
    }

    #[test]
    fn s2mm_transfer_programs_address_run_and_length() {
        let mut regs = FakeRegs::new();
        regs.mmio().write(S2MM_DMASR, SR_HALTED);
        let mut dma = attached(&mut regs);

        dma.start_simple_transfer(&mut Pinned::at(0x0110_0000), Direction::DeviceToMemory)
            .unwrap();

        let mmio = regs.mmio();
        assert_eq!(mmio.read(S2MM_DA), 0x0110_0000);
        assert_eq!(mmio.read(S2MM_DMACR) & CR_RUN_STOP, CR_RUN_STOP);
        assert_eq!(mmio.read(S2MM_LENGTH), 256);
    }

    #[test]
    fn running_channel_rejects_new_transfer() {
        let mut regs = FakeRegs::new();
        regs.mmio().write(S2MM_DMASR, 0);
        let mut dma = attached(&mut regs);
        assert_eq!(
            dma.start_simple_transfer(&mut Pinned::at(0x0110_0000), Direction::DeviceToMemory),
            Err(AxiDmaError::Busy)
        );
        assert_eq!(regs.mmio().read(S2MM_LENGTH), 0);
    }

    #[test]
    fn missing_mm2s_channel_is_rejected() {
        let mut regs = FakeRegs::new();
        let mut dma = attached(&mut regs);
        assert_eq!(
            dma.start_simple_transfer(&mut Pinned::at(0x0110_0000), Direction::MemoryToDevice),
            Err(AxiDmaError::NoChannel)
        );
    }

    #[test]
    fn zero_length_is_rejected() {
        let mut regs = FakeRegs::new();
        let mut dma = attached(&mut regs);
        let mut empty: [u8; 0] = [];
        assert_eq!(
            dma.start_simple_transfer(&mut empty, Direction::DeviceToMemory),
            Err(AxiDmaError::InvalidLength { len: 0 })
        );
    }

    #[test]
    fn sg_included_bit_means_scatter_gather() {
        let mut regs = FakeRegs::new();
        regs.mmio().write(S2MM_DMASR, SR_SG_INCLUDED | SR_HALTED);
        let mut dma = attached(&mut regs);
        assert!(dma.has_scatter_gather());
        assert_eq!(
            dma.start_simple_transfer(&mut Pinned::at(0x0110_0000), Direction::DeviceToMemory),
            Err(AxiDmaError::ScatterGather)
        );
    }

    #[test]
    fn busy_until_idle_bit_set() {
        let mut regs = FakeRegs::new();
        let dma = attached(&mut regs);
        regs.mmio().write(S2MM_DMASR, 0);
        assert!(dma.is_busy(Direction::DeviceToMemory));
        regs.mmio().write(S2MM_DMASR, SR_IDLE);
        assert!(!dma.is_busy(Direction::DeviceToMemory));
        assert!(!dma.channel_status(Direction::DeviceToMemory).unwrap().has_error());
    }
}
