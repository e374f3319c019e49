//! Zynq-7000 register drivers
//!
//! Minimal blocking drivers for the peripherals the acquisition loop touches.
//! Register blocks are accessed through [`Mmio`], a base address plus
//! volatile 32-bit reads and writes. Nothing here depends on the CPU
//! architecture except the CP15 helpers in [`cache`] and [`mmu`], which
//! compile to no-ops off-target so the register logic can be exercised
//! against RAM-backed fake register blocks on the host.
//!
//! # Memory map (Zynq-7000 TRM UG585, appendix B)
//!
//! | Block | Base |
//! |-------|------|
//! | AXI DMA (PL, GP0) | `0x4040_0000` (from the hardware handoff) |
//! | PS UART1 | `0xE000_1000` |
//! | Global timer | `0xF8F0_0200` |
//! | PL310 L2 cache controller | `0xF8F0_2000` |

pub mod axi_dma;
pub mod cache;
pub mod mmu;
pub mod timer;
pub mod uart_ps;

pub use axi_dma::{AxiDma, AxiDmaConfig, AxiDmaError};
pub use cache::ZynqCache;
pub use timer::GlobalTimerDelay;
pub use uart_ps::{UartPs, UartPsConfig, UartPsError};

/// AXI DMA base address for device id 0.
pub const AXI_DMA_0_BASE: usize = 0x4040_0000;

/// PS UART1 base address (the console UART on most boards).
pub const UART1_BASE: usize = 0xE000_1000;

/// Cortex-A9 MPCore global timer base address.
pub const GLOBAL_TIMER_BASE: usize = 0xF8F0_0200;

/// PL310 L2 cache controller base address.
pub const L2CC_BASE: usize = 0xF8F0_2000;

/// CPU_3x2x clock feeding the global timer (half the 666.67 MHz CPU clock).
pub const GLOBAL_TIMER_HZ: u32 = 333_333_333;

/// UART reference clock from the FSBL clock configuration.
pub const UART_REF_CLK_HZ: u32 = 100_000_000;

/// A block of 32-bit memory-mapped registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mmio {
    base: usize,
}

impl Mmio {
    /// Register block at `base`.
    ///
    /// # Safety
    ///
    /// `base` must point at a register block (or RAM standing in for one)
    /// that is valid for volatile 32-bit access at every offset the driver
    /// uses, for as long as the returned value is used.
    pub const unsafe fn new(base: usize) -> Self {
        Self { base }
    }

    /// Base address
    pub const fn base(self) -> usize {
        self.base
    }

    fn ptr(self, offset: usize) -> *mut u32 {
        self.base.wrapping_add(offset) as *mut u32
    }

    /// Volatile read of the register at `offset`.
    pub fn read(self, offset: usize) -> u32 {
        // SAFETY: validity of base + offset is the contract of `Mmio::new`.
        unsafe { core::ptr::read_volatile(self.ptr(offset)) }
    }

    /// Volatile write of the register at `offset`.
    pub fn write(self, offset: usize, value: u32) {
        // SAFETY: validity of base + offset is the contract of `Mmio::new`.
        unsafe { core::ptr::write_volatile(self.ptr(offset), value) }
    }

    /// Read-modify-write of the register at `offset`.
    pub fn modify(self, offset: usize, f: impl FnOnce(u32) -> u32) {
        self.write(offset, f(self.read(offset)));
    }
}

#[cfg(test)]
pub(crate) mod fake {
    //! RAM-backed register blocks for host tests.

    use super::Mmio;

    /// 4 KB of zeroed, word-aligned memory standing in for a register block.
    pub struct FakeRegs(Box<[u32; 1024]>);

    impl FakeRegs {
        pub fn new() -> Self {
            Self(Box::new([0; 1024]))
        }

        pub fn mmio(&mut self) -> Mmio {
            // SAFETY: the box outlives every test that uses the handle.
            unsafe { Mmio::new(self.0.as_mut_ptr() as usize) }
        }
    }
}
