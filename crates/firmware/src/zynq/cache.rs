//! Cortex-A9 L1 data cache and PL310 L2 cache maintenance.
//!
//! Range operations walk the affected 32-byte lines. A flush cleans inner
//! before outer so dirty L1 data reaches L2 before L2 is written back; an
//! invalidate discards outer before inner so L1 cannot refill from a stale
//! L2 line.

use platform::dma_safety::{cache_line_span, CACHE_LINE_BYTES};
use platform::CacheMaintenance;

use super::mmu::{self, TranslationTable};
use super::Mmio;

const L2_CTRL: usize = 0x100;
const L2_CACHE_SYNC: usize = 0x730;
const L2_INV_PA: usize = 0x770;
const L2_INV_WAY: usize = 0x77C;
const L2_CLEAN_INV_PA: usize = 0x7F0;

const L2_ENABLE: u32 = 1;
const L2_ALL_WAYS: u32 = 0xFFFF;

/// Polls of a PL310 background operation before giving up.
const L2_POLL_LIMIT: u32 = 10_000;

/// L1 + L2 data cache driver.
pub struct ZynqCache {
    l2: Mmio,
    table: &'static TranslationTable,
    enabled: bool,
}

impl ZynqCache {
    /// Cache driver over the PL310 at `l2_base`.
    ///
    /// # Safety
    ///
    /// `l2_base` must be the PL310 register block and `table` must identity
    /// map the program, its stack and every peripheral in use.
    pub const unsafe fn new(l2_base: usize, table: &'static TranslationTable) -> Self {
        Self {
            // SAFETY: forwarded to the caller.
            l2: unsafe { Mmio::new(l2_base) },
            table,
            enabled: false,
        }
    }

    /// Data cache enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn l2_wait(&self, offset: usize, mask: u32) -> bool {
        for _ in 0..L2_POLL_LIMIT {
            if self.l2.read(offset) & mask == 0 {
                return true;
            }
            core::hint::spin_loop();
        }
        false
    }

    fn l2_sync(&self) {
        self.l2.write(L2_CACHE_SYNC, 0);
        if !self.l2_wait(L2_CACHE_SYNC, 1) {
            #[cfg(feature = "defmt")]
            defmt::warn!("L2 cache sync did not complete");
        }
    }

    fn for_each_line(address: usize, len: usize, mut op: impl FnMut(usize)) {
        let Some((start, end)) = cache_line_span(address, len) else {
            #[cfg(feature = "defmt")]
            defmt::warn!("cache range {=usize:#x}+{=usize} overflows", address, len);
            return;
        };
        let mut line = start;
        while line < end {
            op(line);
            line = line.wrapping_add(CACHE_LINE_BYTES);
        }
    }
}

impl CacheMaintenance for ZynqCache {
    fn enable_data_cache(&mut self) {
        if self.enabled {
            return;
        }
        cp15::invalidate_l1_dcache_all();
        // SAFETY: `new`'s contract covers the table.
        unsafe { mmu::enable(self.table) };

        self.l2.write(L2_INV_WAY, L2_ALL_WAYS);
        if !self.l2_wait(L2_INV_WAY, L2_ALL_WAYS) {
            #[cfg(feature = "defmt")]
            defmt::warn!("L2 invalidate-by-way did not complete");
        }
        self.l2_sync();
        self.l2.modify(L2_CTRL, |v| v | L2_ENABLE);

        cp15::enable_l1_caches();
        self.enabled = true;
        #[cfg(feature = "defmt")]
        defmt::info!("L1/L2 data cache enabled");
    }

    fn flush_range(&mut self, address: usize, len: usize) {
        Self::for_each_line(address, len, cp15::clean_invalidate_line);
        cp15::dsb();
        let l2 = self.l2;
        Self::for_each_line(address, len, |line| write_pa(l2, L2_CLEAN_INV_PA, line));
        self.l2_sync();
    }

    fn invalidate_range(&mut self, address: usize, len: usize) {
        let l2 = self.l2;
        Self::for_each_line(address, len, |line| write_pa(l2, L2_INV_PA, line));
        self.l2_sync();
        Self::for_each_line(address, len, cp15::invalidate_line);
        cp15::dsb();
    }
}

// The PL310 is a 32-bit peripheral; identity-mapped lines fit.
#[allow(clippy::cast_possible_truncation)]
fn write_pa(l2: Mmio, offset: usize, line: usize) {
    l2.write(offset, line as u32);
}

#[cfg(target_arch = "arm")]
mod cp15 {
    use core::arch::asm;

    const L1_SETS: u32 = 256;
    const L1_WAYS: u32 = 4;

    pub fn clean_invalidate_line(mva: usize) {
        // SAFETY: DCCIMVAC has no memory-safety effect beyond writing back.
        unsafe { asm!("mcr p15, 0, {0}, c7, c14, 1", in(reg) mva, options(nostack, preserves_flags)) };
    }

    pub fn invalidate_line(mva: usize) {
        // SAFETY: only called on lines whose contents came from the DMA.
        unsafe { asm!("mcr p15, 0, {0}, c7, c6, 1", in(reg) mva, options(nostack, preserves_flags)) };
    }

    pub fn dsb() {
        // SAFETY: barrier only.
        unsafe { asm!("dsb", options(nostack, preserves_flags)) };
    }

    pub fn invalidate_l1_dcache_all() {
        for way in 0..L1_WAYS {
            for set in 0..L1_SETS {
                let sw = way.wrapping_shl(30) | set.wrapping_shl(5);
                // SAFETY: DCISW before the cache is enabled discards nothing live.
                unsafe { asm!("mcr p15, 0, {0}, c7, c6, 2", in(reg) sw, options(nostack, preserves_flags)) };
            }
        }
        dsb();
    }

    pub fn enable_l1_caches() {
        // SAFETY: SCTLR.C and SCTLR.I with the MMU already on.
        unsafe {
            asm!(
                "mrc p15, 0, {r}, c1, c0, 0",
                "orr {r}, {r}, #(1 << 2)",
                "orr {r}, {r}, #(1 << 12)",
                "mcr p15, 0, {r}, c1, c0, 0",
                "dsb",
                "isb",
                r = out(reg) _,
                options(nostack, preserves_flags),
            );
        }
    }
}

#[cfg(not(target_arch = "arm"))]
mod cp15 {
    pub fn clean_invalidate_line(_mva: usize) {}
    pub fn invalidate_line(_mva: usize) {}
    pub fn dsb() {}
    pub fn invalidate_l1_dcache_all() {}
    pub fn enable_l1_caches() {}
}
