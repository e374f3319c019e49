//! Flat 1 MB section mapping for the Cortex-A9 MMU.
//!
//! The data cache only caches accesses the MMU marks cacheable, so the cache
//! cannot be enabled without a translation table. The map is the identity:
//! DDR is normal write-back memory, the PL and PS peripheral windows are
//! strongly ordered, everything else faults.
//!
//! Descriptors are computed in `const` context, so the table lives in
//! `.rodata` and never needs writing at runtime.

/// Number of 1 MB sections covering the 4 GB address space.
pub const SECTIONS: usize = 4096;

const SECTION: u32 = 0b10;
const B: u32 = 1 << 2;
const XN: u32 = 1 << 4;
const DOMAIN_15: u32 = 0b1111 << 5;
const AP_FULL: u32 = 0b11 << 10;
const TEX_WBWA: u32 = 0b101 << 12;
const SHAREABLE: u32 = 1 << 16;

/// Memory type assigned to one 1 MB section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MemoryKind {
    /// Inner/outer write-back write-allocate, shareable
    Normal,
    /// Strongly ordered, execute-never
    Device,
    /// Translation fault
    Unmapped,
}

/// Memory type of the section at `index` (address `index << 20`).
pub const fn memory_kind(index: usize) -> MemoryKind {
    match index {
        // DDR, 512 MB
        0x000..=0x1FF => MemoryKind::Normal,
        // PL AXI GP0 and GP1
        0x400..=0xBFF => MemoryKind::Device,
        // IOP, SMC, SLCR, PS system registers, CPU private (SCU, timers, L2CC)
        0xE00..=0xF8F => MemoryKind::Device,
        // OCM mapped high, also holds the vectors when remapped
        0xFFF => MemoryKind::Normal,
        _ => MemoryKind::Unmapped,
    }
}

/// Section descriptor for index `index` of the identity map.
pub const fn section_descriptor(index: usize) -> u32 {
    #[allow(clippy::cast_possible_truncation)]
    let base = ((index & 0xFFF) as u32) << 20;
    match memory_kind(index) {
        MemoryKind::Normal => base | TEX_WBWA | B | SHAREABLE | AP_FULL | DOMAIN_15 | SECTION,
        MemoryKind::Device => base | AP_FULL | DOMAIN_15 | XN | SECTION,
        MemoryKind::Unmapped => 0,
    }
}

/// First-level translation table (16 KB, 16 KB aligned).
#[repr(C, align(16384))]
pub struct TranslationTable([u32; SECTIONS]);

impl TranslationTable {
    /// Identity map built from [`section_descriptor`].
    #[allow(clippy::indexing_slicing)]
    pub const fn flat() -> Self {
        let mut entries = [0u32; SECTIONS];
        let mut index = 0;
        while index < SECTIONS {
            entries[index] = section_descriptor(index);
            index = index.wrapping_add(1);
        }
        Self(entries)
    }

    /// Descriptor for the section containing `address`.
    pub fn entry_for(&self, address: usize) -> u32 {
        self.0.get(address >> 20).copied().unwrap_or(0)
    }

    /// Physical address of the table, for TTBR0.
    pub fn address(&'static self) -> usize {
        self.0.as_ptr() as usize
    }
}

/// Load `table` into TTBR0 and turn the MMU on.
///
/// # Safety
///
/// The table must identity-map the running code, stack and every
/// peripheral in use, or the next instruction fetch faults.
#[cfg(target_arch = "arm")]
pub unsafe fn enable(table: &'static TranslationTable) {
    use core::arch::asm;

    let ttbr = table.address();
    // SAFETY: CP15 writes on the boot core with a valid table; caller
    // guarantees the mapping covers everything in use.
    unsafe {
        // Invalidate TLBs, then TTBCR = 0 (TTBR0 only), all domains client.
        asm!("mcr p15, 0, {0}, c8, c7, 0", in(reg) 0u32, options(nostack, preserves_flags));
        asm!("mcr p15, 0, {0}, c2, c0, 2", in(reg) 0u32, options(nostack, preserves_flags));
        asm!("mcr p15, 0, {0}, c3, c0, 0", in(reg) 0x5555_5555u32, options(nostack, preserves_flags));
        asm!("mcr p15, 0, {0}, c2, c0, 0", in(reg) ttbr, options(nostack, preserves_flags));
        asm!("dsb", "isb", options(nostack, preserves_flags));
        asm!(
            "mrc p15, 0, {r}, c1, c0, 0",
            "orr {r}, {r}, #1",
            "mcr p15, 0, {r}, c1, c0, 0",
            "isb",
            r = out(reg) _,
            options(nostack, preserves_flags),
        );
    }
}

/// Off-target stand-in; host builds have no MMU to program.
///
/// # Safety
///
/// Always safe off-target; the signature matches the Cortex-A9 version.
#[cfg(not(target_arch = "arm"))]
pub unsafe fn enable(table: &'static TranslationTable) {
    let _ = table;
}

#[cfg(test)]
#[allow(clippy::arithmetic_side_effects)]
mod tests {
    use super::*;

    static TABLE: TranslationTable = TranslationTable::flat();

    #[test]
    fn ddr_is_cacheable_and_identity_mapped() {
        let entry = TABLE.entry_for(0x0110_0000);
        assert_eq!(entry & 0xFFF0_0000, 0x0110_0000);
        assert_eq!(entry & 0b11, SECTION);
        assert_ne!(entry & TEX_WBWA, 0);
        assert_eq!(entry & XN, 0);
    }

    #[test]
    fn peripherals_are_strongly_ordered() {
        for address in [0x4040_0000, 0xE000_1000, 0xF8F0_0200, 0xF8F0_2000] {
            let entry = TABLE.entry_for(address);
            assert_eq!(memory_kind(address >> 20), MemoryKind::Device, "{address:#x}");
            assert_eq!(entry & (TEX_WBWA | B), 0, "{address:#x}");
            assert_ne!(entry & XN, 0, "{address:#x}");
        }
    }

    #[test]
    fn holes_fault() {
        assert_eq!(TABLE.entry_for(0x2000_0000), 0);
        assert_eq!(TABLE.entry_for(0xC000_0000), 0);
        assert_eq!(memory_kind(0xFFF), MemoryKind::Normal);
    }

    #[test]
    fn table_is_aligned_for_ttbr0() {
        assert_eq!(TABLE.address() % 16384, 0);
    }
}
