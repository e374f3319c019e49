//! DMA safety marker traits and buffer placement constants for the Zynq-7000.
//!
//! ## DMA Accessibility on Zynq-7000 (AXI DMA in the PL, HP port)
//!
//! | Memory Region | Base Address | Size     | AXI DMA | Cached | Use case |
//! |---------------|--------------|----------|---------|--------|----------|
//! | DDR (low)     | 0x0000_0000  | 1 MB     | NO*     | yes    | Reserved: OCM aliasing at boot |
//! | DDR           | 0x0010_0000  | 511 MB   | YES     | yes    | Program image, RX buffer |
//! | OCM (high)    | 0xFFFC_0000  | 256 KB   | NO      | yes    | CPU-only scratch |
//! | PL AXI GP0    | 0x4000_0000  | 1 GB     | n/a     | no     | AXI DMA registers |
//!
//! \* The first megabyte of DDR is not reachable from the HP ports.
//!
//! The engine does not snoop the CPU caches, so every buffer it writes must
//! be flushed before the transfer and invalidated after it. A buffer that
//! shares a cache line with other data can have that data clobbered by the
//! invalidate, hence [`Align32`].
//!
//! ## Usage
//! ```rust
//! use platform::dma_safety::{Align32, RX_BUFFER_BASE};
//! use platform::config::TRANSFER_LEN;
//!
//! // Host / simulation: aligned static storage.
//! static mut RX: Align32<[u8; TRANSFER_LEN]> = Align32([0; TRANSFER_LEN]);
//!
//! // Hardware: the pinned DDR region at RX_BUFFER_BASE.
//! assert_eq!(RX_BUFFER_BASE % 32, 0);
//! ```

// ── Memory region addresses ──────────────────────────────────────────────────

/// Base address of DDR as seen by the AXI HP ports.
pub const DDR_BASE: usize = 0x0010_0000;

/// DDR size in bytes reachable from the HP ports (511 MB on a 512 MB board).
pub const DDR_SIZE_BYTES: usize = 511 * 1024 * 1024;

/// Offset of the receive buffer from [`DDR_BASE`]; leaves 16 MB for the image.
pub const RX_BUFFER_OFFSET: usize = 0x0100_0000;

/// Physical address of the receive buffer.
pub const RX_BUFFER_BASE: usize = DDR_BASE + RX_BUFFER_OFFSET;

/// L1/L2 data cache line size on the Cortex-A9 / PL310.
pub const CACHE_LINE_BYTES: usize = 32;

/// Mask of the in-line offset bits of an address.
const LINE_OFFSET_MASK: usize = 0x1F;

/// Wrapper forcing 32-byte (cache line) alignment.
#[repr(C, align(32))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Align32<T>(pub T);

/// Cache-line aligned span `[start, end)` covering `len` bytes at `address`.
///
/// Cache maintenance operates on whole lines; this is the range actually
/// touched by a flush or invalidate of the given bytes. Returns `None` if the
/// span would overflow the address space.
pub const fn cache_line_span(address: usize, len: usize) -> Option<(usize, usize)> {
    let mask = LINE_OFFSET_MASK;
    let start = address & !mask;
    let Some(end) = address.checked_add(len) else {
        return None;
    };
    let Some(end) = end.checked_add(mask) else {
        return None;
    };
    Some((start, end & !mask))
}

/// True if `len` bytes at `address` occupy whole cache lines only.
pub const fn is_cache_line_exclusive(address: usize, len: usize) -> bool {
    address & LINE_OFFSET_MASK == 0 && len & LINE_OFFSET_MASK == 0
}

// ── Marker traits ────────────────────────────────────────────────────────────

/// Marker trait: memory region reachable by the AXI DMA through the HP ports.
///
/// # Safety
/// Only implement for zero-sized types representing regions the PL masters
/// can physically address. Implementing it for OCM or the low DDR megabyte
/// makes the engine write somewhere the CPU never reads.
pub unsafe trait DmaAccessible: Sized {
    /// First byte of the region.
    const BASE: usize;
    /// Region size in bytes.
    const SIZE: usize;

    /// True if `[address, address + len)` lies inside the region.
    fn contains(address: usize, len: usize) -> bool {
        match address
            .checked_sub(Self::BASE)
            .and_then(|offset| Self::SIZE.checked_sub(offset))
        {
            Some(room) => len <= room,
            None => false,
        }
    }
}

// ── Region zero-sized types ──────────────────────────────────────────────────

/// Zero-sized type representing HP-port-visible DDR.
#[derive(Debug, Clone, Copy)]
pub struct DdrRegion;

// SAFETY: DDR above 1 MB is mapped to the HP ports on every Zynq-7000 part.
unsafe impl DmaAccessible for DdrRegion {
    const BASE: usize = DDR_BASE;
    const SIZE: usize = DDR_SIZE_BYTES;
}

/// Zero-sized type representing the on-chip memory high mapping.
///
/// CPU-only scratch. Never hand this to the AXI DMA.
#[derive(Debug, Clone, Copy)]
pub struct OcmRegion;
// OcmRegion intentionally does NOT implement DmaAccessible.
