//! Data cache maintenance abstraction
//!
//! The AXI DMA writes DDR behind the CPU's back. Before a device-to-memory
//! transfer the buffer range is flushed so no dirty line is evicted on top of
//! fresh data; after completion it is invalidated so the CPU re-reads DDR.

/// Data cache control by address range.
///
/// Ranges are given as a start address and byte length. Implementations round
/// out to whole cache lines (see [`crate::dma_safety::cache_line_span`]).
pub trait CacheMaintenance {
    /// Enable the data cache. Called once during bring-up.
    fn enable_data_cache(&mut self);

    /// Clean and invalidate `len` bytes at `address` to the point of coherency.
    fn flush_range(&mut self, address: usize, len: usize);

    /// Discard cached copies of `len` bytes at `address` without writing back.
    fn invalidate_range(&mut self, address: usize, len: usize);
}

impl<T: CacheMaintenance + ?Sized> CacheMaintenance for &mut T {
    fn enable_data_cache(&mut self) {
        (**self).enable_data_cache();
    }

    fn flush_range(&mut self, address: usize, len: usize) {
        (**self).flush_range(address, len);
    }

    fn invalidate_range(&mut self, address: usize, len: usize) {
        (**self).invalidate_range(address, len);
    }
}
