//! DMA abstraction layer
//!
//! Provides the transfer engine contract (simple, non-descriptor mode), buffer
//! handles, and a transfer type that owns its buffer while the engine may be
//! writing to it.

use crate::config::TRANSFER_LEN;
use crate::dma_safety::Align32;

/// Data movement direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Stream to memory (S2MM).
    DeviceToMemory,
    /// Memory to stream (MM2S).
    MemoryToDevice,
}

/// DMA engine operating in simple mode: one contiguous buffer per request.
///
/// Mirrors the vendor driver lifecycle: look up the static configuration for
/// a device id, initialize the engine from it, then issue single transfers
/// and poll for completion.
pub trait TransferEngine {
    /// Static hardware configuration for one engine instance.
    type Config;

    /// Error type
    type Error: core::fmt::Debug;

    /// Find the configuration for `device_id`, `None` if no such engine exists.
    fn lookup_config(&self, device_id: u16) -> Option<Self::Config>;

    /// Reset and initialize the engine.
    fn initialize(&mut self, config: &Self::Config) -> Result<(), Self::Error>;

    /// True if the engine was synthesized with scatter-gather descriptors.
    fn has_scatter_gather(&self) -> bool;

    /// Start exactly one transfer covering the whole of `buffer`.
    ///
    /// The caller is responsible for cache maintenance around the transfer.
    fn start_simple_transfer<B>(
        &mut self,
        buffer: &mut B,
        direction: Direction,
    ) -> Result<(), Self::Error>
    where
        B: DmaBufferMut + ?Sized;

    /// Poll the channel for `direction`; `false` once the channel is idle.
    fn is_busy(&self, direction: Direction) -> bool;
}

impl<T: TransferEngine + ?Sized> TransferEngine for &mut T {
    type Config = T::Config;
    type Error = T::Error;

    fn lookup_config(&self, device_id: u16) -> Option<Self::Config> {
        (**self).lookup_config(device_id)
    }

    fn initialize(&mut self, config: &Self::Config) -> Result<(), Self::Error> {
        (**self).initialize(config)
    }

    fn has_scatter_gather(&self) -> bool {
        (**self).has_scatter_gather()
    }

    fn start_simple_transfer<B>(
        &mut self,
        buffer: &mut B,
        direction: Direction,
    ) -> Result<(), Self::Error>
    where
        B: DmaBufferMut + ?Sized,
    {
        (**self).start_simple_transfer(buffer, direction)
    }

    fn is_busy(&self, direction: Direction) -> bool {
        (**self).is_busy(direction)
    }
}

/// How long to wait for the engine to go idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PollLimit {
    /// Spin until idle. A wedged engine hangs the caller.
    #[default]
    Unbounded,
    /// Give up after this many busy polls.
    MaxPolls(u32),
}

/// The engine was still busy after the configured number of polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TransferStalled {
    /// Busy polls observed before giving up.
    pub polls: u32,
}

/// DMA transfer that owns its buffer
pub struct DmaTransfer<B, E> {
    buffer: B,
    engine: E,
    direction: Direction,
}

impl<B, E> DmaTransfer<B, E>
where
    B: DmaBufferMut,
    E: TransferEngine,
{
    /// Create a new DMA transfer
    ///
    /// # Safety
    ///
    /// Buffer must remain valid for the duration of the transfer.
    /// The returned [`DmaTransferActive`] must be waited on, not dropped:
    /// dropping it releases the buffer while the engine may still write to it.
    pub unsafe fn new(buffer: B, engine: E, direction: Direction) -> Self {
        Self {
            buffer,
            engine,
            direction,
        }
    }

    /// Start the transfer
    pub fn start(mut self) -> Result<DmaTransferActive<B, E>, E::Error> {
        self.engine
            .start_simple_transfer(&mut self.buffer, self.direction)?;
        Ok(DmaTransferActive {
            buffer: self.buffer,
            engine: self.engine,
            direction: self.direction,
        })
    }
}

/// Active DMA transfer
pub struct DmaTransferActive<B, E> {
    buffer: B,
    engine: E,
    direction: Direction,
}

impl<B, E> DmaTransferActive<B, E>
where
    E: TransferEngine,
{
    /// Busy-poll until the engine reports the channel idle, then hand the
    /// buffer and engine back.
    pub fn wait(self, limit: PollLimit) -> Result<(B, E), TransferStalled> {
        let mut polls: u32 = 0;
        while self.engine.is_busy(self.direction) {
            if let PollLimit::MaxPolls(max) = limit {
                if polls >= max {
                    return Err(TransferStalled { polls });
                }
            }
            polls = polls.saturating_add(1);
            core::hint::spin_loop();
        }
        Ok((self.buffer, self.engine))
    }
}

/// DMA buffer trait (read-only access)
pub trait DmaBuffer {
    /// Buffer contents as seen by the CPU.
    fn as_slice(&self) -> &[u8];

    /// Get buffer pointer
    fn as_ptr(&self) -> *const u8 {
        self.as_slice().as_ptr()
    }

    /// Bus address handed to the engine (identity-mapped on this SoC).
    fn address(&self) -> usize {
        self.as_ptr() as usize
    }

    /// Get buffer length
    fn len(&self) -> usize {
        self.as_slice().len()
    }

    /// Check if buffer is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// DMA buffer trait (read-write access)
pub trait DmaBufferMut: DmaBuffer {
    /// Mutable view of the buffer contents.
    fn as_mut_slice(&mut self) -> &mut [u8];

    /// Get mutable buffer pointer
    fn as_mut_ptr(&mut self) -> *mut u8 {
        self.as_mut_slice().as_mut_ptr()
    }
}

impl DmaBuffer for [u8] {
    fn as_slice(&self) -> &[u8] {
        self
    }
}

impl DmaBufferMut for [u8] {
    fn as_mut_slice(&mut self) -> &mut [u8] {
        self
    }
}

impl<const N: usize> DmaBuffer for [u8; N] {
    fn as_slice(&self) -> &[u8] {
        self
    }
}

impl<const N: usize> DmaBufferMut for [u8; N] {
    fn as_mut_slice(&mut self) -> &mut [u8] {
        self
    }
}

impl<T: DmaBuffer + ?Sized> DmaBuffer for &T {
    fn as_slice(&self) -> &[u8] {
        (**self).as_slice()
    }
}

impl<T: DmaBuffer + ?Sized> DmaBuffer for &mut T {
    fn as_slice(&self) -> &[u8] {
        (**self).as_slice()
    }
}

impl<T: DmaBufferMut + ?Sized> DmaBufferMut for &mut T {
    fn as_mut_slice(&mut self) -> &mut [u8] {
        (**self).as_mut_slice()
    }
}

/// Fixed-size receive buffer handle.
///
/// Wraps either 32-byte aligned storage owned by the caller (host tests,
/// simulation) or a pinned physical DRAM region (hardware). The acquisition
/// loop only ever sees this handle, never the physical address.
pub struct RxBuffer<'a, const N: usize = TRANSFER_LEN> {
    bytes: &'a mut [u8; N],
}

impl<'a, const N: usize> RxBuffer<'a, N> {
    /// Borrow aligned storage as a receive buffer.
    pub fn new(storage: &'a mut Align32<[u8; N]>) -> Self {
        Self {
            bytes: &mut storage.0,
        }
    }

    /// Buffer contents.
    pub fn bytes(&self) -> &[u8; N] {
        self.bytes
    }
}

impl<const N: usize> RxBuffer<'static, N> {
    /// Wrap a pinned physical region.
    ///
    /// # Safety
    ///
    /// `address` must be the start of `N` bytes of identity-mapped DRAM that
    /// nothing else in the program references for the rest of its life, and
    /// must be aligned to [`crate::dma_safety::CACHE_LINE_BYTES`] so cache
    /// maintenance on the buffer cannot touch neighbouring data.
    pub unsafe fn from_raw_address(address: usize) -> Self {
        // SAFETY: exclusivity, size and alignment are the caller's contract.
        let bytes = unsafe { &mut *(address as *mut [u8; N]) };
        Self { bytes }
    }
}

impl<const N: usize> DmaBuffer for RxBuffer<'_, N> {
    fn as_slice(&self) -> &[u8] {
        self.bytes
    }
}

impl<const N: usize> DmaBufferMut for RxBuffer<'_, N> {
    fn as_mut_slice(&mut self) -> &mut [u8] {
        self.bytes
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::dma_safety::CACHE_LINE_BYTES;
    use crate::mocks::MockTransferEngine;

    #[test]
    fn rx_buffer_is_cache_line_aligned() {
        let mut storage = Align32([0u8; TRANSFER_LEN]);
        let buffer = RxBuffer::new(&mut storage);
        assert_eq!(buffer.address() % CACHE_LINE_BYTES, 0);
        assert_eq!(buffer.len(), TRANSFER_LEN);
    }

    #[test]
    fn transfer_returns_buffer_with_frame_written() {
        let mut storage = Align32([0u8; TRANSFER_LEN]);
        let mut buffer = RxBuffer::new(&mut storage);
        let mut engine = MockTransferEngine::new().with_word(0x8000_0005);

        // SAFETY: the transfer is waited on below.
        let transfer = unsafe { DmaTransfer::new(&mut buffer, &mut engine, Direction::DeviceToMemory) };
        let active = transfer.start().unwrap();
        let (buf, _engine) = active.wait(PollLimit::Unbounded).unwrap();
        assert_eq!(&buf.bytes()[..4], &0x8000_0005u32.to_le_bytes());
    }

    #[test]
    fn bounded_wait_reports_stall() {
        let mut storage = Align32([0u8; 8]);
        let mut buffer = RxBuffer::new(&mut storage);
        let mut engine = MockTransferEngine::new().stuck_busy();

        // SAFETY: the mock never touches the buffer after start.
        let transfer = unsafe { DmaTransfer::new(&mut buffer, &mut engine, Direction::DeviceToMemory) };
        let active = transfer.start().unwrap();
        let err = active.wait(PollLimit::MaxPolls(50)).err().unwrap();
        assert_eq!(err, TransferStalled { polls: 50 });
    }

    #[test]
    fn wait_polls_until_idle() {
        let mut storage = Align32([0u8; 8]);
        let mut buffer = RxBuffer::new(&mut storage);
        let mut engine = MockTransferEngine::new().with_busy_polls(3);

        // SAFETY: the transfer is waited on below.
        let transfer = unsafe { DmaTransfer::new(&mut buffer, &mut engine, Direction::DeviceToMemory) };
        let (_, engine) = transfer.start().unwrap().wait(PollLimit::MaxPolls(10)).unwrap();
        // three busy answers, then the idle answer that ends the loop
        assert_eq!(engine.busy_polls(), 4);
    }
}
