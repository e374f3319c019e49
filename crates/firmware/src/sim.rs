//! Host simulation of the encoder, DMA engine and console.
//!
//! Stands in for the PL and PS peripherals so the unmodified bring-up and
//! acquisition code can run on a desktop. The simulated encoder behaves like
//! the BiSS master in the PL: each frame carries a moving position, the
//! CRC-6 the encoder transmitted is checked against the position as received,
//! and a mismatch raises the CRC-fail bit.

use std::cell::Cell;
use std::io;
use std::time::Duration;

use biss::packet::WORD_BYTES;
use biss::{crc6, Position, StatusPacket};
use embedded_hal::delay::DelayNs;
use embedded_io::{ErrorKind, ErrorType};
use platform::{CacheMaintenance, Direction, DmaBufferMut, SerialConsole, TransferEngine, UartConfig};

/// Device id the simulated engine and console answer to.
pub const SIM_DEVICE_ID: u16 = 0;

/// Simulated engine configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimDmaConfig {
    /// Device id
    pub device_id: u16,
}

/// Simulated engine errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimError {
    /// Transfer requested before `initialize`
    NotInitialized,
    /// Engine configured for descriptor mode
    ScatterGather,
    /// Only device-to-memory is simulated
    UnsupportedDirection,
    /// Buffer shorter than one status word
    BufferTooShort,
}

/// BiSS encoder behind a simple-mode DMA engine.
#[derive(Debug)]
pub struct SimulatedEncoder {
    position: u32,
    step: u32,
    frames: u32,
    warning_every: u32,
    error_every: u32,
    crc_fault_every: u32,
    busy_polls: u32,
    remaining: Cell<u32>,
    scatter_gather: bool,
    initialized: bool,
}

impl SimulatedEncoder {
    /// Encoder starting at `start`, advancing `step` counts per frame.
    pub fn new(start: u32, step: u32) -> Self {
        Self {
            position: Position::from_word_bits(start).get(),
            step,
            frames: 0,
            warning_every: 0,
            error_every: 0,
            crc_fault_every: 0,
            busy_polls: 2,
            remaining: Cell::new(0),
            scatter_gather: false,
            initialized: false,
        }
    }

    /// Raise the warning bit on every `n`th frame (0 disables).
    pub fn with_warning_every(mut self, n: u32) -> Self {
        self.warning_every = n;
        self
    }

    /// Raise the error bit on every `n`th frame (0 disables).
    pub fn with_error_every(mut self, n: u32) -> Self {
        self.error_every = n;
        self
    }

    /// Corrupt one position bit in transit on every `n`th frame (0 disables).
    pub fn with_crc_fault_every(mut self, n: u32) -> Self {
        self.crc_fault_every = n;
        self
    }

    /// Report busy for `n` polls after each start.
    pub fn with_busy_polls(mut self, n: u32) -> Self {
        self.busy_polls = n;
        self
    }

    /// Build the engine in descriptor mode, which bring-up rejects.
    pub fn scatter_gather(mut self) -> Self {
        self.scatter_gather = true;
        self
    }

    /// Frames produced so far.
    pub fn frames(&self) -> u32 {
        self.frames
    }

    /// Status word for the next frame, advancing the encoder.
    pub fn next_word(&mut self) -> u32 {
        self.frames = self.frames.wrapping_add(1);
        let n = self.frames;
        let every = |period: u32| n.checked_rem(period) == Some(0);

        let transmitted_crc = crc6(self.position);
        let received = if every(self.crc_fault_every) {
            self.position ^ 1
        } else {
            self.position
        };
        let packet = StatusPacket {
            position: Position::from_word_bits(received),
            crc_failed: crc6(received) != transmitted_crc,
            warning: every(self.warning_every),
            error: every(self.error_every),
        };

        self.position = Position::from_word_bits(self.position.wrapping_add(self.step)).get();
        tracing::trace!(frame = n, word = packet.to_word(), "encoder frame");
        packet.to_word()
    }
}

impl TransferEngine for SimulatedEncoder {
    type Config = SimDmaConfig;
    type Error = SimError;

    fn lookup_config(&self, device_id: u16) -> Option<Self::Config> {
        (device_id == SIM_DEVICE_ID).then_some(SimDmaConfig { device_id })
    }

    fn initialize(&mut self, config: &Self::Config) -> Result<(), Self::Error> {
        tracing::info!(device_id = config.device_id, "simulated DMA reset");
        self.initialized = true;
        Ok(())
    }

    fn has_scatter_gather(&self) -> bool {
        self.scatter_gather
    }

    fn start_simple_transfer<B>(
        &mut self,
        buffer: &mut B,
        direction: Direction,
    ) -> Result<(), Self::Error>
    where
        B: DmaBufferMut + ?Sized,
    {
        if !self.initialized {
            return Err(SimError::NotInitialized);
        }
        if self.scatter_gather {
            return Err(SimError::ScatterGather);
        }
        if direction != Direction::DeviceToMemory {
            return Err(SimError::UnsupportedDirection);
        }

        let frame = buffer.as_mut_slice();
        if frame.len() < WORD_BYTES {
            return Err(SimError::BufferTooShort);
        }
        let word = self.next_word();
        let (head, tail) = frame.split_at_mut(WORD_BYTES);
        head.copy_from_slice(&word.to_le_bytes());
        // Trailing bytes: low byte of the frame counter, like the PL's debug fill pattern.
        tail.fill(self.frames.to_le_bytes()[0]);

        self.remaining.set(self.busy_polls);
        Ok(())
    }

    fn is_busy(&self, _direction: Direction) -> bool {
        let remaining = self.remaining.get();
        if remaining == 0 {
            return false;
        }
        self.remaining.set(remaining.saturating_sub(1));
        true
    }
}

/// Cache maintenance on a host with coherent memory: traced, otherwise a no-op.
#[derive(Debug, Default, Clone, Copy)]
pub struct HostCache;

impl CacheMaintenance for HostCache {
    fn enable_data_cache(&mut self) {
        tracing::debug!("data cache enable (no-op on host)");
    }

    fn flush_range(&mut self, address: usize, len: usize) {
        tracing::trace!(address, len, "flush");
    }

    fn invalidate_range(&mut self, address: usize, len: usize) {
        tracing::trace!(address, len, "invalidate");
    }
}

/// Serial console over any [`io::Write`].
#[derive(Debug)]
pub struct HostConsole<W> {
    out: W,
    line: Option<UartConfig>,
}

/// Console on the process's standard output.
pub type StdoutConsole = HostConsole<io::Stdout>;

impl StdoutConsole {
    /// Console on stdout.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: io::Write> HostConsole<W> {
    /// Console over `out`.
    pub fn new(out: W) -> Self {
        Self { out, line: None }
    }

    /// Line settings from `initialize`, if it ran.
    pub fn line(&self) -> Option<UartConfig> {
        self.line
    }

    /// The underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W> ErrorType for HostConsole<W> {
    type Error = ErrorKind;
}

impl<W: io::Write> embedded_io::Write for HostConsole<W> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.out.write(buf).map_err(|e| {
            tracing::warn!(error = %e, "console write failed");
            ErrorKind::Other
        })
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.out.flush().map_err(|_| ErrorKind::Other)
    }
}

impl<W: io::Write> SerialConsole for HostConsole<W> {
    type Config = u16;

    fn lookup_config(&self, device_id: u16) -> Option<Self::Config> {
        (device_id == SIM_DEVICE_ID).then_some(device_id)
    }

    fn initialize(&mut self, config: &Self::Config, line: UartConfig) -> Result<(), Self::Error> {
        tracing::info!(device_id = *config, baud = line.baud_rate, "simulated UART up");
        self.line = Some(line);
        Ok(())
    }
}

/// [`DelayNs`] on `std::thread::sleep`, optionally sped up.
#[derive(Debug, Clone, Copy)]
pub struct StdDelay {
    speedup: u32,
}

impl StdDelay {
    /// Real-time delays.
    pub fn new() -> Self {
        Self { speedup: 1 }
    }

    /// Delays shortened by `factor` (0 is treated as 1).
    pub fn accelerated(factor: u32) -> Self {
        Self {
            speedup: factor.max(1),
        }
    }
}

impl Default for StdDelay {
    fn default() -> Self {
        Self::new()
    }
}

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        let scaled = ns.checked_div(self.speedup).unwrap_or(ns);
        std::thread::sleep(Duration::from_nanos(u64::from(scaled)));
    }
}
