//! Mock implementations for testing
//!
//! This module provides mock implementations of all platform traits
//! for use in unit and integration tests. Mocks can share a [`Journal`]
//! so a test can assert the relative order of cache maintenance, transfer
//! start, busy polling, console output and delays.

#![cfg(any(test, feature = "std"))]
#![allow(clippy::arithmetic_side_effects)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use crate::cache::CacheMaintenance;
use crate::dma::{Direction, DmaBufferMut, TransferEngine};
use crate::gate::StartupGate;
use crate::serial::{SerialConsole, UartConfig};

/// One observable side effect of a mock collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockEvent {
    /// Data cache enabled.
    CacheEnable,
    /// Range flushed.
    Flush {
        /// Start address
        address: usize,
        /// Length in bytes
        len: usize,
    },
    /// Range invalidated.
    Invalidate {
        /// Start address
        address: usize,
        /// Length in bytes
        len: usize,
    },
    /// Simple transfer started.
    TransferStart {
        /// Buffer address handed to the engine
        address: usize,
        /// Transfer length in bytes
        length: usize,
        /// Every buffer byte was zero when the transfer started
        was_zeroed: bool,
    },
    /// Engine polled while still busy.
    BusyPoll,
    /// Bytes written to the console.
    SerialWrite {
        /// Number of bytes accepted
        len: usize,
    },
    /// Delay requested.
    Delay {
        /// Duration in nanoseconds
        ns: u64,
    },
    /// Startup gate entered.
    GateWait,
}

/// Shared, append-only event log.
#[derive(Debug, Clone, Default)]
pub struct Journal(Rc<RefCell<Vec<MockEvent>>>);

impl Journal {
    /// Create an empty journal
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event
    pub fn record(&self, event: MockEvent) {
        self.0.borrow_mut().push(event);
    }

    /// Snapshot of all events so far
    pub fn events(&self) -> Vec<MockEvent> {
        self.0.borrow().clone()
    }

    /// Events with busy polls and console writes filtered out.
    pub fn milestones(&self) -> Vec<MockEvent> {
        self.events()
            .into_iter()
            .filter(|e| !matches!(e, MockEvent::BusyPoll | MockEvent::SerialWrite { .. }))
            .collect()
    }
}

// ── DMA engine ───────────────────────────────────────────────────────────────

/// Configuration handed out by [`MockTransferEngine::lookup_config`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockDmaConfig {
    /// Device id the config was looked up with
    pub device_id: u16,
    /// Engine reports scatter-gather support
    pub has_scatter_gather: bool,
}

/// Mock DMA engine failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockDmaError {
    /// `initialize` was configured to fail
    InitFailed,
    /// `start_simple_transfer` was configured to fail
    StartFailed,
}

/// Mock AXI DMA engine.
///
/// Each started transfer copies the next queued frame into the buffer (the
/// last frame repeats once the queue runs dry), then reports busy for the
/// configured number of polls.
#[derive(Debug)]
pub struct MockTransferEngine {
    journal: Journal,
    present: bool,
    scatter_gather: bool,
    fail_init: bool,
    fail_start: bool,
    frames: VecDeque<Vec<u8>>,
    last_frame: Option<Vec<u8>>,
    busy_per_transfer: Option<u32>,
    busy_remaining: Cell<u32>,
    busy_polls: Cell<u32>,
    transfers: u32,
    initialized: bool,
    last_direction: Option<Direction>,
}

impl MockTransferEngine {
    /// Create a present, simple-mode engine that completes immediately
    pub fn new() -> Self {
        Self {
            journal: Journal::new(),
            present: true,
            scatter_gather: false,
            fail_init: false,
            fail_start: false,
            frames: VecDeque::new(),
            last_frame: None,
            busy_per_transfer: Some(0),
            busy_remaining: Cell::new(0),
            busy_polls: Cell::new(0),
            transfers: 0,
            initialized: false,
            last_direction: None,
        }
    }

    /// Record into `journal`
    #[must_use]
    pub fn with_journal(mut self, journal: &Journal) -> Self {
        self.journal = journal.clone();
        self
    }

    /// Queue a frame whose first word is `word` (little-endian)
    #[must_use]
    pub fn with_word(mut self, word: u32) -> Self {
        self.frames.push_back(word.to_le_bytes().to_vec());
        self
    }

    /// Queue one frame per word
    #[must_use]
    pub fn with_words(mut self, words: impl IntoIterator<Item = u32>) -> Self {
        self.frames
            .extend(words.into_iter().map(|w| w.to_le_bytes().to_vec()));
        self
    }

    /// Queue a raw frame
    #[must_use]
    pub fn with_frame(mut self, frame: &[u8]) -> Self {
        self.frames.push_back(frame.to_vec());
        self
    }

    /// Report busy `polls` times per transfer before going idle
    #[must_use]
    pub fn with_busy_polls(mut self, polls: u32) -> Self {
        self.busy_per_transfer = Some(polls);
        self
    }

    /// Never go idle
    #[must_use]
    pub fn stuck_busy(mut self) -> Self {
        self.busy_per_transfer = None;
        self
    }

    /// `lookup_config` finds nothing
    #[must_use]
    pub fn absent(mut self) -> Self {
        self.present = false;
        self
    }

    /// Report scatter-gather mode
    #[must_use]
    pub fn scatter_gather(mut self) -> Self {
        self.scatter_gather = true;
        self
    }

    /// Fail `initialize`
    #[must_use]
    pub fn failing_init(mut self) -> Self {
        self.fail_init = true;
        self
    }

    /// Fail `start_simple_transfer`
    #[must_use]
    pub fn failing_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    /// Number of transfers started
    pub fn transfers(&self) -> u32 {
        self.transfers
    }

    /// Total `is_busy` calls
    pub fn busy_polls(&self) -> u32 {
        self.busy_polls.get()
    }

    /// True after a successful `initialize`
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Direction of the most recent transfer
    pub fn last_direction(&self) -> Option<Direction> {
        self.last_direction
    }
}

impl Default for MockTransferEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TransferEngine for MockTransferEngine {
    type Config = MockDmaConfig;
    type Error = MockDmaError;

    fn lookup_config(&self, device_id: u16) -> Option<Self::Config> {
        self.present.then_some(MockDmaConfig {
            device_id,
            has_scatter_gather: self.scatter_gather,
        })
    }

    fn initialize(&mut self, _config: &Self::Config) -> Result<(), Self::Error> {
        if self.fail_init {
            return Err(MockDmaError::InitFailed);
        }
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
        if self.fail_start {
            return Err(MockDmaError::StartFailed);
        }
        self.journal.record(MockEvent::TransferStart {
            address: buffer.address(),
            length: buffer.len(),
            was_zeroed: buffer.as_slice().iter().all(|&b| b == 0),
        });

        if let Some(frame) = self.frames.pop_front() {
            self.last_frame = Some(frame);
        }
        if let Some(frame) = &self.last_frame {
            let target = buffer.as_mut_slice();
            let n = frame.len().min(target.len());
            if let (Some(dst), Some(src)) = (target.get_mut(..n), frame.get(..n)) {
                dst.copy_from_slice(src);
            }
        }

        self.busy_remaining.set(self.busy_per_transfer.unwrap_or(0));
        self.transfers += 1;
        self.last_direction = Some(direction);
        Ok(())
    }

    fn is_busy(&self, _direction: Direction) -> bool {
        self.busy_polls.set(self.busy_polls.get() + 1);
        let busy = match self.busy_per_transfer {
            None => true,
            Some(_) => {
                let remaining = self.busy_remaining.get();
                if remaining > 0 {
                    self.busy_remaining.set(remaining - 1);
                }
                remaining > 0
            }
        };
        if busy {
            self.journal.record(MockEvent::BusyPoll);
        }
        busy
    }
}

// ── Cache ────────────────────────────────────────────────────────────────────

/// Mock cache controller that only records calls.
#[derive(Debug, Default)]
pub struct MockCache {
    journal: Journal,
    enabled: bool,
}

impl MockCache {
    /// Create new mock cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Record into `journal`
    #[must_use]
    pub fn with_journal(mut self, journal: &Journal) -> Self {
        self.journal = journal.clone();
        self
    }

    /// True once `enable_data_cache` was called
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl CacheMaintenance for MockCache {
    fn enable_data_cache(&mut self) {
        self.enabled = true;
        self.journal.record(MockEvent::CacheEnable);
    }

    fn flush_range(&mut self, address: usize, len: usize) {
        self.journal.record(MockEvent::Flush { address, len });
    }

    fn invalidate_range(&mut self, address: usize, len: usize) {
        self.journal.record(MockEvent::Invalidate { address, len });
    }
}

// ── Serial ───────────────────────────────────────────────────────────────────

/// Mock serial console failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockSerialError;

impl embedded_io::Error for MockSerialError {
    fn kind(&self) -> embedded_io::ErrorKind {
        embedded_io::ErrorKind::Other
    }
}

/// Mock serial console capturing everything written.
#[derive(Debug)]
pub struct MockSerial {
    journal: Journal,
    present: bool,
    fail_init: bool,
    fail_writes: bool,
    line: Option<UartConfig>,
    output: Vec<u8>,
}

impl MockSerial {
    /// Create a present console that accepts all writes
    pub fn new() -> Self {
        Self {
            journal: Journal::new(),
            present: true,
            fail_init: false,
            fail_writes: false,
            line: None,
            output: Vec::new(),
        }
    }

    /// Record into `journal`
    #[must_use]
    pub fn with_journal(mut self, journal: &Journal) -> Self {
        self.journal = journal.clone();
        self
    }

    /// `lookup_config` finds nothing
    #[must_use]
    pub fn absent(mut self) -> Self {
        self.present = false;
        self
    }

    /// Fail `initialize`
    #[must_use]
    pub fn failing_init(mut self) -> Self {
        self.fail_init = true;
        self
    }

    /// Reject every write
    #[must_use]
    pub fn failing_writes(mut self) -> Self {
        self.fail_writes = true;
        self
    }

    /// Line settings passed to `initialize`
    pub fn line(&self) -> Option<UartConfig> {
        self.line
    }

    /// Everything written so far
    pub fn bytes(&self) -> &[u8] {
        &self.output
    }

    /// Everything written so far, lossily decoded
    pub fn output(&self) -> String {
        String::from_utf8_lossy(&self.output).into_owned()
    }

    /// Output split into lines without terminators
    pub fn lines(&self) -> Vec<String> {
        self.output().lines().map(str::to_owned).collect()
    }
}

impl Default for MockSerial {
    fn default() -> Self {
        Self::new()
    }
}

impl embedded_io::ErrorType for MockSerial {
    type Error = MockSerialError;
}

impl embedded_io::Write for MockSerial {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if self.fail_writes {
            return Err(MockSerialError);
        }
        self.output.extend_from_slice(buf);
        self.journal.record(MockEvent::SerialWrite { len: buf.len() });
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl SerialConsole for MockSerial {
    type Config = u16;

    fn lookup_config(&self, device_id: u16) -> Option<Self::Config> {
        self.present.then_some(device_id)
    }

    fn initialize(&mut self, _config: &Self::Config, line: UartConfig) -> Result<(), Self::Error> {
        if self.fail_init {
            return Err(MockSerialError);
        }
        self.line = Some(line);
        Ok(())
    }
}

// ── Delay ────────────────────────────────────────────────────────────────────

/// Delay that returns immediately and records the requested duration.
#[derive(Debug, Default)]
pub struct MockDelay {
    journal: Journal,
    total_ns: u64,
}

impl MockDelay {
    /// Create new mock delay
    pub fn new() -> Self {
        Self::default()
    }

    /// Record into `journal`
    #[must_use]
    pub fn with_journal(mut self, journal: &Journal) -> Self {
        self.journal = journal.clone();
        self
    }

    /// Sum of all requested delays
    pub fn total_ns(&self) -> u64 {
        self.total_ns
    }
}

impl embedded_hal::delay::DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += u64::from(ns);
        self.journal.record(MockEvent::Delay { ns: u64::from(ns) });
    }

    fn delay_ms(&mut self, ms: u32) {
        let ns = u64::from(ms) * 1_000_000;
        self.total_ns += ns;
        self.journal.record(MockEvent::Delay { ns });
    }
}

// ── Gate ─────────────────────────────────────────────────────────────────────

/// Gate that never blocks and counts how often it was entered.
#[derive(Debug, Default)]
pub struct CountingGate {
    journal: Journal,
    waits: u32,
}

impl CountingGate {
    /// Create new counting gate
    pub fn new() -> Self {
        Self::default()
    }

    /// Record into `journal`
    #[must_use]
    pub fn with_journal(mut self, journal: &Journal) -> Self {
        self.journal = journal.clone();
        self
    }

    /// Number of `wait_for_release` calls
    pub fn waits(&self) -> u32 {
        self.waits
    }
}

impl StartupGate for CountingGate {
    fn wait_for_release(&mut self) {
        self.waits += 1;
        self.journal.record(MockEvent::GateWait);
    }
}
