//! Acquisition cycle
//!
//! One cycle moves a fixed-length frame from the encoder stream into the
//! receive buffer and reports the status word at its head:
//!
//! ```text
//! zero buffer -> flush -> start S2MM -> poll until idle -> invalidate
//!             -> decode first word -> print record
//! ```
//!
//! The buffer handle is injected, so the same loop runs against the pinned
//! DDR region on hardware and against plain memory in tests and simulation.

use core::convert::Infallible;

use biss::packet::WORD_BYTES;
use biss::StatusPacket;
use embedded_hal::delay::DelayNs;
use embedded_io::Write;
use platform::{
    CacheMaintenance, Direction, DmaBuffer, DmaBufferMut, DmaTransfer, SerialConsole,
    StartupGate, TransferEngine,
};

use crate::config::{AcquisitionConfig, OutputFormat};
use crate::error::FatalError;
use crate::report;
use crate::setup::{bring_up, fail};

/// The acquisition loop and everything it owns.
pub struct AcquisitionCycle<E, C, S, D, B> {
    engine: E,
    cache: C,
    serial: S,
    delay: D,
    buffer: B,
    config: AcquisitionConfig,
    transfer_len: usize,
    cycles: u32,
}

impl<E, C, S, D, B> AcquisitionCycle<E, C, S, D, B>
where
    E: TransferEngine,
    C: CacheMaintenance,
    S: Write,
    D: DelayNs,
    B: DmaBufferMut,
{
    /// Assemble a cycle over initialized collaborators.
    ///
    /// The transfer length is `config.transfer_len` clamped to the buffer,
    /// and never shorter than one status word.
    pub fn new(
        engine: E,
        cache: C,
        serial: S,
        delay: D,
        buffer: B,
        config: AcquisitionConfig,
    ) -> Result<Self, FatalError> {
        let capacity = buffer.len();
        if capacity < WORD_BYTES {
            return Err(FatalError::BufferTooSmall { len: capacity });
        }
        let transfer_len = config.transfer_len.max(WORD_BYTES).min(capacity);

        Ok(Self {
            engine,
            cache,
            serial,
            delay,
            buffer,
            config,
            transfer_len,
            cycles: 0,
        })
    }

    /// Run one cycle without the pacing delay.
    pub fn run_cycle(&mut self) -> Result<StatusPacket, FatalError> {
        let Self {
            engine,
            cache,
            serial,
            buffer,
            config,
            transfer_len,
            cycles,
            ..
        } = self;

        let Some(region) = buffer.as_mut_slice().get_mut(..*transfer_len) else {
            return Err(FatalError::BufferTooSmall { len: *transfer_len });
        };
        region.fill(0);
        let (address, len) = (region.as_ptr() as usize, region.len());

        cache.flush_range(address, len);

        // SAFETY: the transfer is waited on below before the region is read,
        // and an early return only happens when the engine never started.
        let transfer = unsafe { DmaTransfer::new(region, &mut *engine, Direction::DeviceToMemory) };
        let active = transfer.start().map_err(|_e| {
            #[cfg(feature = "defmt")]
            defmt::error!("simple transfer rejected: {}", defmt::Debug2Format(&_e));
            fail(&mut *serial, FatalError::TransferStart)
        })?;
        let (region, _) = active
            .wait(config.poll_limit)
            .map_err(|stall| fail(&mut *serial, stall.into()))?;

        cache.invalidate_range(address, len);

        let packet = StatusPacket::from_buffer(region).unwrap_or_default();
        match config.output {
            OutputFormat::Csv => report::record(serial, &packet),
            OutputFormat::RawEcho => report::raw(serial, region),
        }

        *cycles = cycles.wrapping_add(1);
        #[cfg(feature = "defmt")]
        defmt::debug!("cycle {=u32}: {}", *cycles, packet);
        Ok(packet)
    }

    /// Run `count` paced cycles.
    pub fn run_for(&mut self, count: u32) -> Result<(), FatalError> {
        for _ in 0..count {
            self.run_cycle()?;
            self.delay.delay_ms(self.config.report_interval_ms);
        }
        Ok(())
    }

    /// Run paced cycles until a fatal error.
    pub fn run_forever(&mut self) -> Result<Infallible, FatalError> {
        loop {
            self.run_cycle()?;
            self.delay.delay_ms(self.config.report_interval_ms);
        }
    }

    /// Completed cycles (wraps).
    pub fn cycles(&self) -> u32 {
        self.cycles
    }

    /// Bytes moved per transfer.
    pub fn transfer_len(&self) -> usize {
        self.transfer_len
    }

    /// Active configuration.
    pub fn config(&self) -> &AcquisitionConfig {
        &self.config
    }

    /// Receive buffer as left by the last cycle.
    pub fn buffer(&self) -> &B {
        &self.buffer
    }

    /// Console, for inspection.
    pub fn serial(&self) -> &S {
        &self.serial
    }

    /// Transfer engine, for inspection.
    pub fn engine(&self) -> &E {
        &self.engine
    }
}

/// Bring up, then acquire forever.
///
/// Only returns on a fatal error. A failure before the loop starts never
/// touches the transfer engine beyond lookup and initialize.
pub fn run<E, C, S, D, G, B>(
    mut engine: E,
    mut cache: C,
    mut serial: S,
    delay: D,
    mut gate: G,
    buffer: B,
    config: AcquisitionConfig,
) -> Result<Infallible, FatalError>
where
    E: TransferEngine,
    C: CacheMaintenance,
    S: SerialConsole,
    D: DelayNs,
    G: StartupGate,
    B: DmaBufferMut,
{
    bring_up(&mut engine, &mut cache, &mut serial, &mut gate, &config)?;
    AcquisitionCycle::new(engine, cache, serial, delay, buffer, config)?.run_forever()
}
