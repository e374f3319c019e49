//! Bring-up sequence
//!
//! Runs once, before the acquisition loop. Every failure is fatal.

use platform::{CacheMaintenance, SerialConsole, StartupGate, TransferEngine};

use crate::config::{AcquisitionConfig, OutputFormat};
use crate::error::FatalError;
use crate::report;

/// Ordered list of bring-up steps for documentation and testing.
///
/// # Correctness Invariants
///
/// - The data cache is enabled first: every later step, and every transfer,
///   runs with caching on, which is why the acquisition cycle brackets each
///   transfer with explicit flush and invalidate.
/// - The console comes up before the DMA engine so DMA failures can be
///   reported on it. A missing console can only be reported over RTT, after
///   which bring-up parks at the startup gate.
/// - Scatter-gather mode is rejected before the first transfer: simple-mode
///   register writes against a descriptor-mode engine are silently ignored.
pub const BRING_UP_STEPS: &[&str] = &[
    "1. D-cache: enable (transfers use explicit flush/invalidate)",
    "2. UART: lookup config; if absent, log and park at the startup gate",
    "3. UART: initialize 115200 8N1",
    "4. Console: print banner",
    "5. AXI DMA: lookup config and initialize (reset)",
    "6. AXI DMA: reject scatter-gather mode",
    "7. Console: print CSV header (CSV output only)",
];

/// Bring the collaborators up in [`BRING_UP_STEPS`] order.
pub fn bring_up<E, C, S, G>(
    dma: &mut E,
    cache: &mut C,
    serial: &mut S,
    gate: &mut G,
    config: &AcquisitionConfig,
) -> Result<(), FatalError>
where
    E: TransferEngine,
    C: CacheMaintenance,
    S: SerialConsole,
    G: StartupGate,
{
    cache.enable_data_cache();

    let Some(uart_config) = serial.lookup_config(config.uart_device_id) else {
        #[cfg(feature = "defmt")]
        defmt::error!(
            "UART {=u16} not found - attach debugger now if needed, then release the startup gate",
            config.uart_device_id
        );
        gate.wait_for_release();
        return Err(FatalError::SerialLookup);
    };

    if serial.initialize(&uart_config, config.line).is_err() {
        #[cfg(feature = "defmt")]
        defmt::error!("UART init failed");
        return Err(FatalError::SerialInit);
    }

    report::banner(serial);
    #[cfg(feature = "defmt")]
    defmt::info!("console up at {=u32} baud", config.line.baud_rate);

    let Some(dma_config) = dma.lookup_config(config.dma_device_id) else {
        return Err(fail(serial, FatalError::DmaLookup));
    };

    if dma.initialize(&dma_config).is_err() {
        return Err(fail(serial, FatalError::DmaInit));
    }

    if dma.has_scatter_gather() {
        return Err(fail(serial, FatalError::ScatterGatherMode));
    }

    if config.output == OutputFormat::Csv {
        report::header(serial);
    }

    #[cfg(feature = "defmt")]
    defmt::info!("bring-up complete: {}", config.output);
    Ok(())
}

/// Report `error` on the console and RTT, then hand it back.
pub(crate) fn fail<S: embedded_io::Write>(serial: &mut S, error: FatalError) -> FatalError {
    #[cfg(feature = "defmt")]
    defmt::error!("fatal: {}", error);
    report::fatal(serial, error);
    error
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;
    use platform::mocks::{
        CountingGate, Journal, MockCache, MockEvent, MockSerial, MockTransferEngine,
    };

    fn run(
        dma: &mut MockTransferEngine,
        serial: &mut MockSerial,
        gate: &mut CountingGate,
        config: &AcquisitionConfig,
    ) -> Result<(), FatalError> {
        bring_up(dma, &mut MockCache::new(), serial, gate, config)
    }

    #[test]
    fn test_happy_path_prints_banner_then_header() {
        let mut dma = MockTransferEngine::new();
        let mut serial = MockSerial::new();
        let mut gate = CountingGate::new();
        run(&mut dma, &mut serial, &mut gate, &AcquisitionConfig::csv()).unwrap();

        assert!(dma.is_initialized());
        assert_eq!(gate.waits(), 0);
        assert_eq!(
            serial.lines(),
            vec![
                "Starting DMA->UART example".to_string(),
                "position, error_bit, warning_bit, crc_failed_bit".to_string(),
            ]
        );
    }

    #[test]
    fn test_data_cache_is_enabled_before_the_console_speaks() {
        let journal = Journal::new();
        let mut cache = MockCache::new().with_journal(&journal);
        let mut serial = MockSerial::new().with_journal(&journal);
        bring_up(
            &mut MockTransferEngine::new(),
            &mut cache,
            &mut serial,
            &mut CountingGate::new(),
            &AcquisitionConfig::csv(),
        )
        .unwrap();

        assert!(cache.is_enabled());
        let events = journal.events();
        assert_eq!(events.first(), Some(&MockEvent::CacheEnable));
        assert!(matches!(events.get(1), Some(MockEvent::SerialWrite { .. })));
        assert_eq!(events.iter().filter(|e| **e == MockEvent::CacheEnable).count(), 1);
    }

    #[test]
    fn test_missing_uart_enables_cache_then_waits_at_gate() {
        let journal = Journal::new();
        let result = bring_up(
            &mut MockTransferEngine::new(),
            &mut MockCache::new().with_journal(&journal),
            &mut MockSerial::new().absent().with_journal(&journal),
            &mut CountingGate::new().with_journal(&journal),
            &AcquisitionConfig::csv(),
        );

        assert_eq!(result, Err(FatalError::SerialLookup));
        assert_eq!(journal.events(), vec![MockEvent::CacheEnable, MockEvent::GateWait]);
    }

    #[test]
    fn test_raw_echo_skips_header() {
        let mut serial = MockSerial::new();
        run(
            &mut MockTransferEngine::new(),
            &mut serial,
            &mut CountingGate::new(),
            &AcquisitionConfig::raw_echo(),
        )
        .unwrap();
        assert_eq!(serial.lines(), vec!["Starting DMA->UART example".to_string()]);
    }

    #[test]
    fn test_missing_uart_parks_at_gate() {
        let mut serial = MockSerial::new().absent();
        let mut gate = CountingGate::new();
        let result = run(
            &mut MockTransferEngine::new(),
            &mut serial,
            &mut gate,
            &AcquisitionConfig::csv(),
        );
        assert_eq!(result, Err(FatalError::SerialLookup));
        assert_eq!(gate.waits(), 1);
        assert!(serial.output().is_empty());
    }

    #[test]
    fn test_uart_init_failure_is_silent() {
        let mut serial = MockSerial::new().failing_init();
        let mut dma = MockTransferEngine::new();
        let result = run(&mut dma, &mut serial, &mut CountingGate::new(), &AcquisitionConfig::csv());
        assert_eq!(result, Err(FatalError::SerialInit));
        assert!(serial.output().is_empty());
        assert!(!dma.is_initialized());
    }

    #[test]
    fn test_uart_gets_configured_line_settings() {
        let mut serial = MockSerial::new();
        let config = AcquisitionConfig::csv();
        run(&mut MockTransferEngine::new(), &mut serial, &mut CountingGate::new(), &config).unwrap();
        assert_eq!(serial.line(), Some(config.line));
    }

    #[test]
    fn test_dma_failures_print_diagnostics() {
        let cases = [
            (MockTransferEngine::new().absent(), FatalError::DmaLookup, "DMA lookup config failed"),
            (MockTransferEngine::new().failing_init(), FatalError::DmaInit, "DMA init failed"),
            (
                MockTransferEngine::new().scatter_gather(),
                FatalError::ScatterGatherMode,
                "DMA configured in Scatter-Gather mode; acquisition expects Simple mode",
            ),
        ];
        for (mut dma, expected, diagnostic) in cases {
            let mut serial = MockSerial::new();
            let result = run(&mut dma, &mut serial, &mut CountingGate::new(), &AcquisitionConfig::csv());
            assert_eq!(result, Err(expected));
            assert_eq!(serial.lines().last().map(String::as_str), Some(diagnostic));
            assert_eq!(dma.transfers(), 0);
        }
    }

    #[test]
    fn test_steps_are_numbered_in_order() {
        for (i, step) in BRING_UP_STEPS.iter().enumerate() {
            assert!(step.starts_with(&format!("{}.", i + 1)), "step {i}: {step}");
        }
    }
}
