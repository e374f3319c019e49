//! Integration test: full bring-up and acquisition runs against mock collaborators.
//!
//! Tests that:
//!   1. Each bring-up failure returns the generic failure status after its diagnostic
//!   2. A missing DMA configuration never starts a transfer or polls the engine
//!   3. Every transfer is bracketed by flush and invalidate of the same range
//!   4. The documented status-word scenarios produce the documented records
//!   5. Only the first word of the frame reaches the record
//!   6. CRC failures are reported, not filtered
//!
//! Does NOT require physical hardware.
//!
//! Run with: cargo test -p firmware --test integration_acquisition

// Integration test file -- intentional test patterns permitted.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
)]

use biss::{format_record, StatusPacket};
use embedded_hal_mock::eh1::delay::NoopDelay;
use firmware::{run, AcquisitionConfig, AcquisitionCycle, FatalError, XST_FAILURE};
use platform::config::TRANSFER_LEN;
use platform::dma_safety::Align32;
use platform::mocks::{
    CountingGate, Journal, MockCache, MockDelay, MockEvent, MockSerial, MockTransferEngine,
};
use platform::{Direction, DmaBuffer, OpenGate, RxBuffer};
use proptest::prelude::*;

const BANNER: &str = "Starting DMA->UART example";
const HEADER: &str = "position, error_bit, warning_bit, crc_failed_bit";

/// Run bring-up plus the loop until the mocks force a fatal error.
fn run_until_fatal(
    engine: &mut MockTransferEngine,
    serial: &mut MockSerial,
    gate: &mut CountingGate,
) -> FatalError {
    let mut storage = Align32([0u8; TRANSFER_LEN]);
    match run(
        engine,
        MockCache::new(),
        serial,
        NoopDelay::new(),
        gate,
        RxBuffer::new(&mut storage),
        AcquisitionConfig::csv(),
    ) {
        Ok(never) => match never {},
        Err(error) => error,
    }
}

fn cycle_over<'a>(
    engine: MockTransferEngine,
    storage: &'a mut Align32<[u8; TRANSFER_LEN]>,
) -> AcquisitionCycle<MockTransferEngine, MockCache, MockSerial, NoopDelay, RxBuffer<'a>> {
    AcquisitionCycle::new(
        engine,
        MockCache::new(),
        MockSerial::new(),
        NoopDelay::new(),
        RxBuffer::new(storage),
        AcquisitionConfig::csv(),
    )
    .unwrap()
}

// -- Fatal paths -------------------------------------------------------------

#[test]
fn missing_uart_parks_at_gate_then_fails_silently() {
    let journal = Journal::new();
    let mut engine = MockTransferEngine::new().with_journal(&journal);
    let mut serial = MockSerial::new().absent().with_journal(&journal);
    let mut gate = CountingGate::new().with_journal(&journal);

    let error = run_until_fatal(&mut engine, &mut serial, &mut gate);

    assert_eq!(error, FatalError::SerialLookup);
    assert_eq!(gate.waits(), 1);
    assert_eq!(journal.events(), vec![MockEvent::GateWait]);
    assert!(serial.bytes().is_empty(), "no console exists to print on");
    assert!(!engine.is_initialized());
}

#[test]
fn uart_init_failure_is_fatal_before_banner() {
    let mut engine = MockTransferEngine::new();
    let mut serial = MockSerial::new().failing_init();
    let error = run_until_fatal(&mut engine, &mut serial, &mut CountingGate::new());

    assert_eq!(error, FatalError::SerialInit);
    assert!(serial.bytes().is_empty());
    assert_eq!(engine.transfers(), 0);
}

#[test]
fn dma_failures_print_their_diagnostic_after_the_banner() {
    let cases = [
        (MockTransferEngine::new().absent(), FatalError::DmaLookup, "DMA lookup config failed"),
        (MockTransferEngine::new().failing_init(), FatalError::DmaInit, "DMA init failed"),
        (
            MockTransferEngine::new().scatter_gather(),
            FatalError::ScatterGatherMode,
            "DMA configured in Scatter-Gather mode; acquisition expects Simple mode",
        ),
        (MockTransferEngine::new().failing_start(), FatalError::TransferStart, "DMA transfer start failed"),
    ];

    for (mut engine, expected, diagnostic) in cases {
        let mut serial = MockSerial::new();
        let error = run_until_fatal(&mut engine, &mut serial, &mut CountingGate::new());

        assert_eq!(error, expected);
        assert_eq!(error.status(), XST_FAILURE);
        let lines = serial.lines();
        assert_eq!(lines.first().map(String::as_str), Some(BANNER));
        assert_eq!(lines.last().map(String::as_str), Some(diagnostic), "{expected:?}");
    }
}

#[test]
fn missing_dma_config_never_reaches_transfer_or_polling() {
    let journal = Journal::new();
    let mut engine = MockTransferEngine::new().absent().with_journal(&journal);
    let mut serial = MockSerial::new();

    let error = run_until_fatal(&mut engine, &mut serial, &mut CountingGate::new());

    assert_eq!(error, FatalError::DmaLookup);
    assert_eq!(engine.transfers(), 0);
    assert_eq!(engine.busy_polls(), 0);
    assert!(!journal.events().iter().any(|e| matches!(
        e,
        MockEvent::TransferStart { .. } | MockEvent::BusyPoll | MockEvent::Flush { .. }
    )));
}

#[test]
fn csv_stream_is_banner_header_then_records() {
    // Two good cycles, then a rejected start ends the run.
    let mut engine = MockTransferEngine::new().with_words([0x2000_0000, 0x8000_0005]);
    let mut serial = MockSerial::new();
    let mut storage = Align32([0u8; TRANSFER_LEN]);
    let mut cycle = AcquisitionCycle::new(
        &mut engine,
        MockCache::new(),
        &mut serial,
        MockDelay::new(),
        RxBuffer::new(&mut storage),
        AcquisitionConfig::csv(),
    )
    .unwrap();
    cycle.run_for(2).unwrap();
    drop(cycle);

    assert_eq!(serial.output(), "0, 0, 0, 1\r\n5, 1, 0, 0\r\n");

    let mut serial = MockSerial::new();
    let error = run_until_fatal(
        &mut MockTransferEngine::new().failing_start(),
        &mut serial,
        &mut CountingGate::new(),
    );
    assert_eq!(error, FatalError::TransferStart);
    assert_eq!(serial.lines()[..2], [BANNER.to_string(), HEADER.to_string()]);
}

// -- Cycle ordering ----------------------------------------------------------

#[test]
fn every_transfer_is_bracketed_by_flush_and_invalidate() {
    let journal = Journal::new();
    let mut storage = Align32([0u8; TRANSFER_LEN]);
    let buffer = RxBuffer::new(&mut storage);
    let address = buffer.address();
    let mut cycle = AcquisitionCycle::new(
        MockTransferEngine::new()
            .with_words([1, 2, 3])
            .with_busy_polls(5)
            .with_journal(&journal),
        MockCache::new().with_journal(&journal),
        MockSerial::new().with_journal(&journal),
        MockDelay::new().with_journal(&journal),
        buffer,
        AcquisitionConfig::csv(),
    )
    .unwrap();

    cycle.run_for(3).unwrap();

    let one_cycle = [
        MockEvent::Flush { address, len: TRANSFER_LEN },
        MockEvent::TransferStart { address, length: TRANSFER_LEN, was_zeroed: true },
        MockEvent::Invalidate { address, len: TRANSFER_LEN },
        MockEvent::Delay { ns: 100_000_000 },
    ];
    let expected: Vec<MockEvent> = one_cycle.iter().cloned().cycle().take(12).collect();
    assert_eq!(journal.milestones(), expected);
    assert_eq!(cycle.engine().busy_polls(), 3 * 6);
    assert_eq!(cycle.engine().last_direction(), Some(Direction::DeviceToMemory));
    assert_eq!(cycle.cycles(), 3);
}

#[test]
fn raw_echo_revision_paces_at_one_second() {
    let journal = Journal::new();
    let delay = MockDelay::new().with_journal(&journal);
    let mut storage = Align32([0u8; TRANSFER_LEN]);
    let mut cycle = AcquisitionCycle::new(
        MockTransferEngine::new().with_word(0xDEAD_BEEF),
        MockCache::new(),
        MockSerial::new(),
        delay,
        RxBuffer::new(&mut storage),
        AcquisitionConfig::raw_echo(),
    )
    .unwrap();

    cycle.run_for(2).unwrap();

    let out = cycle.serial().bytes();
    assert_eq!(out.len(), 2 * TRANSFER_LEN);
    assert_eq!(out[..4], 0xDEAD_BEEFu32.to_le_bytes());
    assert_eq!(
        journal.events(),
        vec![MockEvent::Delay { ns: 1_000_000_000 }; 2]
    );
}

// -- Scenarios ---------------------------------------------------------------

#[test]
fn documented_records() {
    let cases: [(u32, &str); 5] = [
        (0x2000_0000, "0, 0, 0, 1\r\n"),
        (0x8000_0005, "5, 1, 0, 0\r\n"),
        (0x1FFF_FFFF, "536870911, 0, 0, 0\r\n"),
        (0xFFFF_FFFF, "536870911, 1, 1, 1\r\n"),
        (0, "0, 0, 0, 0\r\n"),
    ];
    for (word, expected) in cases {
        let mut storage = Align32([0u8; TRANSFER_LEN]);
        let mut cycle = cycle_over(MockTransferEngine::new().with_word(word), &mut storage);
        cycle.run_cycle().unwrap();
        assert_eq!(cycle.serial().output(), expected, "word {word:#010x}");
    }
}

#[test]
fn crc_failure_still_reports_position() {
    let mut storage = Align32([0u8; TRANSFER_LEN]);
    let mut cycle = cycle_over(
        MockTransferEngine::new().with_word(0x2000_0000 | 123_456),
        &mut storage,
    );
    let packet = cycle.run_cycle().unwrap();
    assert!(packet.crc_failed);
    assert_eq!(packet.position.get(), 123_456);
    assert_eq!(cycle.serial().output(), "123456, 0, 0, 1\r\n");
}

proptest! {
    #[test]
    fn record_depends_only_on_first_word(
        word in any::<u32>(),
        tail in proptest::collection::vec(any::<u8>(), TRANSFER_LEN - 4),
    ) {
        let mut frame = word.to_le_bytes().to_vec();
        frame.extend_from_slice(&tail);

        let mut storage = Align32([0u8; TRANSFER_LEN]);
        let mut cycle = cycle_over(MockTransferEngine::new().with_frame(&frame), &mut storage);
        let packet = cycle.run_cycle().unwrap();

        let expected = format_record(&packet);
        prop_assert_eq!(packet, StatusPacket::from_word(word));
        prop_assert_eq!(cycle.serial().output(), expected.as_str());
    }
}

// -- Gate --------------------------------------------------------------------

#[test]
fn open_gate_does_not_block_a_missing_uart() {
    let mut storage = Align32([0u8; TRANSFER_LEN]);
    let result = run(
        MockTransferEngine::new(),
        MockCache::new(),
        MockSerial::new().absent(),
        NoopDelay::new(),
        OpenGate,
        RxBuffer::new(&mut storage),
        AcquisitionConfig::csv(),
    );
    assert_eq!(result.err(), Some(FatalError::SerialLookup));
}
