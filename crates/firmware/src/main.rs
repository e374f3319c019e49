//! BiSS DMA acquisition firmware - Main Entry Point
//!
//! Hardware-only entry point for the Zynq-7000 (Cortex-A9, `armv7a-none-eabi`).

#![no_std]
#![no_main]

mod boot;

use core::sync::atomic::AtomicBool;

use defmt_rtt as _;

use firmware::zynq::axi_dma::AXI_DMA_CONFIGS;
use firmware::zynq::mmu::TranslationTable;
use firmware::zynq::uart_ps::UART_PS_CONFIGS;
use firmware::zynq::{
    AxiDma, GlobalTimerDelay, UartPs, ZynqCache, GLOBAL_TIMER_BASE, GLOBAL_TIMER_HZ, L2CC_BASE,
};
use firmware::AcquisitionConfig;
use platform::dma_safety::RX_BUFFER_BASE;
use platform::{DebuggerGate, RxBuffer};

/// Set to `true` from the debugger to let a failed bring-up continue to the
/// fatal path, e.g. `set var DEBUG_RELEASE = 1` or an xsdb `mwr`.
#[no_mangle]
static DEBUG_RELEASE: AtomicBool = AtomicBool::new(false);

/// Identity map: DDR write-back, peripherals strongly ordered.
static TRANSLATION_TABLE: TranslationTable = TranslationTable::flat();

/// Called from the reset handler in `boot.rs`.
#[no_mangle]
extern "C" fn entry() -> ! {
    defmt::info!(
        "{=str} v{=str}",
        platform::config::APP_NAME,
        platform::config::APP_VERSION
    );
    for step in firmware::BRING_UP_STEPS {
        defmt::debug!("{=str}", step);
    }

    // SAFETY: the configuration tables and base addresses describe this
    // board's hardware handoff, and each driver is constructed exactly once.
    let (mut dma, mut cache, mut uart, mut delay) = unsafe {
        (
            AxiDma::new(AXI_DMA_CONFIGS),
            ZynqCache::new(L2CC_BASE, &TRANSLATION_TABLE),
            UartPs::new(UART_PS_CONFIGS),
            GlobalTimerDelay::new(GLOBAL_TIMER_BASE, GLOBAL_TIMER_HZ),
        )
    };
    delay.start();

    // SAFETY: link.x reserves the section at RX_BUFFER_BASE for the DMA and
    // places nothing else there; this is the only reference to it.
    let buffer: RxBuffer<'static> = unsafe { RxBuffer::from_raw_address(RX_BUFFER_BASE) };

    let gate = DebuggerGate::new(&DEBUG_RELEASE);

    let error = match firmware::run(
        &mut dma,
        &mut cache,
        &mut uart,
        &mut delay,
        gate,
        buffer,
        AcquisitionConfig::csv(),
    ) {
        Ok(never) => match never {},
        Err(error) => error,
    };
    defmt::error!(
        "acquisition stopped: {} (status {=i32})",
        error,
        error.status()
    );
    boot::halt()
}
