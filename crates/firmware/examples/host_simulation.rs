//! Host simulation of the acquisition loop
//!
//! Runs the real bring-up and acquisition code against a simulated BiSS
//! encoder. CSV records go to stdout exactly as they would leave the PS UART;
//! diagnostics go to stderr through `tracing`.
//!
//! Run with:
//! cargo run -p firmware --example host_simulation --features simulator -- [CYCLES] [SPEEDUP]
//!
//! `RUST_LOG=firmware=trace` shows every flush, invalidate and frame word.

use firmware::sim::{HostCache, SimulatedEncoder, StdDelay, StdoutConsole};
use firmware::{bring_up, AcquisitionConfig, AcquisitionCycle};
use platform::dma_safety::Align32;
use platform::{OpenGate, RxBuffer};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let cycles: u32 = args.next().map(|a| a.parse()).transpose()?.unwrap_or(50);
    let speedup: u32 = args.next().map(|a| a.parse()).transpose()?.unwrap_or(1);

    let config = AcquisitionConfig::csv();
    let mut encoder = SimulatedEncoder::new(0x0010_0000, 1_337)
        .with_warning_every(17)
        .with_error_every(41)
        .with_crc_fault_every(7);
    let mut cache = HostCache;
    let mut console = StdoutConsole::stdout();
    let mut storage = Align32([0u8; platform::config::TRANSFER_LEN]);

    tracing::info!(
        app = platform::config::APP_NAME,
        version = platform::config::APP_VERSION,
        cycles,
        speedup,
        "starting host simulation"
    );

    bring_up(&mut encoder, &mut cache, &mut console, &mut OpenGate, &config)?;

    let mut cycle = AcquisitionCycle::new(
        &mut encoder,
        cache,
        &mut console,
        StdDelay::accelerated(speedup),
        RxBuffer::new(&mut storage),
        config,
    )?;
    cycle.run_for(cycles)?;

    tracing::info!(cycles = cycle.cycles(), "simulation finished");
    Ok(())
}
