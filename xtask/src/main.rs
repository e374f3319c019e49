// Desktop/tooling crate: unwrap/expect/panic acceptable in non-embedded code.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod check;
mod crc_vectors;
mod flash;
mod monitor;
mod step;
mod test;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "BiSS DMA acquisition development tasks", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build firmware and load it into a Zynq-7000 over JTAG via xsdb
    Flash {
        /// Build and load the release profile
        #[arg(short, long)]
        release: bool,
        /// ps7_init.tcl exported with the hardware design. Omit when the
        /// FSBL has already initialised clocks and DDR.
        #[arg(long)]
        ps7_init: Option<PathBuf>,
        /// Write the xsdb script and print it without touching the board
        #[arg(long)]
        dry_run: bool,
    },
    /// Check firmware builds for the hardware target and the host simulator
    Check,
    /// Run all tests (unit and integration)
    Test {
        /// Run only unit tests
        #[arg(long)]
        unit: bool,
        /// Run only integration tests
        #[arg(long)]
        integration: bool,
    },
    /// Decode the CSV stream from a serial device or a captured log
    Monitor {
        /// Serial device (e.g. /dev/ttyUSB1) or capture file
        input: PathBuf,
        /// Baud rate applied with stty when `input` is a tty
        #[arg(long, default_value_t = monitor::DEFAULT_BAUD)]
        baud: u32,
        /// Emit one JSON object per record and a JSON summary
        #[arg(long)]
        json: bool,
        /// Stop after this many records
        #[arg(long)]
        limit: Option<u64>,
    },
    /// Print CRC-6 reference vectors and the matching HDL constant array
    CrcVectors {
        /// Extra positions to include (hex, with or without 0x)
        #[arg(value_parser = crc_vectors::parse_position)]
        positions: Vec<u32>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Flash {
            release,
            ps7_init,
            dry_run,
        } => flash::run(release, ps7_init.as_deref(), dry_run),
        Commands::Check => check::run(),
        Commands::Test { unit, integration } => test::run(unit, integration),
        Commands::Monitor {
            input,
            baud,
            json,
            limit,
        } => monitor::run(&input, baud, json, limit),
        Commands::CrcVectors { positions } => crc_vectors::run(&positions),
    }
}
