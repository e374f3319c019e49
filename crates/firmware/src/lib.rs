//! BiSS DMA acquisition firmware
//!
//! Bare-metal firmware for a Zynq-7000 board: an AXI DMA engine in the PL
//! moves BiSS encoder frames into DDR, the Cortex-A9 decodes the status word
//! at the head of each frame and prints it on the PS UART as CSV.
//!
//! # Architecture
//!
//! This firmware follows a layered architecture:
//!
//! ```text
//! Application Layer (main.rs, setup, acquisition, report)
//!         ↓
//! Protocol (biss: status word, CSV record)
//!         ↓
//! Platform HAL (platform: collaborator traits)
//!         ↓
//! Hardware Drivers (zynq: AXI DMA, PS UART, L1/L2 cache, global timer, MMU)
//! ```
//!
//! # Features
//!
//! - `hardware` - Build for Zynq-7000 (`armv7a-none-eabi`), defmt over RTT
//! - `simulator` - Host simulation of the encoder + DMA path (tracing)
//! - `std` - Enable standard library (for simulation and testing)
//!
//! # Examples
//!
//! ## Hardware Target
//!
//! ```bash
//! cargo build --release --target armv7a-none-eabi --features hardware
//! ```
//!
//! ## Host Simulation
//!
//! ```bash
//! cargo run -p firmware --example host_simulation --features simulator
//! ```

#![cfg_attr(all(not(test), not(feature = "std")), no_std)]
// Upgrade relevant warns to deny; keep pedantic as warn (too noisy for firmware)
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)]
// unsafe fn body is not implicitly unsafe block
// Logging discipline
#![warn(clippy::print_stdout)] // prefer tracing/defmt over println! in lib code
#![warn(clippy::dbg_macro)] // dbg! should not be left in committed code
// Intentional allows for this codebase:
#![allow(clippy::module_name_repetitions)] // common in Rust crates; not a real issue
#![allow(clippy::missing_errors_doc)] // most errors are self-explanatory
// Pedantic lints too noisy for firmware application code:
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::similar_names)]

pub mod acquisition;
pub mod config;
pub mod error;
pub mod report;
pub mod setup;

#[cfg(any(feature = "hardware", test))]
pub mod zynq;

#[cfg(feature = "simulator")]
pub mod sim;

// Re-export key types
pub use acquisition::{run, AcquisitionCycle};
pub use config::{AcquisitionConfig, OutputFormat};
pub use error::{FatalError, XST_FAILURE};
pub use setup::{bring_up, BRING_UP_STEPS};
