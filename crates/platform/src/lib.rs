//! Hardware Abstraction Layer (HAL) for the BiSS DMA acquisition firmware
//!
//! This crate provides trait-based abstractions for every collaborator the
//! acquisition loop touches, enabling development and testing without a
//! Zynq board attached.
//!
//! # Architecture Layers
//!
//! ```text
//! Application Layer (firmware crate: bring-up, acquisition cycle, reporter)
//!         ↓
//! Protocol Layer (biss crate: status word, CRC-6, CSV records)
//!         ↓
//! Platform HAL (this crate - trait abstractions)
//!         ↓
//! Hardware Layer (firmware::zynq register drivers)
//! ```
//!
//! # Abstractions
//!
//! - [`TransferEngine`] - AXI DMA style engine, simple (non-descriptor) mode
//! - [`CacheMaintenance`] - data cache flush/invalidate by address range
//! - [`SerialConsole`] - blocking serial transport (`embedded_io::Write`)
//! - [`StartupGate`] - pause for external tooling before bring-up continues
//! - [`dma`] - buffer handles and the ownership-transferring transfer type
//! - [`dma_safety`] - memory map and cache-line constants
//!
//! Timing uses [`embedded_hal::delay::DelayNs`] directly.
//!
//! # Features
//!
//! - `std`: Enable standard library support and [`mocks`] (for testing)
//! - `defmt`: Enable defmt logging derives
//!
//! # Example
//!
//! ```no_run
//! use platform::{Direction, TransferEngine};
//! use platform::dma::RxBuffer;
//!
//! fn start<E: TransferEngine>(engine: &mut E, buffer: &mut RxBuffer<'_>) -> bool {
//!     engine.start_simple_transfer(buffer, Direction::DeviceToMemory).is_ok()
//! }
//! ```

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)] // no .unwrap() in production code
#![deny(clippy::expect_used)] // no .expect() in production code
#![deny(clippy::panic)] // no panic!() in production code
#![deny(clippy::unreachable)] // no unreachable!() that isn't documented
#![deny(unused_must_use)]
// all Results must be handled
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(unsafe_op_in_unsafe_fn)] // unsafe fn body is not implicitly unsafe block
#![warn(clippy::print_stdout)] // prefer defmt/tracing over println! in lib code
// Pedantic lints suppressed for this hardware HAL crate:
#![allow(clippy::doc_markdown)] // hex addresses and register names in doc comments
#![allow(clippy::must_use_candidate)] // hardware accessors, callers decide
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod cache;
pub mod config;
pub mod dma;
pub mod dma_safety;
pub mod gate;
pub mod serial;

#[cfg(any(test, feature = "std"))]
pub mod mocks;

// Re-export main collaborator traits
pub use cache::CacheMaintenance;
pub use dma::{Direction, DmaBuffer, DmaBufferMut, PollLimit, TransferEngine};
pub use gate::{DebuggerGate, OpenGate, StartupGate};
pub use serial::SerialConsole;

// Re-export serial line types
pub use serial::{DataBits, Parity, StopBits, UartConfig};

// Re-export DMA types
pub use dma::{DmaTransfer, DmaTransferActive, RxBuffer, TransferStalled};
