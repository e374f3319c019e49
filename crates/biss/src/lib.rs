//! BiSS-C status word protocol
//!
//! Pure, hardware-free model of the 32-bit position/status word that the
//! encoder interface in the programmable logic streams into DRAM, plus the
//! CSV record format used on the serial console.
//!
//! # Word layout
//!
//! ```text
//!  31   30   29   28                                0
//! ┌────┬────┬────┬──────────────────────────────────┐
//! │ E  │ W  │ C  │            position              │
//! └────┴────┴────┴──────────────────────────────────┘
//!  E = error bit, W = warning bit, C = CRC-fail bit
//! ```
//!
//! # Modules
//!
//! - [`packet`] - [`StatusPacket`] decode/encode (explicit shift/mask, never
//!   a bit-packed struct)
//! - [`crc`] - CRC-6 (x^6 + x + 1) used by the encoder-side checker
//! - [`record`] - CSV record formatting (firmware) and parsing (host tools)
//!
//! # Features
//!
//! - `defmt`: derive `defmt::Format` on public types
//! - `serde`: derive `Serialize`/`Deserialize` for host tooling
//! - `std`: implement `std::error::Error` on error types

// ── Lint policy ─────────────────────────────────────────────────────────────
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(unused_must_use)]
// ────────────────────────────────────────────────────────────────────────────
#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]

pub mod crc;
pub mod packet;
pub mod record;

pub use crc::{crc6, crc6_bits};
pub use packet::{Position, PositionOutOfRange, StatusPacket};
pub use record::{format_record, parse_record, RecordError, CSV_HEADER, LINE_TERMINATOR};
