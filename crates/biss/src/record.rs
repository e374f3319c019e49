//! CSV record format for the serial console.
//!
//! The firmware prints [`CSV_HEADER`] once after bring-up, then one record
//! per acquisition cycle:
//!
//! ```text
//! position, error_bit, warning_bit, crc_failed_bit\r\n
//! 5, 1, 0, 0\r\n
//! ```
//!
//! Field order is position, error, warning, CRC-fail; note that it differs
//! from the bit order in the status word.

use core::fmt::Write;

use crate::packet::{Position, StatusPacket};

/// Header line (without terminator).
pub const CSV_HEADER: &str = "position, error_bit, warning_bit, crc_failed_bit";

/// Line terminator expected by serial terminals and the host logger.
pub const LINE_TERMINATOR: &str = "\r\n";

/// Longest record: `"536870911, 1, 1, 1\r\n"` is 20 bytes.
pub const RECORD_CAPACITY: usize = 32;

/// Number of mandatory fields in a record.
pub const FIELD_COUNT: usize = 4;

/// Formatted record, ready to be written to the console.
pub type Record = heapless::String<RECORD_CAPACITY>;

/// Format one packet as a CSV record including the line terminator.
pub fn format_record(packet: &StatusPacket) -> Record {
    let mut line = Record::new();
    // RECORD_CAPACITY covers the widest possible record, so this cannot fail.
    let _ = write!(
        line,
        "{}, {}, {}, {}{}",
        packet.position,
        packet.error_bit(),
        packet.warning_bit(),
        packet.crc_fail_bit(),
        LINE_TERMINATOR
    );
    line
}

/// Reasons a console line is not a valid record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RecordError {
    /// Fewer than four comma-separated fields.
    MissingField {
        /// Number of fields found.
        found: usize,
    },
    /// A field is not an unsigned decimal integer.
    InvalidNumber {
        /// Zero-based field index.
        field: usize,
    },
    /// A flag field is neither `0` nor `1`.
    FlagOutOfRange {
        /// Zero-based field index.
        field: usize,
    },
    /// Position does not fit in 29 bits.
    PositionOutOfRange,
}

#[cfg(feature = "std")]
impl std::error::Error for RecordError {}

impl core::fmt::Display for RecordError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::MissingField { found } => {
                write!(f, "expected {FIELD_COUNT} fields, found {found}")
            }
            Self::InvalidNumber { field } => write!(f, "field {field} is not a number"),
            Self::FlagOutOfRange { field } => write!(f, "field {field} must be 0 or 1"),
            Self::PositionOutOfRange => write!(f, "position exceeds 29 bits"),
        }
    }
}

/// Parse a console line back into a packet.
///
/// Surrounding whitespace and the line terminator are ignored, as are any
/// fields after the fourth. The header and banner lines fail with
/// [`RecordError::InvalidNumber`] or [`RecordError::MissingField`]; callers
/// reading a live stream simply skip them.
pub fn parse_record(line: &str) -> Result<StatusPacket, RecordError> {
    let mut fields = line.trim().split(',').map(str::trim);
    let mut values = [0u32; FIELD_COUNT];

    for (index, slot) in values.iter_mut().enumerate() {
        let field = match fields.next() {
            Some(field) if !field.is_empty() || index > 0 => field,
            _ => return Err(RecordError::MissingField { found: index }),
        };
        *slot = field
            .parse::<u32>()
            .map_err(|_| RecordError::InvalidNumber { field: index })?;
    }

    let [position, error, warning, crc] = values;
    let position = Position::new(position).map_err(|_| RecordError::PositionOutOfRange)?;

    Ok(StatusPacket {
        position,
        error: parse_flag(error, 1)?,
        warning: parse_flag(warning, 2)?,
        crc_failed: parse_flag(crc, 3)?,
    })
}

fn parse_flag(value: u32, field: usize) -> Result<bool, RecordError> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        _ => Err(RecordError::FlagOutOfRange { field }),
    }
}
