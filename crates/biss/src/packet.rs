//! Status word decode/encode.
//!
//! The packet is interpreted purely positionally from the raw word. No field
//! gates another: a set CRC-fail bit is reported alongside the position, it
//! does not invalidate it. Consumers that want to drop CRC failures filter
//! on [`StatusPacket::crc_failed`] themselves.

/// Mask covering the 29 position bits (bits 0..=28).
pub const POSITION_MASK: u32 = 0x1FFF_FFFF;

/// Bit index of the CRC-fail flag.
pub const CRC_FAIL_BIT: u32 = 29;

/// Bit index of the warning flag.
pub const WARNING_BIT: u32 = 30;

/// Bit index of the error flag.
pub const ERROR_BIT: u32 = 31;

/// Size of one status word in the receive buffer.
pub const WORD_BYTES: usize = 4;

const CRC_FAIL_MASK: u32 = 0x2000_0000;
const WARNING_MASK: u32 = 0x4000_0000;
const ERROR_MASK: u32 = 0x8000_0000;

/// 29-bit encoder position.
///
/// Construction through [`Position::new`] rejects values that do not fit in
/// the position field; [`Position::from_word_bits`] masks instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u32", into = "u32"))]
pub struct Position(u32);

impl Position {
    /// Largest representable position (2^29 - 1).
    pub const MAX: Self = Self(POSITION_MASK);

    /// Zero position.
    pub const ZERO: Self = Self(0);

    /// Create a position, rejecting values wider than 29 bits.
    pub const fn new(value: u32) -> Result<Self, PositionOutOfRange> {
        if value > POSITION_MASK {
            Err(PositionOutOfRange(value))
        } else {
            Ok(Self(value))
        }
    }

    /// Take the low 29 bits of `word`.
    pub const fn from_word_bits(word: u32) -> Self {
        Self(word & POSITION_MASK)
    }

    /// Raw value (always `<= Position::MAX.get()`).
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl From<Position> for u32 {
    fn from(position: Position) -> Self {
        position.0
    }
}

impl TryFrom<u32> for Position {
    type Error = PositionOutOfRange;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl core::fmt::Display for Position {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A value does not fit in the 29-bit position field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PositionOutOfRange(pub u32);

#[cfg(feature = "std")]
impl std::error::Error for PositionOutOfRange {}

impl core::fmt::Display for PositionOutOfRange {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "position {} exceeds 29-bit range (max {})",
            self.0, POSITION_MASK
        )
    }
}

/// Decoded BiSS status word.
///
/// A new packet is produced every acquisition cycle from the head of the
/// receive buffer; it carries no identity and is not retained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatusPacket {
    /// Absolute/incremental position reading (bits 0..=28).
    pub position: Position,
    /// Source-side CRC check failed (bit 29).
    pub crc_failed: bool,
    /// Device-reported warning (bit 30).
    pub warning: bool,
    /// Device-reported error (bit 31).
    pub error: bool,
}

impl StatusPacket {
    /// Decode a raw status word. Every `u32` is a valid packet.
    pub const fn from_word(word: u32) -> Self {
        Self {
            position: Position::from_word_bits(word),
            crc_failed: word & CRC_FAIL_MASK != 0,
            warning: word & WARNING_MASK != 0,
            error: word & ERROR_MASK != 0,
        }
    }

    /// Encode back into the raw word layout.
    pub const fn to_word(self) -> u32 {
        let mut word = self.position.get();
        if self.crc_failed {
            word |= CRC_FAIL_MASK;
        }
        if self.warning {
            word |= WARNING_MASK;
        }
        if self.error {
            word |= ERROR_MASK;
        }
        word
    }

    /// Decode the first word of a DMA receive buffer.
    ///
    /// The AXI stream delivers the word little-endian (Zynq PS byte order).
    /// Only bytes `0..4` are read; returns `None` if the buffer is shorter.
    pub fn from_buffer(buffer: &[u8]) -> Option<Self> {
        let head: [u8; WORD_BYTES] = buffer.get(..WORD_BYTES)?.try_into().ok()?;
        Some(Self::from_word(u32::from_le_bytes(head)))
    }

    /// Error flag as `0` or `1`.
    #[allow(clippy::cast_lossless)] // const fn: u8::from(bool) is not const
    pub const fn error_bit(&self) -> u8 {
        self.error as u8
    }

    /// Warning flag as `0` or `1`.
    #[allow(clippy::cast_lossless)]
    pub const fn warning_bit(&self) -> u8 {
        self.warning as u8
    }

    /// CRC-fail flag as `0` or `1`.
    #[allow(clippy::cast_lossless)]
    pub const fn crc_fail_bit(&self) -> u8 {
        self.crc_failed as u8
    }
}

impl From<u32> for StatusPacket {
    fn from(word: u32) -> Self {
        Self::from_word(word)
    }
}

impl From<StatusPacket> for u32 {
    fn from(packet: StatusPacket) -> Self {
        packet.to_word()
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]
mod tests {
    use super::*;

    #[test]
    fn zero_word_is_all_clear() {
        let p = StatusPacket::from_word(0);
        assert_eq!(p.position, Position::ZERO);
        assert!(!p.crc_failed && !p.warning && !p.error);
    }

    #[test]
    fn all_position_bits_set_status_clear() {
        let p = StatusPacket::from_word(0x1FFF_FFFF);
        assert_eq!(p.position.get(), 536_870_911);
        assert_eq!((p.error_bit(), p.warning_bit(), p.crc_fail_bit()), (0, 0, 0));
    }

    #[test]
    fn all_ones_sets_every_field() {
        let p = StatusPacket::from_word(0xFFFF_FFFF);
        assert_eq!(p.position, Position::MAX);
        assert_eq!((p.error_bit(), p.warning_bit(), p.crc_fail_bit()), (1, 1, 1));
    }

    #[test]
    fn crc_fail_does_not_suppress_position() {
        // bit 29 + position 1234: position must come through untouched
        let p = StatusPacket::from_word(0x2000_0000 | 1234);
        assert!(p.crc_failed);
        assert_eq!(p.position.get(), 1234);
    }

    #[test]
    fn from_buffer_reads_little_endian_head() {
        let mut buf = [0xAAu8; 8];
        buf[..4].copy_from_slice(&0x8000_0005u32.to_le_bytes());
        let p = StatusPacket::from_buffer(&buf).unwrap();
        assert_eq!(p.position.get(), 5);
        assert!(p.error);
        assert!(!p.warning);
        assert!(!p.crc_failed);
    }

    #[test]
    fn from_buffer_rejects_short_buffer() {
        assert_eq!(StatusPacket::from_buffer(&[0x01, 0x02, 0x03]), None);
        assert_eq!(StatusPacket::from_buffer(&[]), None);
    }

    #[test]
    fn position_new_rejects_30_bit_value() {
        assert_eq!(Position::new(0x2000_0000), Err(PositionOutOfRange(0x2000_0000)));
        assert_eq!(Position::new(POSITION_MASK), Ok(Position::MAX));
    }

    #[test]
    fn encode_sets_flag_bits_at_documented_positions() {
        let p = StatusPacket {
            position: Position::ZERO,
            crc_failed: true,
            warning: false,
            error: false,
        };
        assert_eq!(p.to_word(), 1 << 29);
        let p = StatusPacket { warning: true, crc_failed: false, ..p };
        assert_eq!(p.to_word(), 1 << 30);
        let p = StatusPacket { error: true, warning: false, ..p };
        assert_eq!(p.to_word(), 1 << 31);
    }
}
