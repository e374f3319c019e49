//! CRC-6 over the encoder position.
//!
//! Matches the checker in the programmable logic: polynomial x^6 + x + 1
//! (0x43), MSB-first, initial value 0, no reflection, no final XOR. The
//! checker sets bit 29 of the status word when its CRC disagrees with the
//! one transmitted by the encoder.

/// Polynomial without the implicit x^6 term.
pub const CRC6_POLY: u8 = 0x03;

/// Position width covered by the checker.
pub const CRC6_POSITION_BITS: u8 = 24;

const CRC6_MASK: u8 = 0x3F;

/// CRC-6 of the low 24 bits of `position`.
pub fn crc6(position: u32) -> u8 {
    crc6_bits(position, CRC6_POSITION_BITS)
}

/// CRC-6 over the low `bits` bits of `data`, most significant first.
///
/// `bits` is clamped to 32.
pub fn crc6_bits(data: u32, bits: u8) -> u8 {
    let mut crc: u8 = 0;
    for i in (0..u32::from(bits.min(32))).rev() {
        let bit = u8::from(data.checked_shr(i).unwrap_or(0) & 1 == 1);
        let feedback = bit ^ (crc.wrapping_shr(5) & 1);
        crc = crc.wrapping_shl(1) & CRC6_MASK;
        if feedback == 1 {
            crc ^= CRC6_POLY;
        }
    }
    crc
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reference vectors from the HDL checker testbench.
    const VECTORS: &[(u32, u8)] = &[
        (0x00_0000, 0b00_0000),
        (0xFF_FFFF, 0b01_0000),
        (0x12_3456, 0b01_0011),
        (0xAB_CDEF, 0b01_0011),
        (0x65_4321, 0b01_0110),
        (0xFE_DCBA, 0b00_1101),
    ];

    #[test]
    fn matches_hdl_reference_vectors() {
        for &(position, expected) in VECTORS {
            assert_eq!(crc6(position), expected, "position 0x{position:06X}");
        }
    }

    #[test]
    fn ignores_bits_above_24() {
        assert_eq!(crc6(0xFF12_3456), crc6(0x12_3456));
    }

    #[test]
    fn single_lsb_yields_polynomial() {
        assert_eq!(crc6(1), CRC6_POLY);
    }

    #[test]
    fn result_fits_six_bits() {
        for data in [0u32, 1, 0x80_0000, 0xFFFF_FFFF, 0xDEAD_BEEF] {
            assert!(crc6_bits(data, 32) <= CRC6_MASK);
        }
    }

    #[test]
    fn zero_bits_is_zero() {
        assert_eq!(crc6_bits(0xFFFF_FFFF, 0), 0);
    }
}
