use anyhow::Result;
use biss::crc6;
use colored::Colorize;
use std::fmt::Write as _;

/// Reference positions shared with the HDL checker testbench.
pub const REFERENCE_POSITIONS: &[(u32, &str)] = &[
    (0x00_0000, "All zeros"),
    (0xFF_FFFF, "All ones"),
    (0x12_3456, "Test pattern 1"),
    (0xAB_CDEF, "Test pattern 2"),
    (0x65_4321, "Test pattern 3"),
    (0xFE_DCBA, "Test pattern 4"),
];

/// Low `CRC6_POSITION_BITS` bits.
const POSITION_MASK: u32 = 0x00FF_FFFF;

pub struct Vector {
    pub position: u32,
    pub crc: u8,
    pub description: String,
}

pub fn run(extra: &[u32]) -> Result<()> {
    let vectors = vectors(extra);

    println!();
    println!("{}", "CRC-6 (x^6 + x + 1, MSB-first, 24-bit position)".cyan().bold());
    println!("{}", "=".repeat(70));
    for vector in &vectors {
        println!(
            "Position: 0x{:06X} ({:20}) => CRC: 0x{:02X} = {:06b}",
            vector.position, vector.description, vector.crc, vector.crc
        );
    }
    println!();
    println!("{}", "HDL test vector array:".cyan().bold());
    println!("{}", "=".repeat(70));
    print!("{}", vhdl_array(&vectors));
    println!();

    Ok(())
}

/// Reference vectors followed by `extra`, each masked to the checked width.
pub fn vectors(extra: &[u32]) -> Vec<Vector> {
    let reference = REFERENCE_POSITIONS
        .iter()
        .map(|&(position, description)| (position, description.to_string()));
    let extra = extra
        .iter()
        .enumerate()
        .map(|(index, &position)| (position, format!("User vector {}", index.saturating_add(1))));

    reference
        .chain(extra)
        .map(|(position, description)| {
            let position = position & POSITION_MASK;
            Vector {
                position,
                crc: crc6(position),
                description,
            }
        })
        .collect()
}

/// `constant TEST_VECTORS` declaration for the checker testbench.
pub fn vhdl_array(vectors: &[Vector]) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = writeln!(out, "constant TEST_VECTORS : test_vector_array_t := (");
    let last = vectors.len().saturating_sub(1);
    for (index, vector) in vectors.iter().enumerate() {
        let separator = if index == last { "" } else { "," };
        let _ = writeln!(
            out,
            "    (position => X\"{:06X}\", crc => \"{:06b}\"){}  -- {}",
            vector.position, vector.crc, separator, vector.description
        );
    }
    let _ = writeln!(out, ");");
    out
}

/// Clap value parser: hex with or without a `0x` prefix.
pub fn parse_position(text: &str) -> Result<u32, String> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    u32::from_str_radix(digits, 16).map_err(|e| format!("'{text}' is not a hex position: {e}"))
}

#[cfg(test)]
#[allow(clippy::arithmetic_side_effects)]
mod tests {
    use super::*;
    use biss::crc::CRC6_POSITION_BITS;

    #[test]
    fn mask_covers_checked_width() {
        assert_eq!(POSITION_MASK.count_ones(), u32::from(CRC6_POSITION_BITS));
        assert_eq!(POSITION_MASK.trailing_ones(), u32::from(CRC6_POSITION_BITS));
    }

    #[test]
    fn reference_vectors_match_testbench() {
        let crcs: Vec<u8> = vectors(&[]).iter().map(|v| v.crc).collect();
        assert_eq!(
            crcs,
            [0b00_0000, 0b01_0000, 0b01_0011, 0b01_0011, 0b01_0110, 0b00_1101]
        );
    }

    #[test]
    fn extra_positions_are_masked_and_labelled() {
        let all = vectors(&[0xFF12_3456]);
        let extra = all.last().unwrap();
        assert_eq!(extra.position, 0x12_3456);
        assert_eq!(extra.crc, 0b01_0011);
        assert_eq!(extra.description, "User vector 1");
    }

    #[test]
    fn vhdl_array_has_no_trailing_comma() {
        let text = vhdl_array(&vectors(&[]));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), REFERENCE_POSITIONS.len() + 2);
        assert_eq!(
            lines.get(1),
            Some(&"    (position => X\"000000\", crc => \"000000\"),  -- All zeros")
        );
        assert_eq!(
            lines.get(6),
            Some(&"    (position => X\"FEDCBA\", crc => \"001101\")  -- Test pattern 4")
        );
        assert_eq!(lines.last(), Some(&");"));
    }

    #[test]
    fn parses_hex_with_and_without_prefix() {
        assert_eq!(parse_position("0xABCDEF"), Ok(0xAB_CDEF));
        assert_eq!(parse_position("123456"), Ok(0x12_3456));
        assert!(parse_position("zz").is_err());
    }
}
