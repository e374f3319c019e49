//! Linker layout verification tests.
// Layout test file: expect/unwrap/indexing are intentional test mechanisms.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects,
)]
//!
//! These tests verify that the linker script (link.x) keeps the DMA receive
//! buffer where the firmware expects it. A misplaced region would let the
//! image or stack share cache lines with the buffer, and the invalidate after
//! each transfer would silently discard CPU writes.
//!
//! The ELF checks need the hardware binary to be pre-built and skip otherwise:
//! ```
//! cargo build -p firmware --release --target armv7a-none-eabi --features hardware
//! cargo test -p firmware --test linker_layout
//! ```

use std::path::PathBuf;

use platform::dma_safety::{CACHE_LINE_BYTES, DDR_BASE, RX_BUFFER_BASE};

const LINK_X: &str = include_str!("../link.x");

/// `ORIGIN = 0x...` of the named MEMORY region.
fn region_origin(name: &str) -> usize {
    let line = LINK_X
        .lines()
        .find(|l| l.trim_start().starts_with(name) && l.contains("ORIGIN"))
        .unwrap_or_else(|| panic!("link.x has no {name} region"));
    let origin = line
        .split("ORIGIN =")
        .nth(1)
        .and_then(|rest| rest.split(',').next())
        .map(str::trim)
        .unwrap();
    usize::from_str_radix(origin.trim_start_matches("0x"), 16).unwrap()
}

#[test]
fn image_starts_at_hp_reachable_ddr() {
    assert_eq!(region_origin("DDR"), DDR_BASE);
}

#[test]
fn receive_region_is_the_pinned_buffer() {
    let origin = region_origin("DMA_RX");
    assert_eq!(origin, RX_BUFFER_BASE);
    assert_eq!(origin % CACHE_LINE_BYTES, 0);
}

#[test]
fn receive_region_is_never_loaded() {
    let section = LINK_X
        .lines()
        .find(|l| l.contains(".dma_rx"))
        .expect("link.x must define .dma_rx");
    assert!(section.contains("NOLOAD"), "{section}");
    assert!(LINK_X.contains("> DMA_RX"));
}

#[test]
fn vectors_come_first() {
    let vectors = LINK_X.find(".vectors ORIGIN(DDR)").expect(".vectors at DDR origin");
    let text = LINK_X.find(".text :").unwrap();
    assert!(vectors < text);
    assert!(LINK_X.contains("ENTRY(_vectors)"));
}

/// Path to the built ARM ELF binary.
fn firmware_elf_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("FIRMWARE_ELF_PATH") {
        let p = PathBuf::from(path);
        if p.exists() {
            return Some(p);
        }
    }
    let workspace_root = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .and_then(|p| p.parent())
        .map(|p| p.to_path_buf())?;
    let elf = workspace_root
        .join("target")
        .join("armv7a-none-eabi")
        .join("release")
        .join("firmware");
    elf.exists().then_some(elf)
}

#[test]
fn elf_places_dma_rx_at_buffer_base() {
    let Some(elf_path) = firmware_elf_path() else {
        eprintln!(
            "SKIP: ARM ELF not found; run \
             `cargo build -p firmware --release --target armv7a-none-eabi --features hardware` first"
        );
        return;
    };

    let output = std::process::Command::new("arm-none-eabi-readelf")
        .args(["-S", "--wide", elf_path.to_str().unwrap()])
        .output();

    match output {
        Ok(out) if out.status.success() => {
            let text = String::from_utf8_lossy(&out.stdout);
            let line = text
                .lines()
                .find(|l| l.contains(".dma_rx"))
                .expect(".dma_rx section in ELF");
            assert!(line.contains("01100000"), ".dma_rx must start at 0x01100000, got: {line}");
        }
        Ok(out) => {
            eprintln!(
                "arm-none-eabi-readelf failed: {}",
                String::from_utf8_lossy(&out.stderr)
            );
        }
        Err(e) => {
            eprintln!("SKIP: arm-none-eabi-readelf not found: {e}");
        }
    }
}
