use anyhow::Result;
use colored::Colorize;
use std::time::Instant;

use crate::step::Step;

/// Cortex-A9 bare-metal target used by the firmware binary.
pub const HARDWARE_TARGET: &str = "armv7a-none-eabi";

pub fn run() -> Result<()> {
    println!();
    println!("{}", "🔍 Checking firmware builds...".cyan().bold());
    println!();

    let total_start = Instant::now();

    Step::cargo(
        "Hardware target (Zynq-7000)",
        &[
            "check",
            "-p",
            "firmware",
            "--target",
            HARDWARE_TARGET,
            "--features",
            "hardware",
        ],
    )
    .run()?;

    Step::cargo(
        "Host simulator",
        &["check", "-p", "firmware", "--features", "simulator", "--examples"],
    )
    .run()?;

    // Library crates must stay no_std with every feature that firmware turns on.
    Step::cargo(
        "platform and biss (no_std)",
        &[
            "check",
            "-p",
            "platform",
            "-p",
            "biss",
            "--target",
            HARDWARE_TARGET,
            "--features",
            "defmt",
        ],
    )
    .run()?;

    Step::cargo(
        "Clippy",
        &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
    )
    .optional()
    .run()?;

    if !Step::cargo("Formatting", &["fmt", "--all", "--check"])
        .optional()
        .run()?
    {
        eprintln!("     Run 'cargo fmt --all' to fix");
    }

    println!(
        "{}",
        format!(
            "✓ All checks completed in {:.2}s",
            total_start.elapsed().as_secs_f64()
        )
        .green()
        .bold()
    );
    println!();

    Ok(())
}
