use anyhow::Result;
use colored::Colorize;
use std::time::Instant;

use crate::step::Step;

pub fn run(unit_only: bool, integration_only: bool) -> Result<()> {
    println!();
    println!("{}", "🧪 Running tests...".cyan().bold());
    println!();

    let total_start = Instant::now();

    let run_unit = !integration_only;
    let run_integration = !unit_only;

    if run_unit {
        Step::cargo("Unit tests", &["test", "--lib", "--workspace"])
            .summarized()
            .run()?;

        // sim.rs is only compiled with the simulator feature.
        Step::cargo(
            "Simulator unit tests",
            &["test", "-p", "firmware", "--features", "simulator", "--lib"],
        )
        .summarized()
        .run()?;
    }

    if run_integration {
        // Every file under each crate's tests/ directory.
        Step::cargo("Integration tests", &["test", "--workspace", "--test", "*"])
            .summarized()
            .run()?;
    }

    Step::cargo("Doc tests", &["test", "--doc", "--workspace"])
        .summarized()
        .optional()
        .run()?;

    println!(
        "{}",
        format!(
            "✓ All tests completed in {:.2}s",
            total_start.elapsed().as_secs_f64()
        )
        .green()
        .bold()
    );
    println!();

    Ok(())
}
