use anyhow::{Context, Result};
use colored::Colorize;
use std::process::Command;
use std::time::Instant;

/// One external command in a check or test sequence.
pub struct Step<'a> {
    label: &'a str,
    program: &'a str,
    args: &'a [&'a str],
    required: bool,
    summarize: bool,
}

impl<'a> Step<'a> {
    pub fn cargo(label: &'a str, args: &'a [&'a str]) -> Self {
        Self {
            label,
            program: "cargo",
            args,
            required: true,
            summarize: false,
        }
    }

    /// Report failure as a warning instead of aborting the sequence.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Append the aggregated `test result:` counts to the pass line.
    pub fn summarized(mut self) -> Self {
        self.summarize = true;
        self
    }

    /// Returns `Ok(false)` when an optional step fails.
    pub fn run(&self) -> Result<bool> {
        println!("{}", format!("  {}...", self.label).cyan());
        let start = Instant::now();

        let output = Command::new(self.program)
            .args(self.args)
            .output()
            .with_context(|| format!("Failed to run {} ({})", self.label, self.program))?;

        let stdout = String::from_utf8_lossy(&output.stdout);

        if output.status.success() {
            let summary = if self.summarize {
                format!(" {}", extract_test_summary(&stdout))
            } else {
                String::new()
            };
            println!(
                "{}",
                format!(
                    "  ✓ {} passed{} in {:.2}s",
                    self.label,
                    summary,
                    start.elapsed().as_secs_f64()
                )
                .green()
            );
            println!();
            return Ok(true);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        if self.required {
            eprintln!("{}", format!("  ✗ {} failed", self.label).red().bold());
            eprintln!();
            if self.summarize {
                for line in stdout.lines() {
                    eprintln!("  {line}");
                }
            }
            eprintln!("{stderr}");
            anyhow::bail!("{} failed", self.label);
        }

        eprintln!("{}", format!("  ⚠ {} reported problems", self.label).yellow().bold());
        eprintln!();
        eprintln!("{stderr}");
        println!();
        Ok(false)
    }
}

/// Sum the `N passed; M failed` counts over every test binary in the output.
pub fn extract_test_summary(output: &str) -> String {
    let mut passed: u64 = 0;
    let mut failed: u64 = 0;
    let mut binaries: u64 = 0;

    // "test result: ok. 5 passed; 0 failed; 0 ignored; 0 measured; 0 filtered out"
    for line in output.lines() {
        let Some(result) = line.split("test result:").nth(1) else {
            continue;
        };
        binaries = binaries.saturating_add(1);
        for part in result.split(';') {
            let mut words = part.split_whitespace().rev();
            let (Some(kind), Some(count)) = (words.next(), words.next()) else {
                continue;
            };
            let Ok(count) = count.parse::<u64>() else {
                continue;
            };
            match kind {
                "passed" => passed = passed.saturating_add(count),
                "failed" => failed = failed.saturating_add(count),
                _ => {}
            }
        }
    }

    if binaries == 0 {
        return "(summary not available)".to_string();
    }
    format!("({passed} passed, {failed} failed across {binaries} binaries)")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_aggregates_all_binaries() {
        let output = "\
running 3 tests
test result: ok. 3 passed; 0 failed; 0 ignored; 0 measured; 0 filtered out; finished in 0.01s

running 7 tests
test result: ok. 7 passed; 0 failed; 1 ignored; 0 measured; 0 filtered out; finished in 0.20s
";
        assert_eq!(
            extract_test_summary(output),
            "(10 passed, 0 failed across 2 binaries)"
        );
    }

    #[test]
    fn summary_counts_failures() {
        let output = "test result: FAILED. 4 passed; 2 failed; 0 ignored; 0 measured; 0 filtered out";
        assert_eq!(
            extract_test_summary(output),
            "(4 passed, 2 failed across 1 binaries)"
        );
    }

    #[test]
    fn summary_without_results() {
        assert_eq!(
            extract_test_summary("error: could not compile `firmware`"),
            "(summary not available)"
        );
    }
}
