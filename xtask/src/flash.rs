use anyhow::{Context, Result};
use colored::Colorize;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

use crate::check::HARDWARE_TARGET;

/// Generated xsdb script, relative to the workspace root.
const SCRIPT_PATH: &str = "target/xsdb-load.tcl";

pub fn run(release: bool, ps7_init: Option<&Path>, dry_run: bool) -> Result<()> {
    let mode = if release { "release" } else { "debug" };

    println!();
    println!(
        "{}",
        format!("🔨 Building firmware ({mode} mode)...").cyan().bold()
    );
    println!();

    let build_start = Instant::now();
    let mut build_cmd = Command::new("cargo");
    build_cmd.args([
        "build",
        "-p",
        "firmware",
        "--target",
        HARDWARE_TARGET,
        "--features",
        "hardware",
    ]);

    if release {
        build_cmd.arg("--release");
    }

    let build_output = build_cmd.output().context("Failed to run cargo build")?;

    if !build_output.status.success() {
        eprintln!("{}", "✗ Build failed".red().bold());
        eprintln!();
        eprintln!("{}", String::from_utf8_lossy(&build_output.stderr));
        anyhow::bail!("Build failed");
    }

    println!(
        "{}",
        format!(
            "✓ Build successful in {:.2}s",
            build_start.elapsed().as_secs_f64()
        )
        .green()
    );
    println!();

    let elf = elf_path(release);
    show_binary_size(&elf);
    println!();

    if let Some(init) = ps7_init {
        if !init.is_file() {
            anyhow::bail!("ps7_init script not found: {}", init.display());
        }
    }

    let script = xsdb_script(&elf, ps7_init);
    std::fs::write(SCRIPT_PATH, &script)
        .with_context(|| format!("Failed to write {SCRIPT_PATH}"))?;

    if dry_run {
        println!("{}", format!("📝 {SCRIPT_PATH}:").cyan().bold());
        for line in script.lines() {
            println!("   {}", line.dimmed());
        }
        println!();
        return Ok(());
    }

    println!("{}", "📡 Loading over JTAG...".cyan().bold());
    println!("   {}", "Connecting to hw_server...".dimmed());

    let load_start = Instant::now();
    let load_output = Command::new("xsdb")
        .arg(SCRIPT_PATH)
        .output()
        .context("Failed to run xsdb. Is Vitis (or the standalone XSDB) on PATH?")?;

    if !load_output.status.success() {
        eprintln!("{}", "✗ Load failed".red().bold());
        eprintln!();
        eprintln!("{}", String::from_utf8_lossy(&load_output.stdout));
        eprintln!("{}", String::from_utf8_lossy(&load_output.stderr));
        anyhow::bail!("Load failed - check the JTAG cable and that the board is powered");
    }

    println!(
        "{}",
        format!(
            "✓ Load successful in {:.2}s",
            load_start.elapsed().as_secs_f64()
        )
        .green()
    );
    println!();
    println!("{}", "📈 Acquisition is running on hardware!".bold());
    println!(
        "   {}",
        "Use 'cargo xtask monitor /dev/ttyUSB1' to decode the CSV stream".dimmed()
    );
    println!();

    Ok(())
}

fn elf_path(release: bool) -> PathBuf {
    let profile = if release { "release" } else { "debug" };
    ["target", HARDWARE_TARGET, profile, "firmware"].iter().collect()
}

/// Tcl paths use forward slashes and braces so spaces survive.
fn tcl_path(path: &Path) -> String {
    format!("{{{}}}", path.display().to_string().replace('\\', "/"))
}

/// xsdb commands that reset the PS, optionally run ps7_init, then download
/// the ELF to CPU0 and resume it at `_vectors`.
pub fn xsdb_script(elf: &Path, ps7_init: Option<&Path>) -> String {
    let mut script = String::new();
    // Writing to a String cannot fail.
    let _ = writeln!(script, "connect");
    let _ = writeln!(script, "targets -set -nocase -filter {{name =~ \"APU*\"}}");
    let _ = writeln!(script, "rst -system");
    let _ = writeln!(script, "after 1000");
    if let Some(init) = ps7_init {
        let _ = writeln!(script, "source {}", tcl_path(init));
        let _ = writeln!(script, "ps7_init");
        let _ = writeln!(script, "ps7_post_config");
    }
    let _ = writeln!(script, "targets -set -nocase -filter {{name =~ \"*A9*#0\"}}");
    let _ = writeln!(script, "dow {}", tcl_path(elf));
    let _ = writeln!(script, "con");
    let _ = writeln!(script, "disconnect");
    script
}

fn show_binary_size(elf: &Path) {
    let output = Command::new("rust-size").arg(elf).arg("-A").output();

    match output {
        Ok(out) if out.status.success() => {
            println!("{}", "📊 Binary size:".cyan());
            let size_output = String::from_utf8_lossy(&out.stdout);
            for line in size_output.lines() {
                println!("   {}", line.dimmed());
            }
        }
        _ => {
            println!(
                "   {}",
                "(install cargo-binutils for section sizes)".dimmed()
            );
        }
    }
}
