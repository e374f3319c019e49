//! Host side of the serial console: decode the CSV stream back into packets.
//!
//! Banner, header and line noise are counted and skipped. The summary keeps
//! flag counts and the position span so a bench run can be judged at a glance.

use anyhow::{Context, Result};
use biss::{parse_record, StatusPacket};
use colored::Colorize;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;
use std::process::Command;

/// PS UART rate used by the firmware.
pub const DEFAULT_BAUD: u32 = 115_200;

/// Running totals over a monitored stream.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct MonitorStats {
    pub records: u64,
    pub skipped: u64,
    pub errors: u64,
    pub warnings: u64,
    pub crc_failures: u64,
    pub min_position: Option<u32>,
    pub max_position: Option<u32>,
    pub last: Option<StatusPacket>,
}

impl MonitorStats {
    fn record(&mut self, packet: &StatusPacket) {
        self.records = self.records.saturating_add(1);
        if packet.error {
            self.errors = self.errors.saturating_add(1);
        }
        if packet.warning {
            self.warnings = self.warnings.saturating_add(1);
        }
        if packet.crc_failed {
            self.crc_failures = self.crc_failures.saturating_add(1);
        }
        let position = packet.position.get();
        self.min_position = Some(self.min_position.map_or(position, |m| m.min(position)));
        self.max_position = Some(self.max_position.map_or(position, |m| m.max(position)));
        self.last = Some(*packet);
    }

    /// Distance between the lowest and highest position seen.
    pub fn span(&self) -> Option<u32> {
        match (self.min_position, self.max_position) {
            (Some(min), Some(max)) => Some(max.saturating_sub(min)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Text,
    Json,
}

pub fn run(input: &Path, baud: u32, json: bool, limit: Option<u64>) -> Result<()> {
    if is_tty(input) {
        configure_tty(input, baud)?;
    }
    let file = File::open(input).with_context(|| format!("Failed to open {}", input.display()))?;
    let format = if json { Format::Json } else { Format::Text };

    if format == Format::Text {
        println!();
        println!(
            "{}",
            format!("📈 Monitoring {} ...", input.display()).cyan().bold()
        );
        println!();
    }

    let stdout = io::stdout();
    let stats = monitor(BufReader::new(file), &mut stdout.lock(), format, limit)?;

    match format {
        Format::Json => println!("{}", serde_json::to_string(&stats)?),
        Format::Text => print_summary(&stats),
    }
    Ok(())
}

/// Decode lines from `reader` until EOF or `limit` records, echoing each
/// record to `out`.
pub fn monitor<R: BufRead, W: Write>(
    mut reader: R,
    out: &mut W,
    format: Format,
    limit: Option<u64>,
) -> Result<MonitorStats> {
    let mut stats = MonitorStats::default();
    let mut raw = Vec::new();

    while limit.map_or(true, |limit| stats.records < limit) {
        raw.clear();
        if reader.read_until(b'\n', &mut raw)? == 0 {
            break;
        }
        // Line noise on the wire is not fatal.
        let line = String::from_utf8_lossy(&raw);
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let packet = match parse_record(line) {
            Ok(packet) => packet,
            Err(_) => {
                stats.skipped = stats.skipped.saturating_add(1);
                continue;
            }
        };
        stats.record(&packet);

        match format {
            Format::Json => writeln!(out, "{}", serde_json::to_string(&packet)?)?,
            Format::Text => writeln!(out, "{}", describe(&packet))?,
        }
    }
    out.flush()?;
    Ok(stats)
}

fn describe(packet: &StatusPacket) -> String {
    let flag = |name: &str, set: bool| {
        if set {
            name.red().bold().to_string()
        } else {
            name.green().to_string()
        }
    };
    format!(
        "  pos {:>9}  {} {} {}",
        packet.position.get(),
        flag("ERR", packet.error),
        flag("WARN", packet.warning),
        flag("CRC", packet.crc_failed),
    )
}

fn print_summary(stats: &MonitorStats) {
    println!();
    println!("{}", "📊 Summary:".cyan());
    println!("   records       {}", stats.records);
    println!("   skipped lines {}", stats.skipped.to_string().dimmed());
    println!("   error bit     {}", stats.errors);
    println!("   warning bit   {}", stats.warnings);
    println!("   CRC failures  {}", stats.crc_failures);
    if let (Some(min), Some(max), Some(span)) =
        (stats.min_position, stats.max_position, stats.span())
    {
        println!("   position      {min} .. {max} (span {span})");
    }
    println!();
}

fn is_tty(path: &Path) -> bool {
    path.starts_with("/dev")
}

/// Put the device in raw mode at `baud` so reads return whole lines.
fn configure_tty(path: &Path, baud: u32) -> Result<()> {
    let status = Command::new("stty")
        .arg("-F")
        .arg(path)
        .arg(baud.to_string())
        .args(["raw", "-echo"])
        .status()
        .context("Failed to run stty")?;
    if !status.success() {
        anyhow::bail!("stty could not configure {}", path.display());
    }
    Ok(())
}
