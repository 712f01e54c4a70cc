//! Result output for the mdu binary
//!
//! Totals go to stdout, one line per input path. The optional summary is
//! styled with console and goes to stderr next to the diagnostics.

use crate::walker::{PathUsage, WalkResult};
use console::style;
use humansize::{format_size, BINARY};
use std::io::{self, Write};

/// Render a usage figure as blocks or as a human readable byte size
pub fn format_usage(usage: &PathUsage, human_readable: bool) -> String {
    if human_readable {
        format_size(usage.bytes(), BINARY)
    } else {
        usage.blocks.to_string()
    }
}

/// Write one `<size>\t<path>` line per usage, in the given order
pub fn write_usages<W: Write>(
    out: &mut W,
    usages: &[PathUsage],
    human_readable: bool,
) -> io::Result<()> {
    for usage in usages {
        writeln!(
            out,
            "{}\t{}",
            format_usage(usage, human_readable),
            usage.path.display()
        )?;
    }
    Ok(())
}

/// Print the per-path totals to stdout
pub fn print_usages(usages: &[PathUsage], human_readable: bool) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_usages(&mut out, usages, human_readable)?;
    out.flush()
}

/// Format a number with thousands separators
fn format_number(n: u64) -> String {
    let s = n.to_string();
    let bytes: Vec<_> = s.bytes().rev().collect();

    let chunks: Vec<String> = bytes
        .chunks(3)
        .map(|chunk| chunk.iter().rev().map(|&b| b as char).collect::<String>())
        .collect();

    chunks.into_iter().rev().collect::<Vec<_>>().join(",")
}

/// Print a summary of the walk to stderr
pub fn print_summary(result: &WalkResult, workers: usize) {
    let stats = &result.stats;
    let total_bytes = result.total_blocks().saturating_mul(crate::BLOCK_SIZE);
    let duration_secs = result.duration.as_secs_f64();
    let rate = if duration_secs > 0.0 {
        stats.entries as f64 / duration_secs
    } else {
        0.0
    };

    eprintln!();
    eprintln!("{}", style("Walk Complete").green().bold());
    eprintln!("{}", style("─".repeat(50)).dim());
    eprintln!("  {} {}", style("Workers:").bold(), workers);
    eprintln!("  {} {}", style("Entries:").bold(), format_number(stats.entries));
    eprintln!("  {} {}", style("Directories:").bold(), format_number(stats.dirs));
    eprintln!(
        "  {} {} ({})",
        style("Total Size:").bold(),
        format_number(result.total_blocks()),
        format_size(total_bytes, BINARY)
    );
    if stats.duplicates > 0 {
        eprintln!(
            "  {} {}",
            style("Hard links skipped:").bold(),
            format_number(stats.duplicates)
        );
    }
    eprintln!(
        "  {} {:.2}s ({:.0} entries/sec)",
        style("Duration:").bold(),
        duration_secs,
        rate
    );
    if stats.errors > 0 {
        eprintln!(
            "  {} {}",
            style("Errors:").yellow().bold(),
            format_number(stats.errors)
        );
    }
    eprintln!();
}
