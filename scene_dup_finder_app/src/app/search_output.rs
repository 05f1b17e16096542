use std::io::{BufWriter, Write};

use scene_dup_finder_lib::{MatchGroup, PurgeReport};

use super::app_cfg::OutputFormat;

/// Print clusters one file per line, blank line between clusters. The
/// leading timestamp is ready to paste into a player's `--ss` option to
/// jump to the matched material.
#[allow(clippy::print_stdout)]
pub fn print_clusters(clusters: &[MatchGroup], format: OutputFormat) -> eyre::Result<()> {
    match format {
        OutputFormat::Normal => {
            for group in clusters {
                for entry in group.entries() {
                    println!(
                        "{}\t{}",
                        format_timestamp(entry.offset_secs),
                        entry.file.path.display()
                    );
                }
                println!();
            }
        }
        OutputFormat::Json => {
            let mut stdout = BufWriter::new(std::io::stdout());
            serde_json::to_writer_pretty(&mut stdout, clusters)?;
            stdout.write_all(b"\n")?;
        }
    }
    Ok(())
}

#[allow(clippy::print_stdout)]
pub fn print_purge_report(report: &PurgeReport, deleted: bool) {
    let verb = if deleted { "removed" } else { "would remove" };
    for file in &report.missing_files {
        println!("{verb} missing file: {}", file.path.display());
    }
    println!(
        "{verb} {} missing files, {} orphan rows, {} stale whitelist pairs",
        report.missing_files.len(),
        report.orphan_rows,
        report.stale_whitelist_pairs
    );
}

/// Seconds to `H:MM:SS`, the form accepted by player seek options.
fn format_timestamp(offset_secs: f64) -> String {
    let total = offset_secs.max(0.0).round() as u64;
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    format!("{hours}:{minutes:02}:{seconds:02}")
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn timestamps_are_h_mm_ss() {
        assert_eq!(format_timestamp(0.0), "0:00:00");
        assert_eq!(format_timestamp(61.0), "0:01:01");
        assert_eq!(format_timestamp(3661.4), "1:01:01");
        assert_eq!(format_timestamp(7325.0), "2:02:05");
    }

    #[test]
    fn negative_offsets_clamp_to_zero() {
        assert_eq!(format_timestamp(-5.0), "0:00:00");
    }
}
