//! CSV export for derived snapshots.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::sim::types::Snapshot;

/// Column header for snapshot CSV export.
const HEADER: &str = "window_end,days,indoor_temp_f,electricity_wh,electricity_usd,\
                       water_gal,water_usd,total_usd";

/// Exports snapshots to a CSV file at the given path.
///
/// # Arguments
///
/// * `snapshots` - Snapshots in the order they were produced
/// * `path` - Output file path
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_snapshots(snapshots: &[Snapshot], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    write_snapshots(snapshots, io::BufWriter::new(file))
}

/// Writes snapshots as CSV to any writer, one row per snapshot.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_snapshots(snapshots: &[Snapshot], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(HEADER.split(',').map(str::trim))?;

    for s in snapshots {
        wtr.write_record(&[
            s.window_end.to_string(),
            format!("{:.4}", s.days),
            format!("{:.2}", s.indoor_temp_f),
            format!("{:.2}", s.electricity_wh),
            format!("{:.4}", s.electricity_usd),
            format!("{:.3}", s.water_gal),
            format!("{:.4}", s.water_usd),
            format!("{:.4}", s.total_usd),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
