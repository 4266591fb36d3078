//! Snapshot export artifacts.
//!
//! A completed run leaves two alert artifacts under `output/<run-id>/`:
//! a JSON document with the full records and a flat CSV for spreadsheet
//! consumption. Both are written to a `.tmp` sibling first and renamed
//! into place, so a crash mid-export leaves only transient files the
//! cleanup sweep removes.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use larmvakt_core::run_context::RunContext;
use larmvakt_store::Snapshot;
use tracing::info;

/// Locations of the artifacts produced for one snapshot.
#[derive(Debug, Clone)]
pub struct ExportPaths {
    pub json: PathBuf,
    pub csv: PathBuf,
}

/// Writes the snapshot's JSON and CSV artifacts and logs the snapshot's
/// integrity hash alongside them.
pub fn export_snapshot(snapshot: &Snapshot, ctx: &RunContext) -> io::Result<ExportPaths> {
    let paths = ExportPaths {
        json: ctx.output_dir.join(format!("alerts_{}.json", ctx.run_id)),
        csv: ctx.output_dir.join(format!("alerts_{}.csv", ctx.run_id)),
    };

    let json = serde_json::to_vec_pretty(snapshot).map_err(io::Error::other)?;
    write_atomic(&paths.json, &json)?;
    write_atomic(&paths.csv, render_csv(snapshot).as_bytes())?;

    info!(
        run_id = %ctx.run_id,
        records = snapshot.len(),
        integrity = %snapshot.integrity_hash(),
        json = %paths.json.display(),
        csv = %paths.csv.display(),
        "Snapshot exported"
    );
    Ok(paths)
}

fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    let tmp = path.with_file_name(name);
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)
}

fn render_csv(snapshot: &Snapshot) -> String {
    let mut out = String::from("seq,timestamp,source_kind,detector_id,severity,payload\n");
    for record in &snapshot.records {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            record.seq,
            record.timestamp.to_rfc3339(),
            record.source_kind.as_str(),
            csv_field(&record.detector_id),
            record.severity.as_str(),
            csv_field(&record.payload.to_string()),
        ));
    }
    out
}

/// Quotes a field if it contains a delimiter, quote, or newline.
fn csv_field(raw: &str) -> String {
    if raw.contains([',', '"', '\n']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_owned()
    }
}
