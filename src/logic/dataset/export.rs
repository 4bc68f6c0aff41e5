//! Dataset Export
//!
//! Writes feature and privileged-flow rows as CSV or JSONL.

use chrono::Utc;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::render::{csv_field, render_set, render_vector};
use crate::constants::{FEATURE_HEADER, PRIVILEGED_HEADER};
use crate::error::ProvResult;
use crate::logic::features::FeatureRecord;
use crate::logic::threat::PrivilegedFlowRecord;

// ============================================================================
// EXPORT FORMATS
// ============================================================================

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ExportFormat {
    /// features.csv compatible
    #[default]
    Csv,
    /// One JSON object per line
    Jsonl,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Jsonl => "jsonl",
        }
    }
}

// ============================================================================
// ROWS
// ============================================================================

/// A record that can be written as one dataset row
pub trait DatasetRow: Serialize {
    fn header() -> &'static [&'static str];

    /// Unquoted cell values in header order
    fn cells(&self) -> Vec<String>;
}

impl DatasetRow for FeatureRecord {
    fn header() -> &'static [&'static str] {
        &FEATURE_HEADER
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.object_type.clone(),
            render_set(&self.entity_path),
            render_set(&self.reader_path),
            render_set(&self.writer_path),
            render_vector(&self.namespaces),
            render_set(&self.reader_relation_types),
            render_set(&self.writer_relation_types),
            render_set(&self.writer_argvs),
            render_set(&self.reader_argvs),
        ]
    }
}

impl DatasetRow for PrivilegedFlowRecord {
    fn header() -> &'static [&'static str] {
        &PRIVILEGED_HEADER
    }

    fn cells(&self) -> Vec<String> {
        vec![self.identifier.clone(), self.privileged_flow.to_string()]
    }
}

// ============================================================================
// EXPORT FUNCTIONS
// ============================================================================

/// Write rows to any writer, returning the number of rows
pub fn write_rows<T: DatasetRow, W: Write>(writer: &mut W, rows: &[T], format: ExportFormat) -> ProvResult<usize> {
    match format {
        ExportFormat::Csv => {
            writeln!(writer, "{}", T::header().join(","))?;
            for row in rows {
                let cells: Vec<String> = row.cells().iter().map(|c| csv_field(c)).collect();
                writeln!(writer, "{}", cells.join(","))?;
            }
        }
        ExportFormat::Jsonl => {
            for row in rows {
                writeln!(writer, "{}", serde_json::to_string(row)?)?;
            }
        }
    }

    Ok(rows.len())
}

/// Export rows to a file (truncates)
pub fn export_rows<T: DatasetRow>(destination: &Path, rows: &[T], format: ExportFormat) -> ProvResult<usize> {
    let mut writer = BufWriter::new(File::create(destination)?);
    let count = write_rows(&mut writer, rows, format)?;
    writer.flush()?;
    Ok(count)
}

/// `features.csv` -> `features_<UTC timestamp>.<ext>`, next to the original
pub fn stamped_path(destination: &Path, format: ExportFormat) -> PathBuf {
    let stem = destination
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "dataset".to_string());
    let stamp = Utc::now().format("%Y%m%d_%H%M%S");
    destination.with_file_name(format!("{}_{}.{}", stem, stamp, format.extension()))
}
