//! Dataset Module - Feature and Label Export
//!
//! Writes per-snapshot rows produced by the batch driver. CSV output matches
//! the historical features.csv layout; JSONL keeps full structure.

pub mod export;
pub mod render;


pub use export::{export_rows, stamped_path, write_rows, DatasetRow, ExportFormat};
pub use render::{csv_field, render_set, render_vector};
