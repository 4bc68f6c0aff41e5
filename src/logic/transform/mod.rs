//! Transform Module - Graph Preprocessing
//!
//! Record-level rewrites applied to a whole log before analysis.
//!
//! ## Structure
//! - `drop_keys`: remove annotations, optionally re-deriving ids from content
//! - `merge`: collapse vertices that agree on a set of keys
//!
//! ## Usage
//! ```ignore
//! use crate::logic::transform::{drop_keys, read_records, write_records_file, DropKeysConfig};
//!
//! let parsed = read_records(input)?;
//! let config = DropKeysConfig::new(&["jiffies".into()], &["epoch".into()], false)?;
//! let (records, report) = drop_keys(parsed.records, &config);
//! write_records_file(output, &records)?;
//! ```

pub mod drop_keys;
pub mod merge;


use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::{ProvError, ProvResult};
use crate::logic::graph::{parse_reader, ParsedLog, Record};

pub use drop_keys::{drop_keys, edge_content_id, vertex_content_id, DropKeysConfig, DropKeysReport};
pub use merge::{merge_hash, merge_vertices, MergeReport};

/// Trimmed, non-empty key set; a blank entry is a configuration error
pub(crate) fn validate_keys(name: &str, keys: &[String]) -> ProvResult<BTreeSet<String>> {
    if keys.is_empty() {
        return Err(ProvError::Config(format!("{} key list is empty", name)));
    }

    let mut out = BTreeSet::new();
    for key in keys {
        let key = key.trim();
        if key.is_empty() {
            return Err(ProvError::Config(format!("empty key in {} key list", name)));
        }
        out.insert(key.to_string());
    }
    Ok(out)
}

/// Parse a log file; malformed lines are returned in `rejected`
pub fn read_records(path: &Path) -> ProvResult<ParsedLog> {
    let file = File::open(path)?;
    parse_reader(BufReader::new(file))
}

/// Write records as NDJSON, returning the number of lines
pub fn write_records<W: Write>(writer: &mut W, records: &[Record]) -> ProvResult<usize> {
    for record in records {
        serde_json::to_writer(&mut *writer, &record.to_json())?;
        writer.write_all(b"\n")?;
    }
    Ok(records.len())
}

pub fn write_records_file(path: &Path, records: &[Record]) -> ProvResult<usize> {
    let mut writer = BufWriter::new(File::create(path)?);
    let count = write_records(&mut writer, records)?;
    writer.flush()?;
    Ok(count)
}
