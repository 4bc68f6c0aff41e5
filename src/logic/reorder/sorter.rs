//! Log Sorter
//!
//! Vertices are written through in arrival order; edges are parked in a
//! min-heap keyed by `(relation_id, arrival)` and flushed once the input is
//! exhausted. Every pending edge stays in memory until the end of the log.
//!
//! Lines are read as bytes so a line that is not UTF-8 is rejected like any
//! other malformed record. Output reuses the input's line terminator and
//! ends with one only when the input did.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use serde::Serialize;
use serde_json::Value;

use crate::constants::KEY_RELATION_ID;
use crate::error::{ProvError, ProvResult};
use crate::logic::graph::{is_vertex_tag, log_lines, normalize_line, RejectedLine};

// ============================================================================
// TYPES
// ============================================================================

/// Outcome of one reorder run
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReorderReport {
    pub vertices: usize,
    pub edges: usize,
    pub rejected: Vec<RejectedLine>,
}

/// How a single line is routed
#[derive(Debug, PartialEq)]
enum LineKind {
    Vertex,
    Edge(i64),
}

/// Pending edge: ordered by relation_id, then arrival
type PendingEdge = Reverse<(i64, usize, String)>;

/// Writes records separated by the input's terminator
struct LineSink<'w, W: Write> {
    writer: &'w mut W,
    terminator: &'static str,
    written: usize,
}

impl<'w, W: Write> LineSink<'w, W> {
    fn emit(&mut self, text: &str) -> io::Result<()> {
        if self.written > 0 {
            self.writer.write_all(self.terminator.as_bytes())?;
        }
        self.writer.write_all(text.as_bytes())?;
        self.written += 1;
        Ok(())
    }

    fn finish(self, trailing: bool) -> io::Result<()> {
        if trailing && self.written > 0 {
            self.writer.write_all(self.terminator.as_bytes())?;
        }
        self.writer.flush()
    }
}

// ============================================================================
// CLASSIFICATION
// ============================================================================

fn classify(line: usize, text: &str) -> ProvResult<LineKind> {
    let value: Value = serde_json::from_str(text).map_err(|e| ProvError::MalformedRecord {
        line,
        reason: format!("invalid JSON: {}", e),
    })?;

    let tag = value
        .get("type")
        .and_then(Value::as_str)
        .ok_or_else(|| ProvError::MalformedRecord {
            line,
            reason: "missing field 'type'".to_string(),
        })?;

    if is_vertex_tag(tag) {
        return Ok(LineKind::Vertex);
    }

    let relation_id = value
        .get("annotations")
        .and_then(|a| a.get(KEY_RELATION_ID))
        .ok_or(ProvError::MissingRelationId { line })?;

    let parsed = match relation_id {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };

    parsed
        .map(LineKind::Edge)
        .ok_or_else(|| ProvError::InvalidRelationId {
            line,
            value: relation_id.to_string(),
        })
}

// ============================================================================
// PUBLIC API
// ============================================================================

/// Reorder a log from `reader` into `writer`.
///
/// Output: all vertex records in input order, then all edge records by
/// ascending relation_id. Unparseable lines are reported and skipped.
pub fn reorder<R: BufRead, W: Write>(reader: R, writer: &mut W) -> ProvResult<ReorderReport> {
    let mut report = ReorderReport::default();
    let mut pending: BinaryHeap<PendingEdge> = BinaryHeap::new();
    let mut sink = LineSink {
        writer,
        terminator: "\n",
        written: 0,
    };
    let mut seen_terminator = false;
    let mut trailing = false;

    for raw in log_lines(reader) {
        let raw = raw?;
        let line = raw.number;
        if !seen_terminator && !raw.terminator.is_empty() {
            sink.terminator = raw.terminator;
            seen_terminator = true;
        }
        trailing = !raw.terminator.is_empty();

        let routed = raw.text().and_then(|text| match normalize_line(text) {
            Some(text) => classify(line, text).map(|kind| Some((kind, text))),
            None => Ok(None),
        });

        match routed {
            Ok(None) => {}
            Ok(Some((LineKind::Vertex, text))) => {
                sink.emit(text)?;
                report.vertices += 1;
            }
            Ok(Some((LineKind::Edge(relation_id), text))) => {
                pending.push(Reverse((relation_id, line, text.to_string())));
            }
            Err(e) if e.is_record_error() => {
                let lossy = raw.lossy();
                log::warn!("Error in ingesting line {}: {} | {}", line, e, lossy);
                report.rejected.push(RejectedLine::from_error(line, &lossy, &e));
            }
            Err(e) => return Err(e),
        }
    }

    log::debug!("Flushing {} pending edges", pending.len());
    while let Some(Reverse((_, _, text))) = pending.pop() {
        sink.emit(&text)?;
        report.edges += 1;
    }
    sink.finish(trailing)?;

    Ok(report)
}

/// Reorder an in-memory log and return the output text
pub fn reorder_str(text: &str) -> ProvResult<(String, ReorderReport)> {
    let mut out = Vec::with_capacity(text.len());
    let report = reorder(text.as_bytes(), &mut out)?;
    let out = String::from_utf8(out).map_err(|e| ProvError::MalformedRecord {
        line: 0,
        reason: format!("output is not UTF-8: {}", e),
    })?;
    Ok((out, report))
}

/// Reorder `input` and append the result to `output` (created if missing)
pub fn reorder_file(input: &Path, output: &Path) -> ProvResult<ReorderReport> {
    let reader = BufReader::new(File::open(input)?);
    let mut file = OpenOptions::new().create(true).read(true).append(true).open(output)?;
    let needs_break = ends_without_newline(&mut file)?;
    let mut writer = BufWriter::new(file);
    if needs_break {
        writer.write_all(b"\n")?;
    }

    log::info!("Reordering {:?} -> {:?}", input, output);
    let report = reorder(reader, &mut writer)?;
    log::info!(
        "Reorder done: {} vertices, {} edges, {} rejected",
        report.vertices,
        report.edges,
        report.rejected.len()
    );
    Ok(report)
}

/// Appending to a file whose last line is unterminated would glue two records
fn ends_without_newline(file: &mut File) -> io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(false);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(classify(1, r#"{"type":"Entity","annotations":{}}"#).unwrap(), LineKind::Vertex);
        assert_eq!(
            classify(1, r#"{"type":"Used","annotations":{"relation_id":"12"}}"#).unwrap(),
            LineKind::Edge(12)
        );
        assert_eq!(
            classify(1, r#"{"type":"Used","annotations":{"relation_id":7}}"#).unwrap(),
            LineKind::Edge(7)
        );
        assert_eq!(
            classify(1, r#"{"type":"Used","annotations":{"relation_id":"-3"}}"#).unwrap(),
            LineKind::Edge(-3)
        );
    }

    #[test]
    fn test_classify_rejects_bad_relation_id() {
        assert!(matches!(
            classify(2, r#"{"type":"Used","annotations":{}}"#),
            Err(ProvError::MissingRelationId { line: 2 })
        ));
        assert!(matches!(
            classify(3, r#"{"type":"Used","annotations":{"relation_id":"x1"}}"#),
            Err(ProvError::InvalidRelationId { line: 3, .. })
        ));
    }
}
