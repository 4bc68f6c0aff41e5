//! Record Parser
//!
//! Validating parse from a CamFlow/SPADE JSON log line to a tagged [`Record`].
//! Fails closed: a record missing a required field is rejected, never half-built.
//!
//! Logs may be plain NDJSON or a JSON array written one element per line
//! (`[`, `{...}`, `,{...}`, `]`); the array framing is stripped here.

use serde::Serialize;
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::io::{self, BufRead};

use super::types::{Annotations, Edge, EdgeType, Record, Vertex};
use crate::constants::KEY_FROM_TYPE;
use crate::error::{ProvError, ProvResult};

// ============================================================================
// TYPES
// ============================================================================

/// A log line that could not be turned into a record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedLine {
    /// 1-based line number in the source log
    pub line: usize,
    pub raw: String,
    pub reason: String,
}

impl RejectedLine {
    pub fn from_error(line: usize, raw: &str, err: &ProvError) -> Self {
        Self {
            line,
            raw: raw.to_string(),
            reason: err.to_string(),
        }
    }
}

/// Outcome of parsing a whole log
#[derive(Debug, Default)]
pub struct ParsedLog {
    pub records: Vec<Record>,
    pub rejected: Vec<RejectedLine>,
}

// ============================================================================
// RAW LINES
// ============================================================================

/// One physical log line, terminator stripped
#[derive(Debug, Clone, PartialEq)]
pub struct RawLine {
    /// 1-based line number
    pub number: usize,
    pub bytes: Vec<u8>,
    /// `"\n"`, `"\r\n"`, or `""` for a final line without one
    pub terminator: &'static str,
}

impl RawLine {
    /// The line as text; a line that is not UTF-8 is a malformed record
    pub fn text(&self) -> ProvResult<&str> {
        std::str::from_utf8(&self.bytes).map_err(|e| ProvError::MalformedRecord {
            line: self.number,
            reason: format!("invalid UTF-8: {}", e),
        })
    }

    pub fn lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }
}

/// Byte-level line reader: undecodable lines are yielded, not fatal
pub struct LogLines<R> {
    reader: R,
    number: usize,
}

pub fn log_lines<R: BufRead>(reader: R) -> LogLines<R> {
    LogLines { reader, number: 0 }
}

impl<R: BufRead> Iterator for LogLines<R> {
    type Item = io::Result<RawLine>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut bytes = Vec::new();
        match self.reader.read_until(b'\n', &mut bytes) {
            Ok(0) => None,
            Ok(_) => {
                self.number += 1;
                let terminator = if bytes.last() == Some(&b'\n') {
                    bytes.pop();
                    if bytes.last() == Some(&b'\r') {
                        bytes.pop();
                        "\r\n"
                    } else {
                        "\n"
                    }
                } else {
                    ""
                };
                Some(Ok(RawLine {
                    number: self.number,
                    bytes,
                    terminator,
                }))
            }
            Err(e) => Some(Err(e)),
        }
    }
}

// ============================================================================
// LINE FRAMING
// ============================================================================

/// Strip array framing from a log line.
///
/// Returns `None` for lines that carry no record (blank, `[` or `]`).
pub fn normalize_line(line: &str) -> Option<&str> {
    let mut text = line.trim();

    if let Some(rest) = text.strip_prefix('[') {
        text = rest.trim_start();
    }
    if let Some(rest) = text.strip_suffix(']') {
        // Only array framing, never a bracket that belongs to the object
        if rest.trim_end().ends_with('}') || rest.trim().is_empty() {
            text = rest.trim_end();
        }
    }
    if let Some(rest) = text.strip_prefix(',') {
        text = rest.trim_start();
    }
    if let Some(rest) = text.strip_suffix(',') {
        text = rest.trim_end();
    }

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

// ============================================================================
// RECORD PARSING
// ============================================================================

/// Parse a single (already normalized) record
pub fn parse_record(line: usize, text: &str) -> ProvResult<Record> {
    let value: Value = serde_json::from_str(text).map_err(|e| ProvError::MalformedRecord {
        line,
        reason: format!("invalid JSON: {}", e),
    })?;

    let obj = value.as_object().ok_or_else(|| ProvError::MalformedRecord {
        line,
        reason: "record is not a JSON object".to_string(),
    })?;

    let tag = required_str(obj, "type", line)?;
    let annotations = match obj.get("annotations") {
        Some(Value::Object(map)) => normalize_annotations(map),
        _ => {
            return Err(ProvError::MalformedRecord {
                line,
                reason: "missing annotations object".to_string(),
            })
        }
    };

    if annotations.contains_key(KEY_FROM_TYPE) {
        let from = required_str(obj, "from", line)?;
        let to = required_str(obj, "to", line)?;
        let id = obj.get("id").and_then(scalar_to_string);

        let edge = Edge::new(id, EdgeType::parse(&tag), from, to, annotations).ok_or_else(|| {
            ProvError::MalformedRecord {
                line,
                reason: "edge without from_type".to_string(),
            }
        })?;
        Ok(Record::Edge(edge))
    } else {
        let id = required_str(obj, "id", line)?;
        Ok(Record::Vertex(Vertex::new(id, tag, annotations)))
    }
}

/// Parse a complete log held in memory
pub fn parse_log(text: &str) -> ParsedLog {
    let mut parsed = ParsedLog::default();
    for (idx, raw) in text.lines().enumerate() {
        push_line(&mut parsed, idx + 1, raw);
    }
    parsed
}

/// Parse a log from any buffered reader (file, stdin)
pub fn parse_reader<R: BufRead>(reader: R) -> ProvResult<ParsedLog> {
    let mut parsed = ParsedLog::default();
    for raw in log_lines(reader) {
        let raw = raw?;
        match raw.text() {
            Ok(text) => push_line(&mut parsed, raw.number, text),
            Err(e) => reject(&mut parsed, raw.number, &raw.lossy(), e),
        }
    }
    Ok(parsed)
}

fn push_line(parsed: &mut ParsedLog, line: usize, raw: &str) {
    let Some(text) = normalize_line(raw) else {
        return;
    };

    match parse_record(line, text) {
        Ok(record) => parsed.records.push(record),
        Err(e) => reject(parsed, line, raw, e),
    }
}

fn reject(parsed: &mut ParsedLog, line: usize, raw: &str, err: ProvError) {
    log::warn!("Skipping record: {} | {}", err, raw);
    parsed.rejected.push(RejectedLine::from_error(line, raw, &err));
}

// ============================================================================
// HELPERS
// ============================================================================

fn required_str(obj: &Map<String, Value>, key: &str, line: usize) -> ProvResult<String> {
    obj.get(key)
        .and_then(scalar_to_string)
        .ok_or_else(|| ProvError::MalformedRecord {
            line,
            reason: format!("missing field '{}'", key),
        })
}

/// Scalar JSON value as a string; `null` and containers are not identifiers
fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Annotation values arrive as strings or numbers; keep everything as text
fn normalize_annotations(map: &Map<String, Value>) -> Annotations {
    map.iter()
        .filter_map(|(key, value)| {
            let text = match value {
                Value::Null => return None,
                Value::String(s) => s.clone(),
                other => scalar_to_string(other).unwrap_or_else(|| other.to_string()),
            };
            Some((key.clone(), text))
        })
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::graph::types::ObjectType;

    #[test]
    fn test_normalize_line_strips_array_framing() {
        assert_eq!(normalize_line("["), None);
        assert_eq!(normalize_line("]"), None);
        assert_eq!(normalize_line("   "), None);
        assert_eq!(normalize_line(",{\"a\":1}"), Some("{\"a\":1}"));
        assert_eq!(normalize_line("[{\"a\":1},"), Some("{\"a\":1}"));
        assert_eq!(normalize_line("{\"a\":1}]"), Some("{\"a\":1}"));
        assert_eq!(normalize_line("{\"a\":[1]}"), Some("{\"a\":[1]}"));
    }

    #[test]
    fn test_parse_vertex_with_numeric_annotations() {
        let record = parse_record(
            1,
            r#"{"type":"Entity","id":"v1","annotations":{"object_type":"process_memory","pid":42,"ipcns":4026531839}}"#,
        )
        .unwrap();

        match record {
            Record::Vertex(v) => {
                assert_eq!(v.id, "v1");
                assert_eq!(v.object_type, Some(ObjectType::ProcessMemory));
                assert_eq!(v.annotation("pid"), Some("42"));
                assert_eq!(v.annotation("ipcns"), Some("4026531839"));
            }
            other => panic!("expected vertex, got {:?}", other),
        }
    }

    #[test]
    fn test_from_type_marks_edge() {
        let record = parse_record(
            1,
            r#"{"type":"Used","from":"t1","to":"f1","annotations":{"from_type":"task","to_type":"file","relation_id":"9"}}"#,
        )
        .unwrap();
        assert!(record.is_edge());
    }

    #[test]
    fn test_missing_required_fields_fail_closed() {
        let no_id = parse_record(3, r#"{"type":"Entity","annotations":{}}"#);
        assert!(matches!(no_id, Err(ProvError::MalformedRecord { line: 3, .. })));

        let no_to = parse_record(4, r#"{"type":"Used","from":"a","annotations":{"from_type":"task"}}"#);
        assert!(no_to.is_err());

        let no_annotations = parse_record(5, r#"{"type":"Entity","id":"x"}"#);
        assert!(no_annotations.is_err());
    }

    #[test]
    fn test_parse_log_reports_bad_lines_and_continues() {
        let log = "[\n{\"type\":\"Entity\",\"id\":\"a\",\"annotations\":{}}\n,not json\n,{\"type\":\"Activity\",\"id\":\"b\",\"annotations\":{}}\n]\n";
        let parsed = parse_log(log);

        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.rejected.len(), 1);
        assert_eq!(parsed.rejected[0].line, 3);
        assert_eq!(parsed.rejected[0].raw, ",not json");
    }

    #[test]
    fn test_parse_reader_skips_undecodable_lines() {
        let mut log = b"{\"type\":\"Entity\",\"id\":\"a\",\"annotations\":{}}\n".to_vec();
        log.extend_from_slice(b"{\"type\":\"Entity\",\"id\":\"b\",\"annotations\":{\"path\":\"/tmp/\xff\xfe\"}}\n");
        log.extend_from_slice(b"{\"type\":\"Activity\",\"id\":\"c\",\"annotations\":{}}");

        let parsed = parse_reader(&log[..]).unwrap();
        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.rejected.len(), 1);
        assert_eq!(parsed.rejected[0].line, 2);
        assert!(parsed.rejected[0].reason.contains("UTF-8"));
        assert!(parsed.rejected[0].raw.contains("/tmp/"));
    }

    #[test]
    fn test_log_lines_keep_terminators() {
        let lines: Vec<RawLine> = log_lines(&b"a\r\nb\nc"[..]).map(|l| l.unwrap()).collect();
        let terminators: Vec<&str> = lines.iter().map(|l| l.terminator).collect();
        assert_eq!(terminators, vec!["\r\n", "\n", ""]);
        assert_eq!(lines[0].bytes, b"a");
        assert_eq!(lines[2].number, 3);
    }
}
