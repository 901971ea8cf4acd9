//! Tokenizer for raw ADDB dump lines.
//!
//! Line layout:
//! ```text
//! * 2020-11-10-10:50:37.794688308 s3-request-state s3_request_id: 3, state: START | locality 0
//! ```
//! Everything before the first `|` is split on whitespace into positional
//! tokens. Each later `|` segment holding exactly two tokens becomes a label.

use std::collections::HashMap;

/// Leading framing token of a dump record
const RECORD_MARKER: &str = "*";

/// One tokenized trace line
///
/// Borrowed from the raw line; nothing is copied until a transformer
/// builds a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceLine<'a> {
    /// Raw timestamp token, `YYYY-MM-DD-HH:MM:SS.nnnnnnnnn`
    pub timestamp: &'a str,

    /// Record-type name (e.g. `fom-phase`)
    pub kind: &'a str,

    /// Tokens after the record-type name
    pub fields: Vec<&'a str>,

    /// Auxiliary labels from `| key value` segments
    pub labels: HashMap<&'a str, &'a str>,
}

impl<'a> TraceLine<'a> {
    /// Field at `position`, counted from the first token after the type name
    pub fn field(&self, position: usize) -> Option<&'a str> {
        self.fields.get(position).copied()
    }

    /// Last field of the record
    pub fn last_field(&self) -> Option<&'a str> {
        self.fields.last().copied()
    }
}

/// Tokenize a raw dump line
///
/// **Public** - entry point used by the registry
///
/// # Returns
/// `None` for blank lines and for lines that do not carry at least a
/// timestamp and a record-type name; such lines are noise, not errors.
pub fn tokenize(line: &str) -> Option<TraceLine<'_>> {
    let mut segments = line.split('|');
    let measurement = segments.next()?;

    let mut tokens = measurement.split_whitespace().peekable();
    if tokens.peek() == Some(&RECORD_MARKER) {
        tokens.next();
    }

    let timestamp = tokens.next()?;
    let kind = tokens.next()?;
    let fields: Vec<&str> = tokens.collect();

    let labels = segments
        .filter_map(|segment| {
            let mut kv = segment.split_whitespace();
            match (kv.next(), kv.next(), kv.next()) {
                (Some(key), Some(value), None) => Some((key, value)),
                _ => None,
            }
        })
        .collect();

    Some(TraceLine {
        timestamp,
        kind,
        fields,
        labels,
    })
}
