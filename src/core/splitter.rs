// RptWatch - core/splitter.rs
//
// Entry splitting and severity classification.
//
// A chunk of decoded text is cut into entries wherever a line begins with an
// `HH:MM:SS` timestamp. The cut happens just after the newline, so every
// entry keeps its own trailing newline and concatenating the entries always
// reproduces the chunk exactly.
//
// Splitting is per chunk. A record whose timestamp arrived in an earlier
// read continues as the leading entry of the next chunk; nothing is lost or
// reordered, the record is simply printed in two pieces.

use crate::core::model::{LogEntry, Severity};
use crate::util::constants::{ERROR_KEYWORDS, WARNING_KEYWORDS};
use regex::Regex;
use std::sync::OnceLock;

/// Newline immediately followed by a two-digit `HH:MM:SS` stamp.
fn boundary_regex() -> &'static Regex {
    static BOUNDARY: OnceLock<Regex> = OnceLock::new();
    BOUNDARY.get_or_init(|| {
        // ASCII digits only: `\d` would also accept other Unicode digits.
        Regex::new(r"\n[0-9]{2}:[0-9]{2}:[0-9]{2}").expect("splitter: invalid boundary regex")
    })
}

/// Split `chunk` into entry texts in source order.
///
/// Content before the first boundary is its own entry. An empty chunk yields
/// no entries.
pub fn split_entries(chunk: &str) -> Vec<&str> {
    let mut entries = Vec::new();
    let mut start = 0;

    for m in boundary_regex().find_iter(chunk) {
        // The newline stays with the entry it terminates.
        let cut = m.start() + 1;
        if cut > start {
            entries.push(&chunk[start..cut]);
        }
        start = cut;
    }

    if start < chunk.len() {
        entries.push(&chunk[start..]);
    }

    entries
}

/// Classify an entry by keyword. Error keywords are checked first, so an
/// entry matching both sets is an error.
pub fn classify(text: &str) -> Severity {
    let lower = text.to_lowercase();
    if ERROR_KEYWORDS.iter().any(|k| lower.contains(k)) {
        Severity::Error
    } else if WARNING_KEYWORDS.iter().any(|k| lower.contains(k)) {
        Severity::Warning
    } else {
        Severity::Normal
    }
}

/// Split and classify in one pass.
pub fn parse_chunk(chunk: &str) -> Vec<LogEntry> {
    split_entries(chunk)
        .into_iter()
        .map(|text| LogEntry {
            text: text.to_string(),
            severity: classify(text),
        })
        .collect()
}
