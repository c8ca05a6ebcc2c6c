// RptWatch - ui/json.rs
//
// JSON-lines sink: one object per switch or entry, for piping into other
// tools instead of reading on a terminal.

use crate::core::model::Severity;
use crate::core::sink::EntrySink;
use crate::util::error::SinkError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum Record<'a> {
    Switched {
        at: DateTime<Utc>,
        file: &'a str,
    },
    Entry {
        at: DateTime<Utc>,
        severity: Severity,
        text: &'a str,
    },
}

pub struct JsonLinesSink<W: Write> {
    out: W,
}

impl JsonLinesSink<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write(&mut self, record: &Record<'_>) -> Result<(), SinkError> {
        serde_json::to_writer(&mut self.out, record)?;
        self.out.write_all(b"\n")?;
        self.out.flush()?;
        Ok(())
    }
}

impl<W: Write> EntrySink for JsonLinesSink<W> {
    fn on_file_switched(&mut self, display_name: &str) -> Result<(), SinkError> {
        self.write(&Record::Switched {
            at: Utc::now(),
            file: display_name,
        })
    }

    fn on_entry(&mut self, text: &str, severity: Severity) -> Result<(), SinkError> {
        self.write(&Record::Entry {
            at: Utc::now(),
            severity,
            text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_object_per_line() {
        let mut sink = JsonLinesSink::new(Vec::new());
        sink.on_file_switched("server/a.rpt").unwrap();
        sink.on_entry("12:00:00 Warning: x\n", Severity::Warning).unwrap();

        let out = String::from_utf8(sink.into_inner()).unwrap();
        let lines: Vec<serde_json::Value> = out
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["event"], "switched");
        assert_eq!(lines[0]["file"], "server/a.rpt");
        assert_eq!(lines[1]["event"], "entry");
        assert_eq!(lines[1]["severity"], "Warning");
        assert_eq!(lines[1]["text"], "12:00:00 Warning: x\n");
        assert!(lines[1]["at"].is_string());
    }
}
