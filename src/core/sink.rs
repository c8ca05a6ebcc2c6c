// RptWatch - core/sink.rs
//
// Boundary between the tail engine and whatever renders its output.
// The engine announces file switches and hands over classified entries in
// source order; rendering (colours, JSON, ...) is entirely the sink's
// business.

use crate::core::model::Severity;
use crate::util::error::SinkError;

/// Receiver of tail output.
pub trait EntrySink {
    /// A new file became active. Called before any entry from it.
    fn on_file_switched(&mut self, display_name: &str) -> Result<(), SinkError>;

    /// One classified entry, in source order.
    fn on_entry(&mut self, text: &str, severity: Severity) -> Result<(), SinkError>;
}

/// Everything a `MemorySink` was told, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    Switched(String),
    Entry(String, Severity),
}

/// Sink that records events in memory. Used by tests and by embedders that
/// want to inspect output programmatically.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub events: Vec<SinkEvent>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Concatenated text of all entries, across files.
    pub fn text(&self) -> String {
        self.events
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Entry(text, _) => Some(text.as_str()),
                SinkEvent::Switched(_) => None,
            })
            .collect()
    }

    /// Display names of every announced switch.
    pub fn switches(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Switched(name) => Some(name.as_str()),
                SinkEvent::Entry(..) => None,
            })
            .collect()
    }
}

impl EntrySink for MemorySink {
    fn on_file_switched(&mut self, display_name: &str) -> Result<(), SinkError> {
        self.events.push(SinkEvent::Switched(display_name.to_string()));
        Ok(())
    }

    fn on_entry(&mut self, text: &str, severity: Severity) -> Result<(), SinkError> {
        self.events.push(SinkEvent::Entry(text.to_string(), severity));
        Ok(())
    }
}

impl<S: EntrySink + ?Sized> EntrySink for Box<S> {
    fn on_file_switched(&mut self, display_name: &str) -> Result<(), SinkError> {
        (**self).on_file_switched(display_name)
    }

    fn on_entry(&mut self, text: &str, severity: Severity) -> Result<(), SinkError> {
        (**self).on_entry(text, severity)
    }
}
