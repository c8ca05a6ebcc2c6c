// RptWatch - app/monitor.rs
//
// The single consumer of watch events.
//
// Architecture:
//   - One loop pops `WatchMessage`s off the channel and handles each one to
//     completion (tracker transition, tail read, decode, split, emit) before
//     taking the next. Events for one epoch are therefore processed strictly
//     in arrival order and offset advancement is never interleaved.
//   - The tracker owns the active record; the monitor only holds snapshots
//     for the duration of one cycle and commits results back by epoch.
//   - Before every read attempt and every emitted entry the epoch token is
//     checked. Once a Created event is waiting in the queue, whatever is left
//     of the current cycle is dropped rather than printed under the old file.
//
// Fatal conditions (watch source failure, sink write failure) end `run` with
// an error; nothing else does.

use crate::app::tail::{TailOutcome, TailReader};
use crate::app::watch::WatchMessage;
use crate::core::encoding::TextDecoder;
use crate::core::model::{ActiveFile, WatchEvent};
use crate::core::sink::EntrySink;
use crate::core::splitter;
use crate::core::tracker::{ActiveFileTracker, SwitchSignal, Transition};
use crate::util::constants::DEBUG_MAX_LINE_PREVIEW;
use crate::util::error::{RptWatchError, SinkError, WatchError};
use encoding_rs::Encoding;
use std::path::PathBuf;
use std::sync::mpsc;

/// Drives the tail engine from watch events.
pub struct Monitor<S: EntrySink> {
    tracker: ActiveFileTracker,
    reader: TailReader,
    decoder: TextDecoder,
    signal: SwitchSignal,
    sink: S,
    read_on_switch: bool,
}

impl<S: EntrySink> Monitor<S> {
    /// `signal` must be the one shared with the `EventSender` feeding `run`.
    pub fn new(
        tracker: ActiveFileTracker,
        reader: TailReader,
        encoding: &'static Encoding,
        signal: SwitchSignal,
        sink: S,
    ) -> Self {
        Self {
            tracker,
            reader,
            decoder: TextDecoder::new(encoding),
            signal,
            sink,
            read_on_switch: true,
        }
    }

    /// Whether a newly active file is read straight away (showing content it
    /// already has) or only on its next modification.
    pub fn with_read_on_switch(mut self, enabled: bool) -> Self {
        self.read_on_switch = enabled;
        self
    }

    pub fn tracker(&self) -> &ActiveFileTracker {
        &self.tracker
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Seed the tracker with the startup scan result.
    ///
    /// A Created event already queued by the time the scan finishes names a
    /// newer file than the scan saw, so the seed is skipped and that event
    /// picks the first active file.
    pub fn start(&mut self, initial: Option<PathBuf>) -> Result<(), SinkError> {
        if initial.is_some() && self.tracker.token(&self.signal).is_superseded() {
            tracing::debug!("Scan result superseded by a queued Created event");
            return Ok(());
        }
        match initial {
            Some(path) => {
                let transition = self.tracker.start(path);
                self.on_transition(transition)
            }
            None => {
                tracing::info!(
                    root = %self.tracker.root().dir.display(),
                    "Waiting for a report file to be created"
                );
                Ok(())
            }
        }
    }

    /// Handle one watch event to completion.
    pub fn handle(&mut self, event: &WatchEvent) -> Result<(), SinkError> {
        let transition = self.tracker.apply(event);
        self.on_transition(transition)
    }

    /// Consume events until the source fails or the sink cannot be written.
    ///
    /// There is no terminal state: under normal operation this never returns.
    pub fn run(&mut self, events: mpsc::Receiver<WatchMessage>) -> Result<(), RptWatchError> {
        loop {
            match events.recv() {
                Ok(WatchMessage::Event(event)) => self.handle(&event)?,
                Ok(WatchMessage::Failed(error)) => {
                    tracing::error!(error = %error, "Watch source failed");
                    return Err(error.into());
                }
                Err(mpsc::RecvError) => {
                    tracing::error!("Watch event channel closed");
                    return Err(WatchError::Disconnected.into());
                }
            }
        }
    }

    fn on_transition(&mut self, transition: Transition) -> Result<(), SinkError> {
        match transition {
            Transition::Switched(active) => {
                self.announce(&active)?;
                if self.read_on_switch {
                    self.tail_cycle()?;
                }
                Ok(())
            }
            Transition::Read(_) => self.tail_cycle(),
            Transition::Ignored => Ok(()),
        }
    }

    fn announce(&mut self, active: &ActiveFile) -> Result<(), SinkError> {
        self.decoder.reset();
        let name = self.tracker.root().display_name(&active.path);
        self.sink.on_file_switched(&name)
    }

    /// Read the active file up to end-of-file and emit its entries.
    fn tail_cycle(&mut self) -> Result<(), SinkError> {
        let token = self.tracker.token(&self.signal);

        loop {
            let Some(file) = self.tracker.active().cloned() else {
                return Ok(());
            };

            let chunk = match self.reader.read(&file, &token) {
                TailOutcome::Chunk(chunk) => chunk,
                TailOutcome::Superseded | TailOutcome::TimedOut => return Ok(()),
            };

            if chunk.truncated {
                self.decoder.reset();
            }

            if !chunk.bytes.is_empty() {
                let text = self.decoder.decode(&chunk.bytes);
                let entries = splitter::parse_chunk(&text);
                tracing::debug!(
                    file = %file.path.display(),
                    epoch = file.epoch,
                    offset = chunk.start,
                    bytes = chunk.bytes.len(),
                    entries = entries.len(),
                    "Tail: new content"
                );

                for entry in &entries {
                    if token.is_superseded() {
                        tracing::debug!(
                            file = %file.path.display(),
                            epoch = file.epoch,
                            "Tail: switch pending, discarding rest of read"
                        );
                        return Ok(());
                    }
                    tracing::trace!(
                        severity = %entry.severity,
                        text = %preview(&entry.text),
                        "Entry"
                    );
                    self.sink.on_entry(&entry.text, entry.severity)?;
                }
            }

            if !self.tracker.commit(token.epoch(), chunk.new_offset) || !chunk.more {
                return Ok(());
            }
        }
    }
}

fn preview(text: &str) -> &str {
    let trimmed = text.trim_end();
    match trimmed.char_indices().nth(DEBUG_MAX_LINE_PREVIEW) {
        Some((idx, _)) => &trimmed[..idx],
        None => trimmed,
    }
}
