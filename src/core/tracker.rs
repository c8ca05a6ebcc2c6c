// RptWatch - core/tracker.rs
//
// Active-file state machine.
//
//   NoActiveFile   + initial scan(path)  -> Tracking(path, 0, 1)
//   any state      + Created(path)       -> Tracking(path, 0, epoch + 1)
//   Tracking(p, ..) + Modified(p)        -> tail-read cycle for the epoch
//   Tracking(p, ..) + Modified(other)    -> ignored
//   NoActiveFile   + Modified(_)         -> ignored
//
// The tracker performs no I/O. It hands out `ActiveFile` snapshots and
// accepts read results back through `commit`, which rejects anything
// belonging to an older epoch. It is the only writer of the active record.
//
// Preemption: the watch source bumps a shared `SwitchSignal` for every
// Created event it enqueues. The tracker counts the Created events it has
// applied; while the signal is ahead of that count a switch is waiting in the
// queue and the current epoch is already superseded. `EpochToken` carries
// that comparison into the tail reader's retry loop.

use crate::core::model::{ActiveFile, WatchEvent, WatchEventKind, WatchRoot};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

// =============================================================================
// State
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrackerState {
    NoActiveFile,
    Tracking(ActiveFile),
}

/// What the caller must do after feeding the tracker an input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// A new file became active. The caller announces the switch to the sink
    /// before emitting anything from it.
    Switched(ActiveFile),
    /// The active file changed; run a tail-read cycle from this snapshot.
    Read(ActiveFile),
    /// Nothing to do.
    Ignored,
}

// =============================================================================
// Switch signal / epoch token
// =============================================================================

/// Count of Created events enqueued by the watch source.
///
/// Cloned into the notifier callback; incremented *before* the event is sent
/// so a consumer blocked in a retry loop sees the pending switch immediately.
#[derive(Debug, Clone, Default)]
pub struct SwitchSignal {
    requested: Arc<AtomicU64>,
}

impl SwitchSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that a Created event is about to be enqueued.
    pub fn request(&self) {
        self.requested.fetch_add(1, Ordering::SeqCst);
    }

    pub fn requested(&self) -> u64 {
        self.requested.load(Ordering::SeqCst)
    }
}

/// Cancellation token for work done on behalf of one epoch.
#[derive(Debug, Clone)]
pub struct EpochToken {
    signal: SwitchSignal,
    applied: u64,
    epoch: u64,
}

impl EpochToken {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// True once a Created event is waiting behind the current one; the
    /// epoch this token was issued for will not survive it.
    pub fn is_superseded(&self) -> bool {
        self.signal.requested() > self.applied
    }
}

// =============================================================================
// Tracker
// =============================================================================

/// Owner of the single active-file record.
#[derive(Debug)]
pub struct ActiveFileTracker {
    root: WatchRoot,
    state: TrackerState,
    epoch: u64,
    /// Created events consumed so far, matching or not.
    switches_applied: u64,
}

impl ActiveFileTracker {
    pub fn new(root: WatchRoot) -> Self {
        Self {
            root,
            state: TrackerState::NoActiveFile,
            epoch: 0,
            switches_applied: 0,
        }
    }

    pub fn root(&self) -> &WatchRoot {
        &self.root
    }

    pub fn state(&self) -> &TrackerState {
        &self.state
    }

    /// The active record, if any.
    pub fn active(&self) -> Option<&ActiveFile> {
        match &self.state {
            TrackerState::Tracking(active) => Some(active),
            TrackerState::NoActiveFile => None,
        }
    }

    /// Current epoch; 0 until the first file becomes active.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Seed the tracker with the startup scan result. Only valid from
    /// `NoActiveFile`; once a file is active the scan result is stale.
    pub fn start(&mut self, initial: PathBuf) -> Transition {
        if self.active().is_some() {
            tracing::debug!(
                file = %initial.display(),
                "Tracker: ignoring scan result, a file is already active"
            );
            return Transition::Ignored;
        }
        self.switch_to(initial)
    }

    /// Apply one watch event.
    pub fn apply(&mut self, event: &WatchEvent) -> Transition {
        match event.kind {
            WatchEventKind::Created => {
                self.switches_applied += 1;
                if !self.root.matches(&event.path) {
                    tracing::trace!(file = %event.path.display(), "Tracker: created file does not match");
                    return Transition::Ignored;
                }
                self.switch_to(event.path.clone())
            }
            WatchEventKind::Modified => match &self.state {
                TrackerState::Tracking(active) if active.path == event.path => {
                    Transition::Read(active.clone())
                }
                _ => Transition::Ignored,
            },
        }
    }

    /// Record the offset reached by a tail read.
    ///
    /// Returns `false` (and changes nothing) when `epoch` is no longer
    /// current: the read belongs to a file the tracker has switched away from.
    pub fn commit(&mut self, epoch: u64, new_offset: u64) -> bool {
        match &self.state {
            TrackerState::Tracking(active) if active.epoch == epoch => {
                self.state = TrackerState::Tracking(active.with_offset(new_offset));
                true
            }
            _ => {
                tracing::debug!(
                    stale_epoch = epoch,
                    current_epoch = self.epoch,
                    "Tracker: discarding read from a superseded epoch"
                );
                false
            }
        }
    }

    /// A cancellation token for the current epoch.
    pub fn token(&self, signal: &SwitchSignal) -> EpochToken {
        EpochToken {
            signal: signal.clone(),
            applied: self.switches_applied,
            epoch: self.epoch,
        }
    }

    fn switch_to(&mut self, path: PathBuf) -> Transition {
        self.epoch += 1;
        let active = ActiveFile::new(path, self.epoch);
        tracing::info!(
            file = %active.path.display(),
            epoch = active.epoch,
            "Tracker: switched active file"
        );
        self.state = TrackerState::Tracking(active.clone());
        Transition::Switched(active)
    }
}
