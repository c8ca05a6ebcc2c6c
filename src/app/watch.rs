// RptWatch - app/watch.rs
//
// File watch source: filesystem notifications for report files under the
// watch root, delivered as discrete `WatchEvent`s over a single-consumer
// channel.
//
// Architecture:
//   - `notify::RecommendedWatcher` invokes our callback on its own thread.
//     The callback only translates and enqueues (an unbounded mpsc send
//     never blocks), so the notifier is never held up by file reads.
//   - The monitor is the only receiver. Events for one path keep the order
//     the notifier produced them in.
//   - Every forwarded Created event bumps the `SwitchSignal` before it is
//     sent, so a read stuck retrying on the old file notices the pending
//     switch without waiting for the queue to drain.
//   - No deduplication: bursts of Modified events, including metadata-only
//     changes, are forwarded as-is. A read that finds nothing new is a no-op.
//
// Failures of the notifier itself (an error delivered to the callback, or
// removal of the watch root) are forwarded as `WatchMessage::Failed` and are
// fatal to the monitor.

use crate::core::model::{WatchEvent, WatchEventKind, WatchRoot};
use crate::core::tracker::SwitchSignal;
use crate::util::error::WatchError;
use notify::event::{CreateKind, EventKind, ModifyKind, RenameMode};
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use std::path::PathBuf;
use std::sync::mpsc;

/// One item on the event channel.
#[derive(Debug)]
pub enum WatchMessage {
    Event(WatchEvent),
    Failed(WatchError),
}

/// Producer half of the event channel.
///
/// The notifier callback owns one; tests and embedders can hold another to
/// inject events through exactly the same path.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::Sender<WatchMessage>,
    signal: SwitchSignal,
}

impl EventSender {
    /// Enqueue an event. Returns `false` once the consumer is gone.
    pub fn send_event(&self, event: WatchEvent) -> bool {
        if event.kind == WatchEventKind::Created {
            self.signal.request();
        }
        self.tx.send(WatchMessage::Event(event)).is_ok()
    }

    /// Enqueue a fatal failure of the source.
    pub fn send_failure(&self, error: WatchError) -> bool {
        self.tx.send(WatchMessage::Failed(error)).is_ok()
    }

    fn send(&self, message: WatchMessage) -> bool {
        match message {
            WatchMessage::Event(e) => self.send_event(e),
            WatchMessage::Failed(e) => self.send_failure(e),
        }
    }
}

/// Create the event channel and the switch signal shared by both ends.
pub fn event_channel() -> (EventSender, mpsc::Receiver<WatchMessage>, SwitchSignal) {
    let (tx, rx) = mpsc::channel();
    let signal = SwitchSignal::new();
    (
        EventSender {
            tx,
            signal: signal.clone(),
        },
        rx,
        signal,
    )
}

/// A running notifier. Dropping it stops the notifications.
pub struct WatchSource {
    _watcher: RecommendedWatcher,
}

impl WatchSource {
    /// Subscribe to the root and forward matching events to `sender`.
    pub fn start(root: &WatchRoot, sender: EventSender) -> Result<Self, WatchError> {
        let filter = root.clone();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            let messages = match res {
                Ok(event) => translate(&filter, &event),
                Err(source) => vec![WatchMessage::Failed(WatchError::Notifier { source })],
            };
            for message in messages {
                if !sender.send(message) {
                    // Monitor gone; nothing left to notify.
                    return;
                }
            }
        })
        .map_err(|source| WatchError::Init {
            path: root.dir.clone(),
            source,
        })?;

        let mode = if root.recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        watcher
            .watch(&root.dir, mode)
            .map_err(|source| WatchError::Init {
                path: root.dir.clone(),
                source,
            })?;

        tracing::info!(
            root = %root.dir.display(),
            recursive = root.recursive,
            "Watch source started"
        );

        Ok(Self { _watcher: watcher })
    }
}

/// Map one notifier event to zero or more channel messages.
pub fn translate(root: &WatchRoot, event: &notify::Event) -> Vec<WatchMessage> {
    let paths = &event.paths;

    let events: Vec<WatchEvent> = match &event.kind {
        EventKind::Create(CreateKind::Folder) => Vec::new(),
        EventKind::Create(_) => matching(root, paths.iter())
            .map(WatchEvent::created)
            .collect(),

        // A file renamed into the tree is new as far as tailing goes. The
        // destination always gets its own `To` event (alone when the source
        // lies outside the watch), and inotify follows it with a `Both` for
        // the pair, so only `To` counts.
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => matching(root, paths.iter())
            .map(WatchEvent::created)
            .collect(),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both | RenameMode::From)) => Vec::new(),
        // Backends that cannot tell the two halves of a rename apart: the
        // half that still exists is the destination.
        EventKind::Modify(ModifyKind::Name(_)) => matching(root, paths.iter())
            .filter(|p| p.is_file())
            .map(WatchEvent::created)
            .collect(),
        EventKind::Modify(_) => matching(root, paths.iter())
            .map(WatchEvent::modified)
            .collect(),

        EventKind::Remove(_) if paths.iter().any(|p| p == &root.dir) => {
            tracing::error!(root = %root.dir.display(), "Watch root removed");
            return vec![WatchMessage::Failed(WatchError::RootRemoved {
                path: root.dir.clone(),
            })];
        }

        _ => Vec::new(),
    };

    for e in &events {
        tracing::trace!(kind = ?e.kind, file = %e.path.display(), "Watch event");
    }

    events.into_iter().map(WatchMessage::Event).collect()
}

fn matching<'a>(
    root: &'a WatchRoot,
    paths: impl Iterator<Item = &'a PathBuf> + 'a,
) -> impl Iterator<Item = PathBuf> + 'a {
    paths.filter(|p| root.matches(p)).cloned()
}
