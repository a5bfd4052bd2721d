//! Change-notification surface of [`super::FileSystem::watch`].

use crate::path::UPath;

/// What happened to the path carried by a [`WatchEvent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEventKind {
    Created,
    Deleted,
    Changed,
    /// The entry moved; `old_path` is where it used to live.
    Renamed { old_path: UPath },
}

/// One filesystem change observed under a watched path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub kind: WatchEventKind,
    /// Absolute path of the affected entry (the new path for renames).
    pub path: UPath,
}

/// Subscription handle yielding [`WatchEvent`]s for one watched path.
///
/// Dropping the watcher ends the subscription; the publishing side prunes
/// it on its next event.
pub struct Watcher {
    path: UPath,
    receiver: async_channel::Receiver<WatchEvent>,
}

impl Watcher {
    pub(crate) fn new(path: UPath, receiver: async_channel::Receiver<WatchEvent>) -> Watcher {
        Watcher { path, receiver }
    }

    /// The path this watcher was registered on.
    pub fn path(&self) -> &UPath {
        &self.path
    }

    /// The next event, or `None` once the filesystem dropped the feed.
    pub async fn next(&mut self) -> Option<WatchEvent> {
        self.receiver.recv().await.ok()
    }

    /// Non-blocking variant of [`Watcher::next`].
    pub fn try_next(&mut self) -> Option<WatchEvent> {
        self.receiver.try_recv().ok()
    }
}
