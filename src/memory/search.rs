//! Lazy enumeration over the in-memory tree.

use std::collections::VecDeque;

use async_trait::async_trait;

use crate::error::FsResult;
use crate::fs::{PathStream, SearchOption, SearchTarget};
use crate::path::{SearchPattern, UPath};

use super::MemoryFileSystem;

/// Breadth-first walk yielding matching paths.
///
/// Each directory is snapshotted under its shared lock and the snapshot is
/// yielded with no lock held, so an abandoned or suspended enumeration never
/// pins a lock. A queued directory that disappears before its visit is
/// skipped silently.
pub(crate) struct MemorySearch {
    fs: MemoryFileSystem,
    pattern: SearchPattern,
    option: SearchOption,
    target: SearchTarget,
    pending: VecDeque<UPath>,
    buffered: VecDeque<UPath>,
}

impl MemorySearch {
    pub fn new(
        fs: MemoryFileSystem,
        pattern: SearchPattern,
        option: SearchOption,
        target: SearchTarget,
    ) -> MemorySearch {
        let anchor = pattern.directory().clone();
        MemorySearch {
            fs,
            pattern,
            option,
            target,
            pending: VecDeque::from([anchor]),
            buffered: VecDeque::new(),
        }
    }
}

#[async_trait]
impl PathStream for MemorySearch {
    async fn next(&mut self) -> FsResult<Option<UPath>> {
        loop {
            if let Some(path) = self.buffered.pop_front() {
                return Ok(Some(path));
            }
            let Some(directory) = self.pending.pop_front() else {
                return Ok(None);
            };
            let Ok(snapshot) = self.fs.read_directory_snapshot(&directory).await else {
                // Deleted between queueing and the visit.
                continue;
            };
            for (name, is_directory) in snapshot {
                let Ok(child) = directory.join(&name) else {
                    continue;
                };
                if is_directory && self.option == SearchOption::AllDirectories {
                    self.pending.push_back(child.clone());
                }
                if self.target.accepts(is_directory) && self.pattern.is_match(&name) {
                    self.buffered.push_back(child);
                }
            }
        }
    }
}
