//! Lazy enumeration over the host directory tree.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::fs;

use crate::error::{FsError, FsResult};
use crate::fs::{PathStream, SearchOption, SearchTarget};
use crate::path::{SearchPattern, UPath};

use super::PhysicalFileSystem;

/// Breadth-first walk of the host tree yielding virtual paths.
///
/// Directory listings are buffered one directory at a time; entries that
/// disappear between queueing and the visit are skipped silently, as are
/// names the host reports in a non-UTF-8 encoding.
pub(crate) struct PhysicalSearch {
    fs: PhysicalFileSystem,
    pattern: SearchPattern,
    option: SearchOption,
    target: SearchTarget,
    pending: VecDeque<UPath>,
    buffered: VecDeque<UPath>,
}

impl PhysicalSearch {
    pub fn new(
        fs: PhysicalFileSystem,
        pattern: SearchPattern,
        option: SearchOption,
        target: SearchTarget,
    ) -> PhysicalSearch {
        let anchor = pattern.directory().clone();
        PhysicalSearch {
            fs,
            pattern,
            option,
            target,
            pending: VecDeque::from([anchor]),
            buffered: VecDeque::new(),
        }
    }

    async fn snapshot(&self, directory: &UPath) -> FsResult<Vec<(String, bool)>> {
        let host = self.fs.host_path(directory)?;
        let mut reader =
            fs::read_dir(&host).await.map_err(|error| FsError::Io(error.to_string()))?;
        let mut entries = Vec::new();
        loop {
            match reader.next_entry().await {
                Ok(Some(entry)) => {
                    let Ok(name) = entry.file_name().into_string() else {
                        continue;
                    };
                    let Ok(file_type) = entry.file_type().await else {
                        continue;
                    };
                    entries.push((name, file_type.is_dir()));
                }
                Ok(None) | Err(_) => break,
            }
        }
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(entries)
    }
}

#[async_trait]
impl PathStream for PhysicalSearch {
    async fn next(&mut self) -> FsResult<Option<UPath>> {
        loop {
            if let Some(path) = self.buffered.pop_front() {
                return Ok(Some(path));
            }
            let Some(directory) = self.pending.pop_front() else {
                return Ok(None);
            };
            let Ok(snapshot) = self.snapshot(&directory).await else {
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
