//! Lazy asynchronous sequence of paths produced by enumeration.

use async_trait::async_trait;

use crate::error::FsResult;
use crate::path::UPath;

/// Backend-side driver of one enumeration.
///
/// Implementations buffer at most one directory snapshot taken under the
/// directory's lock and yield the buffered entries with no lock held, so a
/// caller abandoning or suspending the sequence can never pin a lock.
#[async_trait]
pub trait PathStream: Send {
    /// The next matching absolute path, or `None` when exhausted.
    async fn next(&mut self) -> FsResult<Option<UPath>>;
}

/// Lazy sequence of absolute paths returned by
/// [`super::FileSystem::enumerate_paths`].
pub struct Paths {
    inner: Box<dyn PathStream>,
}

impl Paths {
    pub fn new(inner: Box<dyn PathStream>) -> Paths {
        Paths { inner }
    }

    /// The next matching absolute path, or `None` when exhausted.
    pub async fn next(&mut self) -> FsResult<Option<UPath>> {
        self.inner.next().await
    }

    /// Drains the sequence into a vector.
    pub async fn collect(mut self) -> FsResult<Vec<UPath>> {
        let mut out = Vec::new();
        while let Some(path) = self.next().await? {
            out.push(path);
        }
        Ok(out)
    }
}
