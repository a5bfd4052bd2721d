//! Stream handle over an in-memory file node.

use std::io::SeekFrom;
use std::time::SystemTime;

use async_trait::async_trait;

use crate::error::{FsError, FsResult};
use crate::fs::FileStream;

use super::find::NodeGuard;
use super::node::Node;

/// Byte stream bound to a file node of a [`super::MemoryFileSystem`].
///
/// The guard keeps the node lock taken at open time; it is released exactly
/// once, on [`FileStream::close`] or on drop, whichever comes first.
pub(crate) struct MemoryFileStream {
    guard: NodeGuard,
    position: u64,
    readable: bool,
    writable: bool,
    closed: bool,
}

impl MemoryFileStream {
    pub fn new(guard: NodeGuard, readable: bool, writable: bool, position: u64) -> MemoryFileStream {
        debug_assert!(guard.node().is_file());
        MemoryFileStream { guard, position, readable, writable, closed: false }
    }

    fn node(&self) -> &Node {
        self.guard.node()
    }

    fn ensure_open(&self) -> FsResult<()> {
        if self.closed {
            Err(FsError::Disposed)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl FileStream for MemoryFileStream {
    async fn length(&mut self) -> FsResult<u64> {
        self.ensure_open()?;
        Ok(self.node().file_len())
    }

    fn position(&self) -> u64 {
        self.position
    }

    async fn seek(&mut self, position: SeekFrom) -> FsResult<u64> {
        self.ensure_open()?;
        let base = match position {
            SeekFrom::Start(offset) => {
                self.position = offset;
                return Ok(self.position);
            }
            SeekFrom::End(offset) => (self.node().file_len() as i64, offset),
            SeekFrom::Current(offset) => (self.position as i64, offset),
        };
        let target = base.0 + base.1;
        if target < 0 {
            return Err(FsError::InvalidArgument("cannot seek before the start of the stream"));
        }
        self.position = target as u64;
        Ok(self.position)
    }

    async fn read(&mut self, buf: &mut [u8]) -> FsResult<usize> {
        self.ensure_open()?;
        if !self.readable {
            return Err(FsError::InvalidArgument("the stream was not opened for reading"));
        }
        let count = self.node().with_content(|content| content.read_at(self.position, buf));
        self.position += count as u64;
        self.node().set_last_access_time(SystemTime::now());
        Ok(count)
    }

    async fn write(&mut self, buf: &[u8]) -> FsResult<usize> {
        self.ensure_open()?;
        if !self.writable {
            return Err(FsError::InvalidArgument("the stream was not opened for writing"));
        }
        self.node().with_content(|content| content.write_at(self.position, buf));
        self.position += buf.len() as u64;
        self.node().touch_write(SystemTime::now());
        Ok(buf.len())
    }

    async fn set_length(&mut self, length: u64) -> FsResult<()> {
        self.ensure_open()?;
        if !self.writable {
            return Err(FsError::InvalidArgument("the stream was not opened for writing"));
        }
        self.node().with_content(|content| content.set_len(length));
        self.node().touch_write(SystemTime::now());
        Ok(())
    }

    async fn flush(&mut self) -> FsResult<()> {
        self.ensure_open()
    }

    async fn close(&mut self) -> FsResult<()> {
        if !self.closed {
            self.closed = true;
            self.guard.release();
        }
        Ok(())
    }
}
