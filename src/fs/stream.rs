//! Byte-stream handle returned by [`super::FileSystem::open_file`].

use std::io::SeekFrom;

use async_trait::async_trait;

use crate::error::{FsError, FsResult};

/// A byte stream bound to one open file.
///
/// The handle keeps whatever backend resources the open acquired (for the
/// in-memory backend, the node lock) until [`FileStream::close`] or drop;
/// the release happens exactly once and double close is a no-op. Every other
/// operation on a closed stream fails with [`FsError::Disposed`].
#[async_trait]
pub trait FileStream: Send {
    /// Current length of the underlying file in bytes.
    async fn length(&mut self) -> FsResult<u64>;

    /// Current cursor position.
    fn position(&self) -> u64;

    /// Moves the cursor and returns the new position.
    async fn seek(&mut self, position: SeekFrom) -> FsResult<u64>;

    /// Reads up to `buf.len()` bytes from the cursor; `0` means end of file.
    async fn read(&mut self, buf: &mut [u8]) -> FsResult<usize>;

    /// Writes `buf` at the cursor, growing the file as needed.
    async fn write(&mut self, buf: &[u8]) -> FsResult<usize>;

    /// Truncates or zero-extends the file to `length` bytes.
    async fn set_length(&mut self, length: u64) -> FsResult<()>;

    async fn flush(&mut self) -> FsResult<()>;

    /// Releases the handle's backend resources. Idempotent.
    async fn close(&mut self) -> FsResult<()>;

    /// Reads from the cursor to end of file, appending to `out`.
    async fn read_to_end(&mut self, out: &mut Vec<u8>) -> FsResult<usize> {
        let mut chunk = [0u8; 8192];
        let mut total = 0;
        loop {
            let count = self.read(&mut chunk).await?;
            if count == 0 {
                return Ok(total);
            }
            out.extend_from_slice(&chunk[..count]);
            total += count;
        }
    }

    /// Writes the whole of `buf` at the cursor.
    async fn write_all(&mut self, buf: &[u8]) -> FsResult<()> {
        let mut written = 0;
        while written < buf.len() {
            let count = self.write(&buf[written..]).await?;
            if count == 0 {
                return Err(FsError::Io("stream refused to accept more bytes".to_string()));
            }
            written += count;
        }
        Ok(())
    }
}
