//! Stream handle over a host file.

use std::io::SeekFrom;

use async_trait::async_trait;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};

use crate::error::{FsError, FsResult};
use crate::fs::FileStream;

pub(crate) struct PhysicalFileStream {
    file: File,
    position: u64,
    readable: bool,
    writable: bool,
    closed: bool,
}

impl PhysicalFileStream {
    pub fn new(file: File, readable: bool, writable: bool, position: u64) -> PhysicalFileStream {
        PhysicalFileStream { file, position, readable, writable, closed: false }
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
impl FileStream for PhysicalFileStream {
    async fn length(&mut self) -> FsResult<u64> {
        self.ensure_open()?;
        let meta = self.file.metadata().await.map_err(|error| FsError::Io(error.to_string()))?;
        Ok(meta.len())
    }

    fn position(&self) -> u64 {
        self.position
    }

    async fn seek(&mut self, position: SeekFrom) -> FsResult<u64> {
        self.ensure_open()?;
        self.position = self
            .file
            .seek(position)
            .await
            .map_err(|error| FsError::Io(error.to_string()))?;
        Ok(self.position)
    }

    async fn read(&mut self, buf: &mut [u8]) -> FsResult<usize> {
        self.ensure_open()?;
        if !self.readable {
            return Err(FsError::InvalidArgument("the stream was not opened for reading"));
        }
        let count =
            self.file.read(buf).await.map_err(|error| FsError::Io(error.to_string()))?;
        self.position += count as u64;
        Ok(count)
    }

    async fn write(&mut self, buf: &[u8]) -> FsResult<usize> {
        self.ensure_open()?;
        if !self.writable {
            return Err(FsError::InvalidArgument("the stream was not opened for writing"));
        }
        let count =
            self.file.write(buf).await.map_err(|error| FsError::Io(error.to_string()))?;
        self.position += count as u64;
        Ok(count)
    }

    async fn set_length(&mut self, length: u64) -> FsResult<()> {
        self.ensure_open()?;
        if !self.writable {
            return Err(FsError::InvalidArgument("the stream was not opened for writing"));
        }
        self.file.set_len(length).await.map_err(|error| FsError::Io(error.to_string()))
    }

    async fn flush(&mut self) -> FsResult<()> {
        self.ensure_open()?;
        self.file.flush().await.map_err(|error| FsError::Io(error.to_string()))
    }

    async fn close(&mut self) -> FsResult<()> {
        if !self.closed {
            self.closed = true;
            self.file.flush().await.map_err(|error| FsError::Io(error.to_string()))?;
        }
        Ok(())
    }
}
