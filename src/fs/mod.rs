//! Defines the uniform filesystem interface --- [`FileSystem`].

mod options;
mod paths;
mod stream;
mod watch;

pub use options::{FileAccess, FileAttributes, FileShare, OpenMode, SearchOption, SearchTarget};
pub use paths::{PathStream, Paths};
pub use stream::FileStream;
pub use watch::{WatchEvent, WatchEventKind, Watcher};

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;

use crate::error::{FsError, FsResult};
use crate::path::UPath;

/// Seconds from 1601-01-01T00:00:00Z to the Unix epoch.
const FILE_TIME_EPOCH_DELTA_SECS: u64 = 11_644_473_600;

/// The sentinel timestamp ("file time zero", 1601-01-01 UTC) reported when
/// a time is read for a path that does not exist.
pub fn file_time_zero() -> SystemTime {
    UNIX_EPOCH - Duration::from_secs(FILE_TIME_EPOCH_DELTA_SECS)
}

/// Uniform, POSIX-like interface over a concrete filesystem backend.
///
/// Every path crossing this boundary is an absolute canonical [`UPath`].
/// The null path is rejected everywhere except [`FileSystem::file_exists`]
/// and [`FileSystem::directory_exists`], which report `false` for it.
#[async_trait]
pub trait FileSystem: Send + Sync {
    /// Creates a directory, creating missing intermediate directories on the
    /// way. A no-op when the directory already exists; fails with `Io` when
    /// any segment of the path names an existing file.
    async fn create_directory(&self, path: &UPath) -> FsResult<()>;

    /// Whether `path` resolves to a directory. Null and missing paths yield
    /// `false`; the root yields `true`.
    async fn directory_exists(&self, path: &UPath) -> FsResult<bool>;

    /// Moves a directory to a new location. The destination must not exist
    /// and must not live inside the moved subtree.
    async fn move_directory(&self, src: &UPath, dest: &UPath) -> FsResult<()>;

    /// Deletes a directory. With `recursive` unset the directory must be
    /// empty; with it set the whole subtree is removed, or nothing is when
    /// any descendant is read-only.
    async fn delete_directory(&self, path: &UPath, recursive: bool) -> FsResult<()>;

    /// Copies a file's content and attributes. Fails with `AlreadyExists`
    /// when the destination exists and `overwrite` is unset.
    async fn copy_file(&self, src: &UPath, dest: &UPath, overwrite: bool) -> FsResult<()>;

    /// Atomically replaces `dest` with `src`, optionally preserving the old
    /// destination under `backup` (pass the null path for no backup).
    async fn replace_file(
        &self,
        src: &UPath,
        dest: &UPath,
        backup: &UPath,
        ignore_metadata_errors: bool,
    ) -> FsResult<()>;

    /// Length of a file in bytes.
    async fn get_file_length(&self, path: &UPath) -> FsResult<u64>;

    /// Whether `path` resolves to a file. Null and missing paths yield
    /// `false`.
    async fn file_exists(&self, path: &UPath) -> FsResult<bool>;

    /// Moves a file to a new location. The destination must not exist.
    async fn move_file(&self, src: &UPath, dest: &UPath) -> FsResult<()>;

    /// Deletes a file. Fails with `Unauthorized` when it is read-only.
    async fn delete_file(&self, path: &UPath) -> FsResult<()>;

    /// Opens a file and returns the stream handle that owns the open.
    ///
    /// `share` [`FileShare::NONE`] holds the file exclusively; any other
    /// mode records the share for the admission check of later opens.
    /// [`OpenMode::Append`] combined with read access fails with
    /// `InvalidArgument` before any lock is taken.
    async fn open_file(
        &self,
        path: &UPath,
        mode: OpenMode,
        access: FileAccess,
        share: FileShare,
    ) -> FsResult<Box<dyn FileStream>>;

    /// Attributes of a file or directory, with the `DIRECTORY` and `NORMAL`
    /// bits synthesised from the entry kind.
    async fn get_attributes(&self, path: &UPath) -> FsResult<FileAttributes>;

    /// Stores attributes for a file or directory; the synthesised bits are
    /// stripped before storage.
    async fn set_attributes(&self, path: &UPath, attributes: FileAttributes) -> FsResult<()>;

    /// Creation time, or [`file_time_zero`] when the path does not exist.
    async fn get_creation_time(&self, path: &UPath) -> FsResult<SystemTime>;

    async fn set_creation_time(&self, path: &UPath, time: SystemTime) -> FsResult<()>;

    /// Last-access time, or [`file_time_zero`] when the path does not exist.
    async fn get_last_access_time(&self, path: &UPath) -> FsResult<SystemTime>;

    async fn set_last_access_time(&self, path: &UPath, time: SystemTime) -> FsResult<()>;

    /// Last-write time, or [`file_time_zero`] when the path does not exist.
    async fn get_last_write_time(&self, path: &UPath) -> FsResult<SystemTime>;

    async fn set_last_write_time(&self, path: &UPath, time: SystemTime) -> FsResult<()>;

    /// Lazily enumerates the paths under `path` whose final name matches
    /// `search_pattern`. The anchor not resolving to a directory is the only
    /// hard error; entries deleted while the sequence is being consumed are
    /// skipped silently.
    async fn enumerate_paths(
        &self,
        path: &UPath,
        search_pattern: &str,
        search_option: SearchOption,
        target: SearchTarget,
    ) -> FsResult<Paths>;

    /// Whether [`FileSystem::watch`] can observe `path` on this backend.
    fn can_watch(&self, path: &UPath) -> bool;

    /// Subscribes to changes under `path`.
    async fn watch(&self, path: &UPath) -> FsResult<Watcher>;

    /// Translates a [`UPath`] into the backend's native path form.
    fn convert_path_to_internal(&self, path: &UPath) -> FsResult<PathBuf>;

    /// Translates a backend-native path back into a [`UPath`].
    fn convert_path_from_internal(&self, path: &Path) -> FsResult<UPath>;

    /// Reads the whole of a file.
    async fn read_all_bytes(&self, path: &UPath) -> FsResult<Vec<u8>> {
        let mut stream =
            self.open_file(path, OpenMode::Open, FileAccess::READ, FileShare::READ).await?;
        let mut data = Vec::new();
        stream.read_to_end(&mut data).await?;
        stream.close().await?;
        Ok(data)
    }

    /// Reads the whole of a file as UTF-8 text.
    async fn read_all_text(&self, path: &UPath) -> FsResult<String> {
        let data = self.read_all_bytes(path).await?;
        String::from_utf8(data)
            .map_err(|_| FsError::InvalidArgument("the file content is not valid UTF-8"))
    }

    /// Creates or truncates a file and writes `data` into it.
    async fn write_all_bytes(&self, path: &UPath, data: &[u8]) -> FsResult<()> {
        let mut stream =
            self.open_file(path, OpenMode::Create, FileAccess::WRITE, FileShare::NONE).await?;
        stream.write_all(data).await?;
        stream.close().await
    }

    /// Creates or truncates a file and writes `text` into it.
    async fn write_all_text(&self, path: &UPath, text: &str) -> FsResult<()> {
        self.write_all_bytes(path, text.as_bytes()).await
    }

    /// Appends `text` to a file, creating it when absent.
    async fn append_all_text(&self, path: &UPath, text: &str) -> FsResult<()> {
        let mut stream =
            self.open_file(path, OpenMode::Append, FileAccess::WRITE, FileShare::NONE).await?;
        stream.write_all(text.as_bytes()).await?;
        stream.close().await
    }
}
