//! Read-only delegating wrapper.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use async_trait::async_trait;

use crate::error::{FsError, FsResult};
use crate::fs::{
    FileAccess, FileAttributes, FileShare, FileStream, FileSystem, OpenMode, Paths, SearchOption,
    SearchTarget, Watcher,
};
use crate::path::UPath;

/// Wraps a filesystem and rejects every mutation with `Unauthorized`.
///
/// Reads pass straight through; reported attributes always carry the
/// read-only bit.
pub struct ReadOnlyFileSystem<T: FileSystem> {
    inner: T,
}

impl<T: FileSystem> ReadOnlyFileSystem<T> {
    pub fn new(inner: T) -> ReadOnlyFileSystem<T> {
        ReadOnlyFileSystem { inner }
    }

    pub fn into_inner(self) -> T {
        self.inner
    }
}

#[async_trait]
impl<T: FileSystem> FileSystem for ReadOnlyFileSystem<T> {
    async fn create_directory(&self, path: &UPath) -> FsResult<()> {
        Err(FsError::Unauthorized(path.clone()))
    }

    async fn directory_exists(&self, path: &UPath) -> FsResult<bool> {
        self.inner.directory_exists(path).await
    }

    async fn move_directory(&self, src: &UPath, _dest: &UPath) -> FsResult<()> {
        Err(FsError::Unauthorized(src.clone()))
    }

    async fn delete_directory(&self, path: &UPath, _recursive: bool) -> FsResult<()> {
        Err(FsError::Unauthorized(path.clone()))
    }

    async fn copy_file(&self, _src: &UPath, dest: &UPath, _overwrite: bool) -> FsResult<()> {
        Err(FsError::Unauthorized(dest.clone()))
    }

    async fn replace_file(
        &self,
        _src: &UPath,
        dest: &UPath,
        _backup: &UPath,
        _ignore_metadata_errors: bool,
    ) -> FsResult<()> {
        Err(FsError::Unauthorized(dest.clone()))
    }

    async fn get_file_length(&self, path: &UPath) -> FsResult<u64> {
        self.inner.get_file_length(path).await
    }

    async fn file_exists(&self, path: &UPath) -> FsResult<bool> {
        self.inner.file_exists(path).await
    }

    async fn move_file(&self, src: &UPath, _dest: &UPath) -> FsResult<()> {
        Err(FsError::Unauthorized(src.clone()))
    }

    async fn delete_file(&self, path: &UPath) -> FsResult<()> {
        Err(FsError::Unauthorized(path.clone()))
    }

    async fn open_file(
        &self,
        path: &UPath,
        mode: OpenMode,
        access: FileAccess,
        share: FileShare,
    ) -> FsResult<Box<dyn FileStream>> {
        if mode.requires_write() || access.contains(FileAccess::WRITE) {
            return Err(FsError::Unauthorized(path.clone()));
        }
        self.inner.open_file(path, mode, access, share).await
    }

    async fn get_attributes(&self, path: &UPath) -> FsResult<FileAttributes> {
        let attributes = self.inner.get_attributes(path).await?;
        Ok(attributes.union(FileAttributes::READ_ONLY))
    }

    async fn set_attributes(&self, path: &UPath, _attributes: FileAttributes) -> FsResult<()> {
        Err(FsError::Unauthorized(path.clone()))
    }

    async fn get_creation_time(&self, path: &UPath) -> FsResult<SystemTime> {
        self.inner.get_creation_time(path).await
    }

    async fn set_creation_time(&self, path: &UPath, _time: SystemTime) -> FsResult<()> {
        Err(FsError::Unauthorized(path.clone()))
    }

    async fn get_last_access_time(&self, path: &UPath) -> FsResult<SystemTime> {
        self.inner.get_last_access_time(path).await
    }

    async fn set_last_access_time(&self, path: &UPath, _time: SystemTime) -> FsResult<()> {
        Err(FsError::Unauthorized(path.clone()))
    }

    async fn get_last_write_time(&self, path: &UPath) -> FsResult<SystemTime> {
        self.inner.get_last_write_time(path).await
    }

    async fn set_last_write_time(&self, path: &UPath, _time: SystemTime) -> FsResult<()> {
        Err(FsError::Unauthorized(path.clone()))
    }

    async fn enumerate_paths(
        &self,
        path: &UPath,
        search_pattern: &str,
        search_option: SearchOption,
        target: SearchTarget,
    ) -> FsResult<Paths> {
        self.inner.enumerate_paths(path, search_pattern, search_option, target).await
    }

    fn can_watch(&self, path: &UPath) -> bool {
        self.inner.can_watch(path)
    }

    async fn watch(&self, path: &UPath) -> FsResult<Watcher> {
        self.inner.watch(path).await
    }

    fn convert_path_to_internal(&self, path: &UPath) -> FsResult<PathBuf> {
        self.inner.convert_path_to_internal(path)
    }

    fn convert_path_from_internal(&self, path: &Path) -> FsResult<UPath> {
        self.inner.convert_path_from_internal(path)
    }
}
