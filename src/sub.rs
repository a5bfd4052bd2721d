//! Path-rewriting wrapper exposing a subtree of another filesystem.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use async_trait::async_trait;

use crate::error::{FsError, FsResult};
use crate::fs::{
    FileAccess, FileAttributes, FileShare, FileStream, FileSystem, OpenMode, PathStream, Paths,
    SearchOption, SearchTarget, WatchEventKind, Watcher,
};
use crate::path::UPath;

/// Exposes a subtree of `inner` as a whole filesystem.
///
/// A path `/x` addressed at this wrapper is rewritten to `<root>/x` before
/// delegation; paths produced by enumeration and watching are rewritten
/// back, and entries outside the subtree are invisible.
pub struct SubFileSystem<T: FileSystem> {
    inner: T,
    root: UPath,
}

impl<T: FileSystem> SubFileSystem<T> {
    /// Re-roots `inner` under `root`, which must be an existing directory.
    pub async fn new(inner: T, root: UPath) -> FsResult<SubFileSystem<T>> {
        if !root.is_absolute() {
            return Err(FsError::InvalidArgument("the sub-filesystem root must be absolute"));
        }
        if !inner.directory_exists(&root).await? {
            return Err(FsError::DirectoryNotFound(root));
        }
        Ok(SubFileSystem { inner, root })
    }

    /// The path inside `inner` this filesystem is rooted at.
    pub fn sub_root(&self) -> &UPath {
        &self.root
    }

    fn delegate(&self, path: &UPath) -> FsResult<UPath> {
        if path.is_null() {
            return Err(crate::path::PathError::NullPath.into());
        }
        if !path.is_absolute() {
            return Err(FsError::InvalidArgument("an absolute path is required"));
        }
        Ok(self.root.join(path.full_name().trim_start_matches('/'))?)
    }
}

/// Maps enumerated inner paths back under the wrapper's root.
struct SubPaths {
    inner: Paths,
    root: UPath,
}

#[async_trait]
impl PathStream for SubPaths {
    async fn next(&mut self) -> FsResult<Option<UPath>> {
        loop {
            let Some(path) = self.inner.next().await? else {
                return Ok(None);
            };
            if let Some(mapped) = path.strip_prefix(&self.root) {
                return Ok(Some(mapped));
            }
        }
    }
}

#[async_trait]
impl<T: FileSystem> FileSystem for SubFileSystem<T> {
    async fn create_directory(&self, path: &UPath) -> FsResult<()> {
        if path.is_root() {
            return Err(FsError::Unauthorized(path.clone()));
        }
        self.inner.create_directory(&self.delegate(path)?).await
    }

    async fn directory_exists(&self, path: &UPath) -> FsResult<bool> {
        if path.is_null() {
            return Ok(false);
        }
        self.inner.directory_exists(&self.delegate(path)?).await
    }

    async fn move_directory(&self, src: &UPath, dest: &UPath) -> FsResult<()> {
        if src.is_root() || dest.is_root() {
            return Err(FsError::Unauthorized(src.clone()));
        }
        self.inner.move_directory(&self.delegate(src)?, &self.delegate(dest)?).await
    }

    async fn delete_directory(&self, path: &UPath, recursive: bool) -> FsResult<()> {
        if path.is_root() {
            return Err(FsError::Unauthorized(path.clone()));
        }
        self.inner.delete_directory(&self.delegate(path)?, recursive).await
    }

    async fn copy_file(&self, src: &UPath, dest: &UPath, overwrite: bool) -> FsResult<()> {
        self.inner.copy_file(&self.delegate(src)?, &self.delegate(dest)?, overwrite).await
    }

    async fn replace_file(
        &self,
        src: &UPath,
        dest: &UPath,
        backup: &UPath,
        ignore_metadata_errors: bool,
    ) -> FsResult<()> {
        let backup = if backup.is_null() { UPath::null() } else { self.delegate(backup)? };
        self.inner
            .replace_file(
                &self.delegate(src)?,
                &self.delegate(dest)?,
                &backup,
                ignore_metadata_errors,
            )
            .await
    }

    async fn get_file_length(&self, path: &UPath) -> FsResult<u64> {
        self.inner.get_file_length(&self.delegate(path)?).await
    }

    async fn file_exists(&self, path: &UPath) -> FsResult<bool> {
        if path.is_null() {
            return Ok(false);
        }
        self.inner.file_exists(&self.delegate(path)?).await
    }

    async fn move_file(&self, src: &UPath, dest: &UPath) -> FsResult<()> {
        if src.is_root() || dest.is_root() {
            return Err(FsError::Unauthorized(src.clone()));
        }
        self.inner.move_file(&self.delegate(src)?, &self.delegate(dest)?).await
    }

    async fn delete_file(&self, path: &UPath) -> FsResult<()> {
        self.inner.delete_file(&self.delegate(path)?).await
    }

    async fn open_file(
        &self,
        path: &UPath,
        mode: OpenMode,
        access: FileAccess,
        share: FileShare,
    ) -> FsResult<Box<dyn FileStream>> {
        self.inner.open_file(&self.delegate(path)?, mode, access, share).await
    }

    async fn get_attributes(&self, path: &UPath) -> FsResult<FileAttributes> {
        self.inner.get_attributes(&self.delegate(path)?).await
    }

    async fn set_attributes(&self, path: &UPath, attributes: FileAttributes) -> FsResult<()> {
        self.inner.set_attributes(&self.delegate(path)?, attributes).await
    }

    async fn get_creation_time(&self, path: &UPath) -> FsResult<SystemTime> {
        self.inner.get_creation_time(&self.delegate(path)?).await
    }

    async fn set_creation_time(&self, path: &UPath, time: SystemTime) -> FsResult<()> {
        self.inner.set_creation_time(&self.delegate(path)?, time).await
    }

    async fn get_last_access_time(&self, path: &UPath) -> FsResult<SystemTime> {
        self.inner.get_last_access_time(&self.delegate(path)?).await
    }

    async fn set_last_access_time(&self, path: &UPath, time: SystemTime) -> FsResult<()> {
        self.inner.set_last_access_time(&self.delegate(path)?, time).await
    }

    async fn get_last_write_time(&self, path: &UPath) -> FsResult<SystemTime> {
        self.inner.get_last_write_time(&self.delegate(path)?).await
    }

    async fn set_last_write_time(&self, path: &UPath, time: SystemTime) -> FsResult<()> {
        self.inner.set_last_write_time(&self.delegate(path)?, time).await
    }

    async fn enumerate_paths(
        &self,
        path: &UPath,
        search_pattern: &str,
        search_option: SearchOption,
        target: SearchTarget,
    ) -> FsResult<Paths> {
        let inner = self
            .inner
            .enumerate_paths(&self.delegate(path)?, search_pattern, search_option, target)
            .await?;
        Ok(Paths::new(Box::new(SubPaths { inner, root: self.root.clone() })))
    }

    fn can_watch(&self, path: &UPath) -> bool {
        match self.delegate(path) {
            Ok(mapped) => self.inner.can_watch(&mapped),
            Err(_) => false,
        }
    }

    async fn watch(&self, path: &UPath) -> FsResult<Watcher> {
        let mut inner = self.inner.watch(&self.delegate(path)?).await?;
        let (sender, receiver) = async_channel::unbounded();
        let root = self.root.clone();
        // Forward inner events, rewriting paths back under the sub-root;
        // the task ends when either side hangs up.
        tokio::spawn(async move {
            while let Some(mut event) = inner.next().await {
                let Some(mapped) = event.path.strip_prefix(&root) else {
                    continue;
                };
                event.path = mapped;
                if let WatchEventKind::Renamed { old_path } = event.kind.clone() {
                    match old_path.strip_prefix(&root) {
                        Some(mapped_old) => {
                            event.kind = WatchEventKind::Renamed { old_path: mapped_old };
                        }
                        None => continue,
                    }
                }
                if sender.send(event).await.is_err() {
                    break;
                }
            }
        });
        Ok(Watcher::new(path.clone(), receiver))
    }

    fn convert_path_to_internal(&self, path: &UPath) -> FsResult<PathBuf> {
        self.inner.convert_path_to_internal(&self.delegate(path)?)
    }

    fn convert_path_from_internal(&self, path: &Path) -> FsResult<UPath> {
        let inner = self.inner.convert_path_from_internal(path)?;
        inner
            .strip_prefix(&self.root)
            .ok_or(FsError::InvalidArgument("the native path is outside this filesystem"))
    }
}
