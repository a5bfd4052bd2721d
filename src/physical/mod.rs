//! Host-filesystem backend rooted at a directory.

mod search;
mod stream;

use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use async_trait::async_trait;
use tokio::fs::{self, OpenOptions};
use tokio::task;
use tracing::debug;

use crate::error::{FsError, FsResult};
use crate::fs::{
    file_time_zero, FileAccess, FileAttributes, FileShare, FileStream, FileSystem, OpenMode,
    Paths, SearchOption, SearchTarget, Watcher,
};
use crate::path::{PathError, SearchPattern, UPath};

use search::PhysicalSearch;
use stream::PhysicalFileStream;

/// Thin adapter exposing a host directory as a filesystem.
///
/// The virtual root `/` maps onto the directory given at construction;
/// paths never escape it because [`UPath`] normalisation refuses to
/// navigate above the root. Locking and sharing are left to the host:
/// this backend adds no cross-process coordination of its own.
#[derive(Clone)]
pub struct PhysicalFileSystem {
    root: PathBuf,
}

impl PhysicalFileSystem {
    /// Mounts `root` as the virtual `/`, canonicalising it when possible.
    pub fn new(root: impl Into<PathBuf>) -> PhysicalFileSystem {
        let root = root.into();
        let canonical = root.canonicalize().unwrap_or(root);
        PhysicalFileSystem { root: canonical }
    }

    /// Borrow the host directory backing the virtual root.
    pub fn root_path(&self) -> &Path {
        &self.root
    }

    fn validate(&self, path: &UPath) -> FsResult<()> {
        if path.is_null() {
            return Err(PathError::NullPath.into());
        }
        if !path.is_absolute() {
            return Err(FsError::InvalidArgument("an absolute path is required"));
        }
        Ok(())
    }

    /// Maps a virtual path onto the host directory.
    fn host_path(&self, path: &UPath) -> FsResult<PathBuf> {
        self.validate(path)?;
        let relative = path.full_name().trim_start_matches('/');
        if relative.is_empty() {
            Ok(self.root.clone())
        } else {
            Ok(self.root.join(relative))
        }
    }

    /// Maps a host path under the root back into a virtual path.
    fn virtual_path(&self, host: &Path) -> FsResult<UPath> {
        let relative = host
            .strip_prefix(&self.root)
            .map_err(|_| FsError::InvalidArgument("the native path is outside this filesystem"))?;
        let text = relative
            .to_str()
            .ok_or(FsError::InvalidArgument("the native path is not valid UTF-8"))?;
        Ok(UPath::root().join(text)?)
    }

    async fn host_metadata(&self, path: &UPath) -> FsResult<std::fs::Metadata> {
        let host = self.host_path(path)?;
        fs::symlink_metadata(&host).await.map_err(|error| map_io_error(error, path, false))
    }
}

/// Translates a host error into the backend-independent taxonomy.
fn map_io_error(error: io::Error, path: &UPath, directory: bool) -> FsError {
    match error.kind() {
        io::ErrorKind::NotFound => {
            if directory {
                FsError::DirectoryNotFound(path.clone())
            } else {
                FsError::FileNotFound(path.clone())
            }
        }
        io::ErrorKind::PermissionDenied => FsError::Unauthorized(path.clone()),
        io::ErrorKind::AlreadyExists => FsError::AlreadyExists(path.clone()),
        io::ErrorKind::DirectoryNotEmpty => FsError::DirectoryNotEmpty(path.clone()),
        _ => FsError::Io(error.to_string()),
    }
}

#[async_trait]
impl FileSystem for PhysicalFileSystem {
    async fn create_directory(&self, path: &UPath) -> FsResult<()> {
        if path.is_root() {
            return Err(FsError::Unauthorized(path.clone()));
        }
        let host = self.host_path(path)?;
        fs::create_dir_all(&host).await.map_err(|error| match error.kind() {
            // A file sitting on the path surfaces as "exists"; report it the
            // way the contract words it.
            io::ErrorKind::AlreadyExists | io::ErrorKind::NotADirectory => {
                FsError::Io(format!("a file is in the way of the directory '{path}'"))
            }
            _ => map_io_error(error, path, true),
        })
    }

    async fn directory_exists(&self, path: &UPath) -> FsResult<bool> {
        if path.is_null() {
            return Ok(false);
        }
        let host = self.host_path(path)?;
        Ok(fs::metadata(&host).await.map(|meta| meta.is_dir()).unwrap_or(false))
    }

    async fn move_directory(&self, src: &UPath, dest: &UPath) -> FsResult<()> {
        if src.is_root() || dest.is_root() {
            return Err(FsError::Unauthorized(src.clone()));
        }
        if dest.starts_with(src) {
            return Err(FsError::Io(format!(
                "cannot move the directory '{src}' into its own subtree '{dest}'"
            )));
        }
        let src_host = self.host_path(src)?;
        let dest_host = self.host_path(dest)?;
        let meta =
            fs::symlink_metadata(&src_host).await.map_err(|error| map_io_error(error, src, true))?;
        if !meta.is_dir() {
            return Err(FsError::NotADirectory(src.clone()));
        }
        if fs::symlink_metadata(&dest_host).await.is_ok() {
            return Err(FsError::AlreadyExists(dest.clone()));
        }
        fs::rename(&src_host, &dest_host).await.map_err(|error| map_io_error(error, src, true))
    }

    async fn delete_directory(&self, path: &UPath, recursive: bool) -> FsResult<()> {
        if path.is_root() {
            return Err(FsError::Unauthorized(path.clone()));
        }
        let host = self.host_path(path)?;
        let meta =
            fs::symlink_metadata(&host).await.map_err(|error| map_io_error(error, path, true))?;
        if !meta.is_dir() {
            return Err(FsError::NotADirectory(path.clone()));
        }
        let outcome = if recursive {
            fs::remove_dir_all(&host).await
        } else {
            fs::remove_dir(&host).await
        };
        outcome.map_err(|error| map_io_error(error, path, true))
    }

    async fn copy_file(&self, src: &UPath, dest: &UPath, overwrite: bool) -> FsResult<()> {
        let src_host = self.host_path(src)?;
        let dest_host = self.host_path(dest)?;
        let meta =
            fs::symlink_metadata(&src_host).await.map_err(|error| map_io_error(error, src, false))?;
        if meta.is_dir() {
            return Err(FsError::IsADirectory(src.clone()));
        }
        if let Ok(dest_meta) = fs::symlink_metadata(&dest_host).await {
            if dest_meta.is_dir() {
                return Err(FsError::IsADirectory(dest.clone()));
            }
            if dest_meta.permissions().readonly() {
                return Err(FsError::Unauthorized(dest.clone()));
            }
            if !overwrite {
                return Err(FsError::AlreadyExists(dest.clone()));
            }
        }
        fs::copy(&src_host, &dest_host)
            .await
            .map(|_| ())
            .map_err(|error| map_io_error(error, dest, false))
    }

    async fn replace_file(
        &self,
        src: &UPath,
        dest: &UPath,
        backup: &UPath,
        ignore_metadata_errors: bool,
    ) -> FsResult<()> {
        if src == dest || (!backup.is_null() && (src == backup || dest == backup)) {
            return Err(FsError::InvalidArgument("replace operands must be distinct paths"));
        }
        let src_host = self.host_path(src)?;
        let dest_host = self.host_path(dest)?;
        let src_meta =
            fs::symlink_metadata(&src_host).await.map_err(|error| map_io_error(error, src, false))?;
        if src_meta.is_dir() {
            return Err(FsError::IsADirectory(src.clone()));
        }
        let dest_meta = fs::symlink_metadata(&dest_host)
            .await
            .map_err(|error| map_io_error(error, dest, false))?;
        if dest_meta.is_dir() {
            return Err(FsError::IsADirectory(dest.clone()));
        }

        if backup.is_null() {
            fs::rename(&src_host, &dest_host)
                .await
                .map_err(|error| map_io_error(error, dest, false))?;
        } else {
            let backup_host = self.host_path(backup)?;
            let moved = fs::rename(&dest_host, &backup_host).await;
            if let Err(error) = moved {
                if !ignore_metadata_errors {
                    return Err(map_io_error(error, backup, false));
                }
            }
            fs::rename(&src_host, &dest_host)
                .await
                .map_err(|error| map_io_error(error, dest, false))?;
        }
        debug!(src = %src, dest = %dest, "replaced file");
        Ok(())
    }

    async fn get_file_length(&self, path: &UPath) -> FsResult<u64> {
        let meta = self.host_metadata(path).await?;
        if !meta.is_file() {
            return Err(FsError::FileNotFound(path.clone()));
        }
        Ok(meta.len())
    }

    async fn file_exists(&self, path: &UPath) -> FsResult<bool> {
        if path.is_null() {
            return Ok(false);
        }
        let host = self.host_path(path)?;
        Ok(fs::metadata(&host).await.map(|meta| meta.is_file()).unwrap_or(false))
    }

    async fn move_file(&self, src: &UPath, dest: &UPath) -> FsResult<()> {
        if src.is_root() || dest.is_root() {
            return Err(FsError::Unauthorized(src.clone()));
        }
        let src_host = self.host_path(src)?;
        let dest_host = self.host_path(dest)?;
        let meta =
            fs::symlink_metadata(&src_host).await.map_err(|error| map_io_error(error, src, false))?;
        if meta.is_dir() {
            return Err(FsError::IsADirectory(src.clone()));
        }
        if fs::symlink_metadata(&dest_host).await.is_ok() {
            return Err(FsError::AlreadyExists(dest.clone()));
        }
        fs::rename(&src_host, &dest_host).await.map_err(|error| map_io_error(error, src, false))
    }

    async fn delete_file(&self, path: &UPath) -> FsResult<()> {
        let host = self.host_path(path)?;
        let meta =
            fs::symlink_metadata(&host).await.map_err(|error| map_io_error(error, path, false))?;
        if meta.is_dir() {
            return Err(FsError::IsADirectory(path.clone()));
        }
        if meta.permissions().readonly() {
            return Err(FsError::Unauthorized(path.clone()));
        }
        fs::remove_file(&host).await.map_err(|error| map_io_error(error, path, false))
    }

    async fn open_file(
        &self,
        path: &UPath,
        mode: OpenMode,
        access: FileAccess,
        share: FileShare,
    ) -> FsResult<Box<dyn FileStream>> {
        if mode == OpenMode::Append && access.contains(FileAccess::READ) {
            return Err(FsError::InvalidArgument("append cannot be combined with read access"));
        }
        if mode.requires_write() && !access.contains(FileAccess::WRITE) {
            return Err(FsError::InvalidArgument("the open mode requires write access"));
        }
        // Host-side share enforcement is not portable; the request is
        // accepted and the host's own semantics apply.
        let _ = share;
        let host = self.host_path(path)?;

        let mut options = OpenOptions::new();
        options.read(access.contains(FileAccess::READ));
        options.write(access.contains(FileAccess::WRITE));
        match mode {
            OpenMode::CreateNew => {
                options.create_new(true);
            }
            OpenMode::Create => {
                options.create(true).truncate(true);
            }
            OpenMode::Open => {}
            OpenMode::OpenOrCreate => {
                options.create(true);
            }
            OpenMode::Truncate => {
                options.truncate(true);
            }
            OpenMode::Append => {
                options.write(false).append(true).create(true);
            }
        }
        let file = options.open(&host).await.map_err(|error| map_io_error(error, path, false))?;
        let position = if mode == OpenMode::Append {
            file.metadata().await.map_err(|error| map_io_error(error, path, false))?.len()
        } else {
            0
        };
        Ok(Box::new(PhysicalFileStream::new(
            file,
            access.contains(FileAccess::READ),
            access.contains(FileAccess::WRITE) || mode == OpenMode::Append,
            position,
        )))
    }

    async fn get_attributes(&self, path: &UPath) -> FsResult<FileAttributes> {
        let meta = self.host_metadata(path).await?;
        let mut attributes = FileAttributes::empty();
        if meta.is_dir() {
            attributes.insert(FileAttributes::DIRECTORY);
        } else {
            attributes.insert(FileAttributes::ARCHIVE);
        }
        if meta.permissions().readonly() {
            attributes.insert(FileAttributes::READ_ONLY);
        }
        Ok(attributes)
    }

    async fn set_attributes(&self, path: &UPath, attributes: FileAttributes) -> FsResult<()> {
        let host = self.host_path(path)?;
        let meta =
            fs::symlink_metadata(&host).await.map_err(|error| map_io_error(error, path, false))?;
        let read_only = attributes.contains(FileAttributes::READ_ONLY);
        let permissions = host_permissions(&meta, read_only);
        fs::set_permissions(&host, permissions)
            .await
            .map_err(|error| map_io_error(error, path, false))
    }

    async fn get_creation_time(&self, path: &UPath) -> FsResult<SystemTime> {
        match self.host_metadata(path).await {
            Ok(meta) => Ok(meta.created().unwrap_or_else(|_| file_time_zero())),
            Err(FsError::FileNotFound(_)) | Err(FsError::DirectoryNotFound(_)) => {
                Ok(file_time_zero())
            }
            Err(error) => Err(error),
        }
    }

    async fn set_creation_time(&self, path: &UPath, _time: SystemTime) -> FsResult<()> {
        self.validate(path)?;
        Err(FsError::Io("the host filesystem does not allow setting the creation time".into()))
    }

    async fn get_last_access_time(&self, path: &UPath) -> FsResult<SystemTime> {
        match self.host_metadata(path).await {
            Ok(meta) => Ok(meta.accessed().unwrap_or_else(|_| file_time_zero())),
            Err(FsError::FileNotFound(_)) | Err(FsError::DirectoryNotFound(_)) => {
                Ok(file_time_zero())
            }
            Err(error) => Err(error),
        }
    }

    async fn set_last_access_time(&self, path: &UPath, time: SystemTime) -> FsResult<()> {
        let host = self.host_path(path)?;
        let stamp = filetime::FileTime::from_system_time(time);
        task::spawn_blocking(move || filetime::set_file_atime(&host, stamp))
            .await
            .map_err(|_| FsError::Io("the timestamp task was cancelled".into()))?
            .map_err(|error| map_io_error(error, path, false))
    }

    async fn get_last_write_time(&self, path: &UPath) -> FsResult<SystemTime> {
        match self.host_metadata(path).await {
            Ok(meta) => Ok(meta.modified().unwrap_or_else(|_| file_time_zero())),
            Err(FsError::FileNotFound(_)) | Err(FsError::DirectoryNotFound(_)) => {
                Ok(file_time_zero())
            }
            Err(error) => Err(error),
        }
    }

    async fn set_last_write_time(&self, path: &UPath, time: SystemTime) -> FsResult<()> {
        let host = self.host_path(path)?;
        let stamp = filetime::FileTime::from_system_time(time);
        task::spawn_blocking(move || filetime::set_file_mtime(&host, stamp))
            .await
            .map_err(|_| FsError::Io("the timestamp task was cancelled".into()))?
            .map_err(|error| map_io_error(error, path, false))
    }

    async fn enumerate_paths(
        &self,
        path: &UPath,
        search_pattern: &str,
        search_option: SearchOption,
        target: SearchTarget,
    ) -> FsResult<Paths> {
        self.validate(path)?;
        let pattern = SearchPattern::parse(path, search_pattern, cfg!(windows))?;
        let anchor_host = self.host_path(pattern.directory())?;
        let meta = fs::metadata(&anchor_host)
            .await
            .map_err(|error| map_io_error(error, pattern.directory(), true))?;
        if !meta.is_dir() {
            return Err(FsError::NotADirectory(pattern.directory().clone()));
        }
        Ok(Paths::new(Box::new(PhysicalSearch::new(
            self.clone(),
            pattern,
            search_option,
            target,
        ))))
    }

    fn can_watch(&self, _path: &UPath) -> bool {
        false
    }

    async fn watch(&self, _path: &UPath) -> FsResult<Watcher> {
        Err(FsError::InvalidArgument("this backend does not support watching"))
    }

    fn convert_path_to_internal(&self, path: &UPath) -> FsResult<PathBuf> {
        self.host_path(path)
    }

    fn convert_path_from_internal(&self, path: &Path) -> FsResult<UPath> {
        self.virtual_path(path)
    }
}

#[cfg(unix)]
fn host_permissions(meta: &std::fs::Metadata, read_only: bool) -> std::fs::Permissions {
    use std::os::unix::fs::PermissionsExt;
    let mode = meta.permissions().mode();
    let mode = if read_only { mode & !0o222 } else { mode | 0o200 };
    std::fs::Permissions::from_mode(mode)
}

#[cfg(not(unix))]
fn host_permissions(meta: &std::fs::Metadata, read_only: bool) -> std::fs::Permissions {
    let mut permissions = meta.permissions();
    #[allow(clippy::permissions_set_readonly_false)]
    permissions.set_readonly(read_only);
    permissions
}
