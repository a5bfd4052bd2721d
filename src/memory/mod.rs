//! In-memory filesystem: the concurrency-correct reference backend.

mod find;
mod lock;
mod node;
mod search;
mod stream;

#[cfg(test)]
mod tests;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{FsError, FsResult};
use crate::fs::{
    file_time_zero, FileAccess, FileAttributes, FileShare, FileStream, FileSystem, OpenMode,
    Paths, SearchOption, SearchTarget, WatchEvent, WatchEventKind, Watcher,
};
use crate::path::{PathError, SearchPattern, UPath};

use find::{enter_find_node, FindFlags, NodeGuard, NodeResult};
use lock::NodeLock;
use node::{collect_descendants_exclusive, Node};
use search::MemorySearch;
use stream::MemoryFileStream;

/// An in-memory hierarchical filesystem.
///
/// The tree lives behind an `Arc`, so cloning the value yields another
/// handle onto the same filesystem. Operations are serialised per directory
/// by the embedded node locks; operations that rearrange more than one
/// directory additionally hold the filesystem-wide lock exclusively, which
/// makes cross-directory rename and replace atomic with respect to every
/// other operation.
///
/// Name comparison is case-sensitive and byte-ordinal.
#[derive(Clone)]
pub struct MemoryFileSystem {
    inner: Arc<Shared>,
}

struct Shared {
    root: Node,
    global: NodeLock,
    watchers: Mutex<Vec<WatchSink>>,
}

struct WatchSink {
    prefix: UPath,
    sender: async_channel::Sender<WatchEvent>,
}

/// Holds the filesystem-wide lock for the duration of one operation.
struct GlobalGuard<'a> {
    lock: &'a NodeLock,
    exclusive: bool,
}

impl<'a> GlobalGuard<'a> {
    async fn shared(lock: &'a NodeLock) -> GlobalGuard<'a> {
        let entered = lock.enter_shared(None).await;
        debug_assert!(entered, "the global lock never carries a share mode");
        GlobalGuard { lock, exclusive: false }
    }

    async fn exclusive(lock: &'a NodeLock) -> GlobalGuard<'a> {
        lock.enter_exclusive().await;
        GlobalGuard { lock, exclusive: true }
    }
}

impl Drop for GlobalGuard<'_> {
    fn drop(&mut self) {
        if self.exclusive {
            self.lock.exit_exclusive();
        } else {
            self.lock.exit_shared();
        }
    }
}

impl Default for MemoryFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryFileSystem {
    /// Creates an empty filesystem holding only the root directory.
    pub fn new() -> MemoryFileSystem {
        MemoryFileSystem {
            inner: Arc::new(Shared {
                root: Node::new_directory(SystemTime::now()),
                global: NodeLock::new(),
                watchers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Rejects null, relative and ill-formed paths before any lock is taken.
    fn validate(&self, path: &UPath) -> FsResult<()> {
        let Some(text) = path.as_str() else {
            return Err(PathError::NullPath.into());
        };
        if !path.is_absolute() {
            return Err(FsError::InvalidArgument("an absolute path is required"));
        }
        if let Some(found) = text.chars().find(|&c| c == ':') {
            return Err(PathError::IllegalCharacter { path: text.to_string(), found }.into());
        }
        Ok(())
    }

    async fn global_shared(&self) -> GlobalGuard<'_> {
        GlobalGuard::shared(&self.inner.global).await
    }

    async fn global_exclusive(&self) -> GlobalGuard<'_> {
        GlobalGuard::exclusive(&self.inner.global).await
    }

    async fn find(
        &self,
        path: &UPath,
        flags: FindFlags,
        share: Option<FileShare>,
    ) -> FsResult<NodeResult> {
        enter_find_node(&self.inner.root, path, flags, share, &[]).await
    }

    /// Resolves several targets together, acquiring them in byte-ordinal
    /// path order; results come back in request order.
    async fn resolve_sorted(&self, requests: &[(&UPath, FindFlags)]) -> FsResult<Vec<NodeResult>> {
        let mut order: Vec<usize> = (0..requests.len()).collect();
        order.sort_by(|&a, &b| {
            requests[a].0.full_name().as_bytes().cmp(requests[b].0.full_name().as_bytes())
        });
        let mut slots: Vec<Option<NodeResult>> = Vec::new();
        slots.resize_with(requests.len(), || None);
        for &at in &order {
            let (path, flags) = requests[at];
            let result = {
                let locked: Vec<&NodeResult> = slots.iter().flatten().collect();
                enter_find_node(&self.inner.root, path, flags, None, &locked).await?
            };
            slots[at] = Some(result);
        }
        Ok(slots.into_iter().flatten().collect())
    }

    /// Resolution that treats every flavour of "not there" as `None`.
    async fn try_find(&self, path: &UPath) -> FsResult<Option<NodeResult>> {
        match self.find(path, FindFlags::NONE, None).await {
            Ok(result) => {
                if result.node().is_some() {
                    Ok(Some(result))
                } else {
                    Ok(None)
                }
            }
            Err(FsError::DirectoryNotFound(_)) | Err(FsError::NotADirectory(_)) => Ok(None),
            Err(error) => Err(error),
        }
    }

    /// Name-ordered `(name, is_directory)` snapshot of one directory, taken
    /// under the directory's shared lock.
    pub(crate) async fn read_directory_snapshot(
        &self,
        path: &UPath,
    ) -> FsResult<Vec<(String, bool)>> {
        let _global = self.global_shared().await;
        let result = self.find(path, FindFlags::NONE, None).await?;
        let Some(dir) = result.node() else {
            return Err(FsError::DirectoryNotFound(path.clone()));
        };
        if !dir.is_directory() {
            return Err(FsError::NotADirectory(path.clone()));
        }
        Ok(dir
            .children_snapshot()
            .into_iter()
            .map(|(name, child)| {
                let is_directory = child.is_directory();
                (name, is_directory)
            })
            .collect())
    }

    fn publish(&self, kind: WatchEventKind, path: &UPath) {
        let mut sinks = self.inner.watchers.lock().expect("watcher list poisoned");
        if sinks.is_empty() {
            return;
        }
        let event = WatchEvent { kind, path: path.clone() };
        sinks.retain(|sink| {
            if !path.starts_with(&sink.prefix) {
                return !sink.sender.is_closed();
            }
            sink.sender.try_send(event.clone()).is_ok()
        });
    }

    /// Moves one node under a new parent; shared by file and directory
    /// moves, which differ only in the expected node kind.
    async fn move_node(&self, src: &UPath, dest: &UPath, directory: bool) -> FsResult<()> {
        self.validate(src)?;
        self.validate(dest)?;
        if src.is_root() || dest.is_root() {
            return Err(FsError::Unauthorized(if src.is_root() {
                src.clone()
            } else {
                dest.clone()
            }));
        }
        if directory && dest.starts_with(src) {
            return Err(FsError::Io(format!(
                "cannot move the directory '{src}' into its own subtree '{dest}'"
            )));
        }

        let cross_parent = src.parent() != dest.parent();
        let _global = if cross_parent {
            self.global_exclusive().await
        } else {
            self.global_shared().await
        };

        let src_flags = FindFlags::NODE_EXCLUSIVE.union(FindFlags::KEEP_PARENT_EXCLUSIVE);
        let dest_flags = FindFlags::KEEP_PARENT_EXCLUSIVE;
        let mut results =
            self.resolve_sorted(&[(src, src_flags), (dest, dest_flags)]).await?;
        let src_result = results.remove(0);
        let dest_result = results.remove(0);

        let node = match src_result.node() {
            Some(node) => node.clone(),
            None if directory => return Err(FsError::DirectoryNotFound(src.clone())),
            None => return Err(FsError::FileNotFound(src.clone())),
        };
        if directory && !node.is_directory() {
            return Err(FsError::NotADirectory(src.clone()));
        }
        if !directory && node.is_directory() {
            return Err(FsError::IsADirectory(src.clone()));
        }
        if dest_result.node().is_some() {
            return Err(FsError::AlreadyExists(dest.clone()));
        }
        let Some(dest_parent) = dest_result.parent() else {
            return Err(FsError::DirectoryNotFound(dest.clone()));
        };

        let now = SystemTime::now();
        let src_parent = src_result.parent().cloned();
        Node::detach(&node);
        Node::attach(&node, dest_parent, dest_result.name());
        if let Some(src_parent) = src_parent {
            src_parent.touch_write(now);
        }
        dest_parent.touch_write(now);

        debug!(src = %src, dest = %dest, "moved");
        self.publish(WatchEventKind::Renamed { old_path: src.clone() }, dest);
        Ok(())
    }
}

#[async_trait]
impl FileSystem for MemoryFileSystem {
    async fn create_directory(&self, path: &UPath) -> FsResult<()> {
        self.validate(path)?;
        if path.is_root() {
            return Err(FsError::Unauthorized(path.clone()));
        }
        let _global = self.global_shared().await;
        let flags = FindFlags::CREATE_PATH.union(FindFlags::NODE_EXCLUSIVE);
        let result = self.find(path, flags, None).await?;
        match result.node() {
            Some(node) if node.is_directory() => {}
            _ => {
                return Err(FsError::Io(format!(
                    "a file named '{path}' is in the way of the directory"
                )));
            }
        }
        if result.created() {
            debug!(path = %path, "created directory");
            self.publish(WatchEventKind::Created, path);
        }
        Ok(())
    }

    async fn directory_exists(&self, path: &UPath) -> FsResult<bool> {
        if path.is_null() {
            return Ok(false);
        }
        self.validate(path)?;
        if path.is_root() {
            return Ok(true);
        }
        let _global = self.global_shared().await;
        Ok(self
            .try_find(path)
            .await?
            .and_then(|result| result.node().map(Node::is_directory))
            .unwrap_or(false))
    }

    async fn move_directory(&self, src: &UPath, dest: &UPath) -> FsResult<()> {
        self.move_node(src, dest, true).await
    }

    async fn delete_directory(&self, path: &UPath, recursive: bool) -> FsResult<()> {
        self.validate(path)?;
        if path.is_root() {
            return Err(FsError::Unauthorized(path.clone()));
        }
        let _global = self.global_shared().await;
        let flags = FindFlags::NODE_EXCLUSIVE.union(FindFlags::KEEP_PARENT_EXCLUSIVE);
        let result = self.find(path, flags, None).await?;
        let Some(node) = result.node().cloned() else {
            return Err(FsError::DirectoryNotFound(path.clone()));
        };
        if !node.is_directory() {
            return Err(FsError::NotADirectory(path.clone()));
        }
        if !recursive && node.has_children() {
            return Err(FsError::DirectoryNotEmpty(path.clone()));
        }

        // Every descendant is locked exclusively before anything is
        // detached, so a failed check rolls back with the tree intact.
        let mut descendants = Vec::new();
        collect_descendants_exclusive(&node, &mut descendants).await;
        let read_only = node.attributes().contains(FileAttributes::READ_ONLY)
            || descendants
                .iter()
                .any(|child| child.attributes().contains(FileAttributes::READ_ONLY));
        if read_only {
            for child in descendants.iter().rev() {
                child.lock().exit_exclusive();
            }
            return Err(FsError::Unauthorized(path.clone()));
        }

        for child in descendants.iter().rev() {
            Node::detach(child);
            child.dispose();
            child.lock().exit_exclusive();
        }
        Node::detach(&node);
        node.dispose();
        if let Some(parent) = result.parent() {
            parent.touch_write(SystemTime::now());
        }

        debug!(path = %path, recursive, "deleted directory");
        self.publish(WatchEventKind::Deleted, path);
        Ok(())
    }

    async fn copy_file(&self, src: &UPath, dest: &UPath, overwrite: bool) -> FsResult<()> {
        self.validate(src)?;
        self.validate(dest)?;
        if src == dest {
            return Err(FsError::Io(format!("cannot copy '{src}' onto itself")));
        }
        let _global = self.global_shared().await;

        let dest_flags = FindFlags::NODE_EXCLUSIVE.union(FindFlags::KEEP_PARENT_EXCLUSIVE);
        let mut results =
            self.resolve_sorted(&[(src, FindFlags::NONE), (dest, dest_flags)]).await?;
        let src_result = results.remove(0);
        let dest_result = results.remove(0);

        let src_node = match src_result.node() {
            Some(node) if node.is_directory() => return Err(FsError::IsADirectory(src.clone())),
            Some(node) => node.clone(),
            None => return Err(FsError::FileNotFound(src.clone())),
        };
        let data = src_node.with_content(|content| content.to_vec());
        let attributes = src_node.attributes();
        let now = SystemTime::now();

        match dest_result.node() {
            Some(dest_node) => {
                if dest_node.is_directory() {
                    return Err(FsError::IsADirectory(dest.clone()));
                }
                if dest_node.attributes().contains(FileAttributes::READ_ONLY) {
                    return Err(FsError::Unauthorized(dest.clone()));
                }
                if !overwrite {
                    return Err(FsError::AlreadyExists(dest.clone()));
                }
                dest_node.with_content(|content| content.replace(data));
                dest_node.set_attributes(attributes);
                dest_node.touch_write(now);
                self.publish(WatchEventKind::Changed, dest);
            }
            None => {
                let Some(dest_parent) = dest_result.parent() else {
                    return Err(FsError::DirectoryNotFound(dest.clone()));
                };
                let dest_node = Node::new_file(now);
                dest_node.with_content(|content| content.replace(data));
                dest_node.set_attributes(attributes);
                Node::attach(&dest_node, dest_parent, dest_result.name());
                dest_parent.touch_write(now);
                self.publish(WatchEventKind::Created, dest);
            }
        }
        debug!(src = %src, dest = %dest, overwrite, "copied file");
        Ok(())
    }

    async fn replace_file(
        &self,
        src: &UPath,
        dest: &UPath,
        backup: &UPath,
        _ignore_metadata_errors: bool,
    ) -> FsResult<()> {
        self.validate(src)?;
        self.validate(dest)?;
        let has_backup = !backup.is_null();
        if has_backup {
            self.validate(backup)?;
        }
        if src == dest {
            return Err(FsError::InvalidArgument("the source and destination are the same path"));
        }
        if has_backup && (src == backup || dest == backup) {
            return Err(FsError::InvalidArgument("the backup path collides with an operand"));
        }

        let src_parent = src.parent();
        let cross_parent = src_parent != dest.parent()
            || (has_backup && backup.parent() != src_parent);
        let _global = if cross_parent {
            self.global_exclusive().await
        } else {
            self.global_shared().await
        };

        let flags = FindFlags::NODE_EXCLUSIVE.union(FindFlags::KEEP_PARENT_EXCLUSIVE);
        let mut requests = vec![(src, flags), (dest, flags)];
        if has_backup {
            requests.push((backup, flags));
        }
        let mut results = self.resolve_sorted(&requests).await?;
        let src_result = results.remove(0);
        let dest_result = results.remove(0);
        let backup_result = if has_backup { Some(results.remove(0)) } else { None };

        let src_node = match src_result.node() {
            Some(node) if node.is_directory() => return Err(FsError::IsADirectory(src.clone())),
            Some(node) => node.clone(),
            None => return Err(FsError::FileNotFound(src.clone())),
        };
        let dest_node = match dest_result.node() {
            Some(node) if node.is_directory() => return Err(FsError::IsADirectory(dest.clone())),
            Some(node) => node.clone(),
            None => return Err(FsError::FileNotFound(dest.clone())),
        };

        let now = SystemTime::now();
        if let Some(backup_result) = &backup_result {
            if let Some(old_backup) = backup_result.node() {
                if old_backup.is_directory() {
                    return Err(FsError::IsADirectory(backup.clone()));
                }
                Node::detach(old_backup);
                old_backup.dispose();
            }
            let Some(backup_parent) = backup_result.parent() else {
                return Err(FsError::DirectoryNotFound(backup.clone()));
            };
            Node::detach(&dest_node);
            Node::attach(&dest_node, backup_parent, backup_result.name());
            backup_parent.touch_write(now);
            self.publish(WatchEventKind::Created, backup);
        } else {
            Node::detach(&dest_node);
            dest_node.dispose();
        }

        let dest_parent = match dest_result.parent() {
            Some(parent) => parent.clone(),
            None => return Err(FsError::DirectoryNotFound(dest.clone())),
        };
        Node::detach(&src_node);
        Node::attach(&src_node, &dest_parent, dest_result.name());
        dest_parent.touch_write(now);
        if let Some(src_parent) = src_result.parent() {
            src_parent.touch_write(now);
        }

        debug!(src = %src, dest = %dest, backup = %backup, "replaced file");
        self.publish(WatchEventKind::Deleted, src);
        self.publish(WatchEventKind::Changed, dest);
        Ok(())
    }

    async fn get_file_length(&self, path: &UPath) -> FsResult<u64> {
        self.validate(path)?;
        let _global = self.global_shared().await;
        let result = self.find(path, FindFlags::NONE, None).await?;
        match result.node() {
            Some(node) if node.is_file() => Ok(node.file_len()),
            _ => Err(FsError::FileNotFound(path.clone())),
        }
    }

    async fn file_exists(&self, path: &UPath) -> FsResult<bool> {
        if path.is_null() {
            return Ok(false);
        }
        self.validate(path)?;
        if path.is_root() {
            return Ok(false);
        }
        let _global = self.global_shared().await;
        Ok(self
            .try_find(path)
            .await?
            .and_then(|result| result.node().map(Node::is_file))
            .unwrap_or(false))
    }

    async fn move_file(&self, src: &UPath, dest: &UPath) -> FsResult<()> {
        self.move_node(src, dest, false).await
    }

    async fn delete_file(&self, path: &UPath) -> FsResult<()> {
        self.validate(path)?;
        if path.is_root() {
            return Err(FsError::Unauthorized(path.clone()));
        }
        let _global = self.global_shared().await;
        let flags = FindFlags::NODE_EXCLUSIVE.union(FindFlags::KEEP_PARENT_EXCLUSIVE);
        let result = self.find(path, flags, None).await?;
        let Some(node) = result.node().cloned() else {
            return Err(FsError::FileNotFound(path.clone()));
        };
        if node.is_directory() {
            return Err(FsError::IsADirectory(path.clone()));
        }
        if node.attributes().contains(FileAttributes::READ_ONLY) {
            return Err(FsError::Unauthorized(path.clone()));
        }
        debug_assert!(node.is_attached(&self.inner.root));
        Node::detach(&node);
        node.dispose();
        if let Some(parent) = result.parent() {
            parent.touch_write(SystemTime::now());
        }
        debug!(path = %path, "deleted file");
        self.publish(WatchEventKind::Deleted, path);
        Ok(())
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
        self.validate(path)?;
        let _global = self.global_shared().await;

        let mut flags = FindFlags::KEEP_PARENT_EXCLUSIVE;
        if share.is_none() {
            flags = flags.union(FindFlags::NODE_EXCLUSIVE);
        }
        let mut result = self.find(path, flags, Some(share)).await?;

        let readable = access.contains(FileAccess::READ);
        let writable = access.contains(FileAccess::WRITE);

        match result.node().cloned() {
            Some(node) => {
                if node.is_directory() {
                    return Err(FsError::IsADirectory(path.clone()));
                }
                if mode == OpenMode::CreateNew {
                    return Err(FsError::AlreadyExists(path.clone()));
                }
                if writable && node.attributes().contains(FileAttributes::READ_ONLY) {
                    return Err(FsError::Unauthorized(path.clone()));
                }
                if matches!(mode, OpenMode::Create | OpenMode::Truncate) {
                    node.with_content(|content| content.clear());
                    node.touch_write(SystemTime::now());
                }
                let position = if mode == OpenMode::Append { node.file_len() } else { 0 };
                let guard = match result.take_node_guard() {
                    Some(guard) => guard,
                    None => return Err(FsError::Busy(path.clone())),
                };
                Ok(Box::new(MemoryFileStream::new(guard, readable, writable, position)))
            }
            None => {
                if matches!(mode, OpenMode::Open | OpenMode::Truncate) {
                    return Err(FsError::FileNotFound(path.clone()));
                }
                let Some(parent) = result.parent().cloned() else {
                    return Err(FsError::DirectoryNotFound(path.clone()));
                };
                let now = SystemTime::now();
                let node = Node::new_file(now);
                Node::attach(&node, &parent, result.name());
                parent.touch_write(now);
                let share = if share.is_none() { None } else { Some(share) };
                let guard = NodeGuard::lock_uncontended(node, share.is_none(), share);
                debug!(path = %path, "created file");
                self.publish(WatchEventKind::Created, path);
                Ok(Box::new(MemoryFileStream::new(guard, readable, writable, 0)))
            }
        }
    }

    async fn get_attributes(&self, path: &UPath) -> FsResult<FileAttributes> {
        self.validate(path)?;
        let _global = self.global_shared().await;
        let result = self.find(path, FindFlags::NONE, None).await?;
        let Some(node) = result.node() else {
            return Err(FsError::FileNotFound(path.clone()));
        };
        let mut attributes = node.attributes();
        if node.is_directory() {
            attributes.insert(FileAttributes::DIRECTORY);
        } else if attributes.is_empty() {
            attributes.insert(FileAttributes::NORMAL);
        }
        Ok(attributes)
    }

    async fn set_attributes(&self, path: &UPath, attributes: FileAttributes) -> FsResult<()> {
        self.validate(path)?;
        let _global = self.global_shared().await;
        let result = self.find(path, FindFlags::NODE_EXCLUSIVE, None).await?;
        let Some(node) = result.node() else {
            return Err(FsError::FileNotFound(path.clone()));
        };
        node.set_attributes(attributes);
        self.publish(WatchEventKind::Changed, path);
        Ok(())
    }

    async fn get_creation_time(&self, path: &UPath) -> FsResult<SystemTime> {
        self.validate(path)?;
        let _global = self.global_shared().await;
        Ok(self
            .try_find(path)
            .await?
            .and_then(|result| result.node().map(Node::creation_time))
            .unwrap_or_else(file_time_zero))
    }

    async fn set_creation_time(&self, path: &UPath, time: SystemTime) -> FsResult<()> {
        self.validate(path)?;
        let _global = self.global_shared().await;
        let result = self.find(path, FindFlags::NODE_EXCLUSIVE, None).await?;
        let Some(node) = result.node() else {
            return Err(FsError::FileNotFound(path.clone()));
        };
        node.set_creation_time(time);
        self.publish(WatchEventKind::Changed, path);
        Ok(())
    }

    async fn get_last_access_time(&self, path: &UPath) -> FsResult<SystemTime> {
        self.validate(path)?;
        let _global = self.global_shared().await;
        Ok(self
            .try_find(path)
            .await?
            .and_then(|result| result.node().map(Node::last_access_time))
            .unwrap_or_else(file_time_zero))
    }

    async fn set_last_access_time(&self, path: &UPath, time: SystemTime) -> FsResult<()> {
        self.validate(path)?;
        let _global = self.global_shared().await;
        let result = self.find(path, FindFlags::NODE_EXCLUSIVE, None).await?;
        let Some(node) = result.node() else {
            return Err(FsError::FileNotFound(path.clone()));
        };
        node.set_last_access_time(time);
        self.publish(WatchEventKind::Changed, path);
        Ok(())
    }

    async fn get_last_write_time(&self, path: &UPath) -> FsResult<SystemTime> {
        self.validate(path)?;
        let _global = self.global_shared().await;
        Ok(self
            .try_find(path)
            .await?
            .and_then(|result| result.node().map(Node::last_write_time))
            .unwrap_or_else(file_time_zero))
    }

    async fn set_last_write_time(&self, path: &UPath, time: SystemTime) -> FsResult<()> {
        self.validate(path)?;
        let _global = self.global_shared().await;
        let result = self.find(path, FindFlags::NODE_EXCLUSIVE, None).await?;
        let Some(node) = result.node() else {
            return Err(FsError::FileNotFound(path.clone()));
        };
        node.set_last_write_time(time);
        self.publish(WatchEventKind::Changed, path);
        Ok(())
    }

    async fn enumerate_paths(
        &self,
        path: &UPath,
        search_pattern: &str,
        search_option: SearchOption,
        target: SearchTarget,
    ) -> FsResult<Paths> {
        self.validate(path)?;
        let pattern = SearchPattern::parse(path, search_pattern, false)?;

        // The anchor not resolving to a directory is the only hard error;
        // everything after this point degrades to silent skips.
        {
            let _global = self.global_shared().await;
            let result = self.find(pattern.directory(), FindFlags::NONE, None).await?;
            match result.node() {
                Some(node) if node.is_directory() => {}
                Some(_) => return Err(FsError::NotADirectory(pattern.directory().clone())),
                None => return Err(FsError::DirectoryNotFound(pattern.directory().clone())),
            }
        }

        Ok(Paths::new(Box::new(MemorySearch::new(
            self.clone(),
            pattern,
            search_option,
            target,
        ))))
    }

    fn can_watch(&self, path: &UPath) -> bool {
        path.is_absolute()
    }

    async fn watch(&self, path: &UPath) -> FsResult<Watcher> {
        self.validate(path)?;
        let (sender, receiver) = async_channel::unbounded();
        self.inner
            .watchers
            .lock()
            .expect("watcher list poisoned")
            .push(WatchSink { prefix: path.clone(), sender });
        debug!(path = %path, "watch registered");
        Ok(Watcher::new(path.clone(), receiver))
    }

    fn convert_path_to_internal(&self, path: &UPath) -> FsResult<PathBuf> {
        self.validate(path)?;
        Ok(PathBuf::from(path.full_name()))
    }

    fn convert_path_from_internal(&self, path: &Path) -> FsResult<UPath> {
        let text = path
            .to_str()
            .ok_or(FsError::InvalidArgument("the native path is not valid UTF-8"))?;
        Ok(UPath::new(text)?)
    }
}
