//! Nodes of the in-memory tree.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::SystemTime;

use crate::fs::FileAttributes;

use super::lock::NodeLock;

/// Shared handle to one directory or file node.
///
/// The parent owns its children through the child map; a child holds only a
/// weak back-reference to its parent, nulled on detach, so the tree never
/// forms an ownership cycle.
#[derive(Clone)]
pub(crate) struct Node(Arc<NodeInner>);

pub(crate) struct NodeInner {
    kind: NodeKind,
    lock: NodeLock,
    meta: Mutex<NodeMeta>,
}

enum NodeKind {
    Directory(Mutex<BTreeMap<String, Node>>),
    File(Mutex<FileContent>),
}

struct NodeMeta {
    parent: Option<Weak<NodeInner>>,
    /// Name under the parent; empty while detached and for the root.
    name: String,
    attributes: FileAttributes,
    creation_time: SystemTime,
    last_access_time: SystemTime,
    last_write_time: SystemTime,
    disposed: bool,
}

/// Growable byte buffer owned by a file node.
#[derive(Default)]
pub(crate) struct FileContent {
    data: Vec<u8>,
}

impl FileContent {
    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    /// Copies bytes at `offset` into `buf`; returns how many were copied.
    pub fn read_at(&self, offset: u64, buf: &mut [u8]) -> usize {
        let Ok(start) = usize::try_from(offset) else {
            return 0;
        };
        if start >= self.data.len() {
            return 0;
        }
        let count = buf.len().min(self.data.len() - start);
        buf[..count].copy_from_slice(&self.data[start..start + count]);
        count
    }

    /// Writes `buf` at `offset`, zero-filling any gap before it.
    pub fn write_at(&mut self, offset: u64, buf: &[u8]) {
        let start = offset as usize;
        let end = start + buf.len();
        if self.data.len() < end {
            self.data.resize(end, 0);
        }
        self.data[start..end].copy_from_slice(buf);
    }

    /// Truncates or zero-extends the buffer.
    pub fn set_len(&mut self, len: u64) {
        self.data.resize(len as usize, 0);
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.data.clone()
    }

    pub fn replace(&mut self, data: Vec<u8>) {
        self.data = data;
    }
}

impl Node {
    pub fn new_directory(now: SystemTime) -> Node {
        Node::new(NodeKind::Directory(Mutex::new(BTreeMap::new())), FileAttributes::empty(), now)
    }

    /// New files start with the archive attribute set.
    pub fn new_file(now: SystemTime) -> Node {
        Node::new(NodeKind::File(Mutex::new(FileContent::default())), FileAttributes::ARCHIVE, now)
    }

    fn new(kind: NodeKind, attributes: FileAttributes, now: SystemTime) -> Node {
        Node(Arc::new(NodeInner {
            kind,
            lock: NodeLock::new(),
            meta: Mutex::new(NodeMeta {
                parent: None,
                name: String::new(),
                attributes,
                creation_time: now,
                last_access_time: now,
                last_write_time: now,
                disposed: false,
            }),
        }))
    }

    pub fn lock(&self) -> &NodeLock {
        &self.0.lock
    }

    pub fn is_directory(&self) -> bool {
        matches!(self.0.kind, NodeKind::Directory(_))
    }

    pub fn is_file(&self) -> bool {
        matches!(self.0.kind, NodeKind::File(_))
    }

    /// Identity comparison; two handles to the same node are the same node.
    pub fn same(&self, other: &Node) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    fn meta(&self) -> MutexGuard<'_, NodeMeta> {
        self.0.meta.lock().expect("node meta poisoned")
    }

    fn children(&self) -> MutexGuard<'_, BTreeMap<String, Node>> {
        match &self.0.kind {
            NodeKind::Directory(children) => children.lock().expect("child map poisoned"),
            NodeKind::File(_) => unreachable!("a file node has no children"),
        }
    }

    fn content(&self) -> MutexGuard<'_, FileContent> {
        match &self.0.kind {
            NodeKind::File(content) => content.lock().expect("file content poisoned"),
            NodeKind::Directory(_) => unreachable!("a directory node has no content"),
        }
    }

    /// Runs `f` against the file content under its mutex.
    pub fn with_content<R>(&self, f: impl FnOnce(&mut FileContent) -> R) -> R {
        f(&mut self.content())
    }

    pub fn file_len(&self) -> u64 {
        self.content().len()
    }

    /// The parent node, if the node is attached and not the root.
    pub fn parent(&self) -> Option<Node> {
        self.meta().parent.as_ref().and_then(Weak::upgrade).map(Node)
    }

    /// Whether the node is reachable from the root through parent links.
    /// The root itself reports `true`.
    pub fn is_attached(&self, root: &Node) -> bool {
        let mut current = self.clone();
        loop {
            if current.same(root) {
                return true;
            }
            match current.parent() {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Inserts `child` under `parent`. The parent must be held exclusively
    /// and the child must be detached.
    pub fn attach(child: &Node, parent: &Node, name: &str) {
        debug_assert!(parent.is_directory());
        debug_assert!(parent.lock().is_exclusive(), "attach needs the parent held exclusively");
        {
            let mut meta = child.meta();
            debug_assert!(meta.parent.is_none(), "attach of a node that still has a parent");
            debug_assert!(!meta.disposed, "attach of a disposed node");
            meta.parent = Some(Arc::downgrade(&parent.0));
            meta.name = name.to_string();
        }
        let previous = parent.children().insert(name.to_string(), child.clone());
        debug_assert!(previous.is_none(), "attach over an existing child");
    }

    /// Removes `child` from its parent's map and nulls the back-reference.
    /// Both the child and its parent must be held exclusively.
    pub fn detach(child: &Node) {
        debug_assert!(child.lock().is_exclusive(), "detach needs the child held exclusively");
        let (parent, name) = {
            let mut meta = child.meta();
            let parent = meta.parent.take();
            (parent, std::mem::take(&mut meta.name))
        };
        if let Some(parent) = parent.and_then(|weak| weak.upgrade()).map(Node) {
            debug_assert!(parent.lock().is_exclusive(), "detach needs the parent held exclusively");
            let removed = parent.children().remove(&name);
            debug_assert!(removed.is_some_and(|node| node.same(child)));
        }
    }

    /// Looks a child up by name. The parent must be held at least shared.
    pub fn lookup(&self, name: &str) -> Option<Node> {
        debug_assert!(self.lock().is_locked(), "lookup needs the directory held");
        self.children().get(name).cloned()
    }

    /// Name-ordered snapshot of the children. The directory must be held at
    /// least shared.
    pub fn children_snapshot(&self) -> Vec<(String, Node)> {
        debug_assert!(self.lock().is_locked(), "snapshot needs the directory held");
        self.children().iter().map(|(name, node)| (name.clone(), node.clone())).collect()
    }

    pub fn has_children(&self) -> bool {
        !self.children().is_empty()
    }

    pub fn attributes(&self) -> FileAttributes {
        self.meta().attributes
    }

    pub fn set_attributes(&self, attributes: FileAttributes) {
        self.meta().attributes = attributes.stored();
    }

    pub fn creation_time(&self) -> SystemTime {
        self.meta().creation_time
    }

    pub fn set_creation_time(&self, time: SystemTime) {
        self.meta().creation_time = time;
    }

    pub fn last_access_time(&self) -> SystemTime {
        self.meta().last_access_time
    }

    pub fn set_last_access_time(&self, time: SystemTime) {
        self.meta().last_access_time = time;
    }

    pub fn last_write_time(&self) -> SystemTime {
        self.meta().last_write_time
    }

    pub fn set_last_write_time(&self, time: SystemTime) {
        self.meta().last_write_time = time;
    }

    /// Marks write activity: last-access and last-write move together.
    pub fn touch_write(&self, now: SystemTime) {
        let mut meta = self.meta();
        meta.last_access_time = now;
        meta.last_write_time = now;
    }

    /// Marks the node unusable once detached for good.
    pub fn dispose(&self) {
        self.meta().disposed = true;
    }
}

/// Locks every descendant of `dir` exclusively, appending them to `out` in
/// pre-order. `dir` itself must already be held exclusively; the caller
/// releases `out` in reverse order.
pub(crate) async fn collect_descendants_exclusive(dir: &Node, out: &mut Vec<Node>) {
    debug_assert!(dir.lock().is_exclusive());
    let mut stack: Vec<Node> =
        dir.children_snapshot().into_iter().rev().map(|(_, node)| node).collect();
    while let Some(node) = stack.pop() {
        node.lock().enter_exclusive().await;
        out.push(node.clone());
        if node.is_directory() {
            for (_, child) in node.children_snapshot().into_iter().rev() {
                stack.push(child);
            }
        }
    }
}
