//! Ordered lock acquisition for path-addressed operations.
//!
//! [`enter_find_node`] walks a path from the root, holding at most one
//! parent lock at a time (each parent is released as soon as its child is
//! itself locked) and hands back a [`NodeResult`] that owns whatever locks
//! the flags asked to keep. Releasing is RAII: dropping the result, in any
//! order and on any early return, releases owned locks in reverse
//! acquisition order.
//!
//! Deadlock freedom across concurrent operations rests on three caller-side
//! rules: paths resolved together are sorted byte-ordinally first, the
//! global filesystem lock is taken exclusively by any operation spanning
//! more than one parent directory, and descent always locks parents before
//! children.

use std::time::SystemTime;

use crate::error::{FsError, FsResult};
use crate::fs::FileShare;
use crate::path::UPath;

use super::node::Node;

/// Per-target behaviour flags for [`enter_find_node`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub(crate) struct FindFlags(u32);

impl FindFlags {
    pub const NONE: FindFlags = FindFlags(0);
    /// Lock the terminal node exclusively instead of shared.
    pub const NODE_EXCLUSIVE: FindFlags = FindFlags(0x1);
    /// Keep the terminal parent locked exclusively until release.
    pub const KEEP_PARENT_EXCLUSIVE: FindFlags = FindFlags(0x2);
    /// Keep the terminal parent locked shared until release.
    pub const KEEP_PARENT_SHARED: FindFlags = FindFlags(0x4);
    /// Create missing directories along the path, the terminal included.
    pub const CREATE_PATH: FindFlags = FindFlags(0x8);

    pub fn contains(self, other: FindFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: FindFlags) -> FindFlags {
        FindFlags(self.0 | other.0)
    }
}

/// How a guard holds its node.
#[derive(Copy, Clone)]
enum Hold {
    Exclusive,
    Shared,
}

/// Ownership of one held node lock; releases exactly once, on drop at the
/// latest.
pub(crate) struct NodeGuard {
    node: Node,
    hold: Option<Hold>,
}

impl NodeGuard {
    fn new(node: Node, hold: Hold) -> NodeGuard {
        NodeGuard { node, hold: Some(hold) }
    }

    /// Takes the lock of a node that nothing else can reach yet (a freshly
    /// created child under an exclusively held parent).
    pub(super) fn lock_uncontended(
        node: Node,
        exclusive: bool,
        share: Option<FileShare>,
    ) -> NodeGuard {
        let acquired = if exclusive {
            node.lock().try_enter_exclusive()
        } else {
            node.lock().try_enter_shared(share)
        };
        debug_assert!(acquired, "a fresh node's lock must be uncontended");
        NodeGuard::new(node, if exclusive { Hold::Exclusive } else { Hold::Shared })
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    /// Idempotent early release.
    pub fn release(&mut self) {
        if let Some(hold) = self.hold.take() {
            match hold {
                Hold::Exclusive => self.node.lock().exit_exclusive(),
                Hold::Shared => self.node.lock().exit_shared(),
            }
        }
    }
}

impl Drop for NodeGuard {
    fn drop(&mut self) {
        self.release();
    }
}

async fn acquire_exclusive(node: &Node) -> NodeGuard {
    node.lock().enter_exclusive().await;
    NodeGuard::new(node.clone(), Hold::Exclusive)
}

async fn acquire_shared(node: &Node, share: Option<FileShare>, path: &UPath) -> FsResult<NodeGuard> {
    if node.lock().enter_shared(share).await {
        Ok(NodeGuard::new(node.clone(), Hold::Shared))
    } else {
        Err(FsError::Busy(path.clone()))
    }
}

/// Resolution of one target path.
///
/// `node` is `None` when the terminal segment does not exist; `parent` is
/// `None` only for the root. The guards a result owns are released when it
/// drops (node first, then the kept parent).
pub(crate) struct NodeResult {
    parent: Option<Node>,
    node: Option<Node>,
    name: String,
    created: bool,
    node_guard: Option<NodeGuard>,
    parent_guard: Option<NodeGuard>,
}

impl NodeResult {
    pub fn parent(&self) -> Option<&Node> {
        self.parent.as_ref()
    }

    pub fn node(&self) -> Option<&Node> {
        self.node.as_ref()
    }

    /// Terminal segment name; empty for the root.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the terminal node was created by this resolution.
    pub fn created(&self) -> bool {
        self.created
    }

    /// Hands the terminal node's lock over to another owner (the stream
    /// adapter); the result then no longer releases it.
    pub fn take_node_guard(&mut self) -> Option<NodeGuard> {
        self.node_guard.take()
    }

    /// Whether this result holds the lock on `node`.
    fn holds(&self, node: &Node) -> bool {
        self.node_guard.as_ref().is_some_and(|guard| guard.node().same(node))
            || self.parent_guard.as_ref().is_some_and(|guard| guard.node().same(node))
    }
}

/// Resolves `path` from `root`, acquiring locks according to `flags`.
///
/// `share` is recorded on the terminal lock when it is taken shared.
/// `locked` carries the results of targets already resolved by the same
/// operation; any node one of them holds is used without re-locking.
pub(crate) async fn enter_find_node(
    root: &Node,
    path: &UPath,
    flags: FindFlags,
    share: Option<FileShare>,
    locked: &[&NodeResult],
) -> FsResult<NodeResult> {
    debug_assert!(path.is_absolute(), "the orchestrator only resolves absolute paths");

    let parent_exclusive = flags.contains(FindFlags::CREATE_PATH)
        || flags.contains(FindFlags::KEEP_PARENT_EXCLUSIVE);
    let keep_parent = flags.contains(FindFlags::KEEP_PARENT_EXCLUSIVE)
        || flags.contains(FindFlags::KEEP_PARENT_SHARED);
    let node_exclusive = flags.contains(FindFlags::NODE_EXCLUSIVE);
    let already_held = |node: &Node| locked.iter().any(|result| result.holds(node));

    if path.is_root() {
        let node_guard = if already_held(root) {
            None
        } else if node_exclusive {
            Some(acquire_exclusive(root).await)
        } else {
            Some(acquire_shared(root, share, path).await?)
        };
        return Ok(NodeResult {
            parent: None,
            node: Some(root.clone()),
            name: String::new(),
            created: false,
            node_guard,
            parent_guard: None,
        });
    }

    let segments: Vec<&str> = path.segments().collect();
    let last_index = segments.len() - 1;

    let mut parent = root.clone();
    let mut parent_guard = if already_held(&parent) {
        None
    } else if parent_exclusive {
        Some(acquire_exclusive(&parent).await)
    } else {
        Some(acquire_shared(&parent, None, path).await?)
    };
    let mut created = false;

    for (index, segment) in segments.iter().enumerate() {
        let name: &str = segment;
        let is_last = index == last_index;

        let child = match parent.lookup(name) {
            Some(child) => child,
            None if flags.contains(FindFlags::CREATE_PATH) => {
                // The parent is held exclusively here by construction.
                let child = Node::new_directory(SystemTime::now());
                Node::attach(&child, &parent, name);
                if is_last {
                    created = true;
                }
                child
            }
            None if is_last => {
                return Ok(NodeResult {
                    parent: Some(parent.clone()),
                    node: None,
                    name: name.to_string(),
                    created: false,
                    node_guard: None,
                    parent_guard: if keep_parent { parent_guard.take() } else { None },
                });
            }
            None => return Err(FsError::DirectoryNotFound(path.clone())),
        };

        if is_last {
            let node_guard = if already_held(&child) {
                None
            } else if node_exclusive {
                Some(acquire_exclusive(&child).await)
            } else {
                Some(acquire_shared(&child, share, path).await?)
            };
            return Ok(NodeResult {
                parent: Some(parent.clone()),
                node: Some(child),
                name: name.to_string(),
                created,
                node_guard,
                parent_guard: if keep_parent { parent_guard.take() } else { None },
            });
        }

        if !child.is_directory() {
            return Err(if flags.contains(FindFlags::CREATE_PATH) {
                FsError::Io(format!("a file blocks the directory path '{path}'"))
            } else {
                FsError::NotADirectory(path.clone())
            });
        }

        // Lock the child, then let go of its parent; replacing the guard
        // drops (and thereby releases) the previous one.
        let child_guard = if already_held(&child) {
            None
        } else if parent_exclusive {
            Some(acquire_exclusive(&child).await)
        } else {
            Some(acquire_shared(&child, None, path).await?)
        };
        parent_guard = child_guard;
        parent = child;
    }

    unreachable!("the loop returns on the terminal segment")
}
