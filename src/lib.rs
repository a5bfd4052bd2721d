//! uvfs - a portable virtual filesystem abstraction for Rust.
//!
//! One interface, [`FileSystem`], over several concrete backends: the
//! in-memory reference implementation [`MemoryFileSystem`], the host-disk
//! adapter [`PhysicalFileSystem`], and the delegating wrappers
//! [`ReadOnlyFileSystem`] and [`SubFileSystem`]. All of them address
//! entries through the normalised path value type [`UPath`].

mod error;

pub mod fs;
pub mod memory;
pub mod path;
pub mod physical;
pub mod readonly;
pub mod sub;

pub use error::{FsError, FsResult};
pub use fs::{
    file_time_zero, FileAccess, FileAttributes, FileShare, FileStream, FileSystem, OpenMode,
    PathStream, Paths, SearchOption, SearchTarget, WatchEvent, WatchEventKind, Watcher,
};
pub use memory::MemoryFileSystem;
pub use path::{PathError, SearchPattern, UPath, UPathComparer};
pub use physical::PhysicalFileSystem;
pub use readonly::ReadOnlyFileSystem;
pub use sub::SubFileSystem;
