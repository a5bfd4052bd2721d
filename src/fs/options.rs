//! Option and flag types consumed by [`super::FileSystem`] operations.

/// How [`super::FileSystem::open_file`] treats an existing or missing file.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum OpenMode {
    /// Create the file; fail with `AlreadyExists` when it is present.
    CreateNew,
    /// Create the file, truncating it when it is present.
    Create,
    /// Open the file; fail with `FileNotFound` when it is absent.
    Open,
    /// Open the file, creating it when it is absent.
    OpenOrCreate,
    /// Open and truncate; fail with `FileNotFound` when it is absent.
    Truncate,
    /// Open positioned at the end, creating the file when it is absent.
    /// Incompatible with read access.
    Append,
}

impl OpenMode {
    /// Whether the mode needs write access to do its job. `OpenOrCreate`
    /// is exempt: opening an existing file read-only through it is fine.
    pub fn requires_write(self) -> bool {
        matches!(self, OpenMode::CreateNew | OpenMode::Create | OpenMode::Truncate | OpenMode::Append)
    }
}

/// Access requested for an open file.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct FileAccess(u32);

impl FileAccess {
    pub const READ: FileAccess = FileAccess(0x1);
    pub const WRITE: FileAccess = FileAccess(0x2);
    pub const READ_WRITE: FileAccess = FileAccess(0x3);

    pub fn contains(self, other: FileAccess) -> bool {
        self.0 & other.0 == other.0
    }
}

/// What concurrent opens of the same file are allowed to do.
///
/// The admission rule is asymmetric: a new open is admitted iff its share
/// mode is a subset of the mode recorded by the first holder
/// (`requested & current == requested`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct FileShare(u32);

impl FileShare {
    /// No sharing: the holder requires exclusivity.
    pub const NONE: FileShare = FileShare(0);
    pub const READ: FileShare = FileShare(0x1);
    pub const WRITE: FileShare = FileShare(0x2);
    pub const READ_WRITE: FileShare = FileShare(0x3);

    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    pub fn is_subset_of(self, other: FileShare) -> bool {
        self.0 & other.0 == self.0
    }
}

/// Attribute bits carried by files and directories.
///
/// The `NORMAL` and `DIRECTORY` bits are never stored on a node; backends
/// synthesise them when attributes are read.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct FileAttributes(u32);

impl FileAttributes {
    pub const READ_ONLY: FileAttributes = FileAttributes(0x1);
    pub const HIDDEN: FileAttributes = FileAttributes(0x2);
    pub const SYSTEM: FileAttributes = FileAttributes(0x4);
    pub const DIRECTORY: FileAttributes = FileAttributes(0x10);
    pub const ARCHIVE: FileAttributes = FileAttributes(0x20);
    pub const NORMAL: FileAttributes = FileAttributes(0x80);

    pub fn empty() -> FileAttributes {
        FileAttributes(0)
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, other: FileAttributes) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: FileAttributes) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: FileAttributes) {
        self.0 &= !other.0;
    }

    pub fn union(self, other: FileAttributes) -> FileAttributes {
        FileAttributes(self.0 | other.0)
    }

    /// The attribute set with the synthesised-on-read bits cleared; this is
    /// the form backends store.
    pub fn stored(self) -> FileAttributes {
        let mut attributes = self;
        attributes.remove(FileAttributes::NORMAL);
        attributes.remove(FileAttributes::DIRECTORY);
        attributes
    }
}

/// Whether enumeration descends into subdirectories.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SearchOption {
    TopDirectoryOnly,
    AllDirectories,
}

/// Which kind of entries enumeration yields.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SearchTarget {
    File,
    Directory,
    Both,
}

impl SearchTarget {
    pub fn accepts(self, is_directory: bool) -> bool {
        match self {
            SearchTarget::File => !is_directory,
            SearchTarget::Directory => is_directory,
            SearchTarget::Both => true,
        }
    }
}
