//! Defines the universal path value type [`UPath`] shared by every backend.

mod search;

#[cfg(test)]
mod tests;

pub use search::SearchPattern;

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Errors produced while normalising or combining paths.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PathError {
    /// A segment consisted of more than two dots.
    #[error("invalid path '{0}': a segment is made of more than two dots")]
    TooManyDots(String),
    /// A `..` segment tried to escape the root of an absolute path.
    #[error("invalid path '{0}': cannot navigate above root")]
    AboveRoot(String),
    /// The null path was passed where a concrete path is required.
    #[error("the null path is not valid here")]
    NullPath,
    /// A segment contained a character the backend rejects.
    #[error("invalid path '{path}': character '{found}' is not allowed")]
    IllegalCharacter { path: String, found: char },
}

/// A normalised, absolute-or-relative textual path.
///
/// `UPath` has three distinguished states: *null* (absent), *empty* (`""`)
/// and non-empty. Non-empty values hold the canonical form:
///
/// - `/` is the only separator; backslashes in the input are folded into it.
/// - No repeated separators and no trailing separator (except the root `/`).
/// - `.` segments are dropped unless the whole path is `.`.
/// - `..` segments are folded against the preceding segment; folding against
///   the root of an absolute path is an error.
///
/// Because the canonical form is unique per semantic path, equality is plain
/// string equality and the derived ordering is byte-ordinal. Case handling
/// lives in [`UPathComparer`], not in the value.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct UPath {
    inner: Option<String>,
}

impl UPath {
    /// Parses and normalises `input` into its canonical form.
    pub fn new(input: impl AsRef<str>) -> Result<Self, PathError> {
        Ok(UPath { inner: Some(normalize(input.as_ref())?) })
    }

    /// The null (absent) path.
    pub fn null() -> Self {
        UPath { inner: None }
    }

    /// The empty path `""`.
    pub fn empty() -> Self {
        UPath { inner: Some(String::new()) }
    }

    /// The root path `/`.
    pub fn root() -> Self {
        UPath { inner: Some("/".to_string()) }
    }

    pub fn is_null(&self) -> bool {
        self.inner.is_none()
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.inner.as_deref(), Some(""))
    }

    pub fn is_root(&self) -> bool {
        matches!(self.inner.as_deref(), Some("/"))
    }

    /// A path is absolute iff it begins with `/`. Null and empty paths are
    /// neither absolute nor relative.
    pub fn is_absolute(&self) -> bool {
        self.inner.as_deref().is_some_and(|s| s.starts_with('/'))
    }

    pub fn is_relative(&self) -> bool {
        self.inner.as_deref().is_some_and(|s| !s.is_empty() && !s.starts_with('/'))
    }

    /// The canonical string form, or `None` for the null path.
    pub fn as_str(&self) -> Option<&str> {
        self.inner.as_deref()
    }

    /// The canonical string form; the null path yields `""`.
    pub fn full_name(&self) -> &str {
        self.inner.as_deref().unwrap_or("")
    }

    /// The last segment, or `""` for the root, empty and null paths.
    pub fn file_name(&self) -> &str {
        self.segments().next_back().unwrap_or("")
    }

    /// The directory part of the path.
    ///
    /// `/a/b` yields `/a`, `/a` yields `/`, a single relative segment yields
    /// the empty path, and the root, empty and null paths yield null.
    pub fn parent(&self) -> UPath {
        let Some(s) = self.inner.as_deref() else {
            return UPath::null();
        };
        if s.is_empty() || s == "/" {
            return UPath::null();
        }
        match s.rfind('/') {
            Some(0) => UPath::root(),
            Some(at) => UPath { inner: Some(s[..at].to_string()) },
            None => UPath::empty(),
        }
    }

    /// Iterates over the path segments, root first.
    pub fn segments(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.full_name().split('/').filter(|segment| !segment.is_empty())
    }

    /// Combines `self` with `other` after normalising `other`.
    ///
    /// Returns `other` when it is absolute or when `self` is empty, and
    /// `self` when `other` is empty; otherwise the canonical form of
    /// `self + "/" + other`. Combination re-runs normalisation, so joining
    /// with `..` folds into the parent and joining above the root of an
    /// absolute path fails.
    pub fn join(&self, other: impl AsRef<str>) -> Result<UPath, PathError> {
        self.join_path(&UPath::new(other)?)
    }

    /// [`UPath::join`] for an already normalised path.
    pub fn join_path(&self, other: &UPath) -> Result<UPath, PathError> {
        let (Some(a), Some(b)) = (self.inner.as_deref(), other.inner.as_deref()) else {
            return Err(PathError::NullPath);
        };
        if b.starts_with('/') || a.is_empty() {
            return Ok(other.clone());
        }
        if b.is_empty() {
            return Ok(self.clone());
        }
        UPath::new(format!("{a}/{b}"))
    }

    /// Whether `self` equals `base` or lives inside its subtree.
    ///
    /// The check is segment-aligned: `/ab` is not inside `/a`.
    pub fn starts_with(&self, base: &UPath) -> bool {
        let (Some(s), Some(b)) = (self.inner.as_deref(), base.inner.as_deref()) else {
            return false;
        };
        if b == "/" {
            return s.starts_with('/');
        }
        s == b || (s.starts_with(b) && s.as_bytes().get(b.len()) == Some(&b'/'))
    }

    /// Removes `base` from the front of `self`, keeping the result absolute.
    ///
    /// `/sub/a`.strip_prefix(`/sub`) yields `/a`; a path equal to `base`
    /// yields the root. Returns `None` when `self` is not inside `base`.
    pub fn strip_prefix(&self, base: &UPath) -> Option<UPath> {
        let (Some(s), Some(b)) = (self.inner.as_deref(), base.inner.as_deref()) else {
            return None;
        };
        if b == "/" {
            return s.starts_with('/').then(|| self.clone());
        }
        if s == b {
            return Some(UPath::root());
        }
        if s.starts_with(b) && s.as_bytes().get(b.len()) == Some(&b'/') {
            return Some(UPath { inner: Some(s[b.len()..].to_string()) });
        }
        None
    }
}

impl fmt::Display for UPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.full_name())
    }
}

impl fmt::Debug for UPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            Some(s) => write!(f, "UPath({s:?})"),
            None => f.write_str("UPath(null)"),
        }
    }
}

impl FromStr for UPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UPath::new(s)
    }
}

impl TryFrom<&str> for UPath {
    type Error = PathError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        UPath::new(s)
    }
}

/// Comparison rules over canonical paths.
///
/// Case sensitivity is a property of the comparer, not of [`UPath`] itself;
/// backends pick the comparer matching their own name rules.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum UPathComparer {
    /// Byte-ordinal comparison of the canonical form.
    #[default]
    Ordinal,
    /// Byte-ordinal comparison with ASCII case folded.
    OrdinalIgnoreCase,
}

impl UPathComparer {
    pub fn compare(&self, a: &UPath, b: &UPath) -> Ordering {
        match (&a.inner, &b.inner) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(x), Some(y)) => match self {
                UPathComparer::Ordinal => x.as_bytes().cmp(y.as_bytes()),
                UPathComparer::OrdinalIgnoreCase => x
                    .bytes()
                    .map(|c| c.to_ascii_lowercase())
                    .cmp(y.bytes().map(|c| c.to_ascii_lowercase())),
            },
        }
    }

    pub fn eq(&self, a: &UPath, b: &UPath) -> bool {
        self.compare(a, b) == Ordering::Equal
    }
}

/// Canonicalises one path string.
fn normalize(input: &str) -> Result<String, PathError> {
    if input.is_empty() {
        return Ok(String::new());
    }
    if is_canonical(input) {
        return Ok(input.to_string());
    }

    let absolute = input.starts_with('/') || input.starts_with('\\');
    let mut parts: Vec<&str> = Vec::new();
    for segment in input.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&"..") | None => {
                    if absolute {
                        return Err(PathError::AboveRoot(input.to_string()));
                    }
                    parts.push("..");
                }
                Some(_) => {
                    parts.pop();
                }
            },
            _ if segment.bytes().all(|b| b == b'.') => {
                return Err(PathError::TooManyDots(input.to_string()));
            }
            _ => parts.push(segment),
        }
    }

    Ok(if absolute {
        let mut out = String::with_capacity(input.len());
        for part in &parts {
            out.push('/');
            out.push_str(part);
        }
        if out.is_empty() {
            out.push('/');
        }
        out
    } else if parts.is_empty() {
        // A relative path that fully collapsed still denotes "here".
        ".".to_string()
    } else {
        parts.join("/")
    })
}

/// Fast-path check: a canonical string is returned verbatim.
fn is_canonical(input: &str) -> bool {
    if input == "/" {
        return true;
    }
    if input.contains('\\') || input.contains("//") || input.ends_with('/') {
        return false;
    }
    for segment in input.split('/') {
        if !segment.is_empty() && segment.bytes().all(|b| b == b'.') {
            return false;
        }
    }
    true
}
