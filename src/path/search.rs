//! Wildcard patterns used by path enumeration.

use regex::Regex;

use crate::error::{FsError, FsResult};
use crate::path::UPath;

/// A compiled search pattern anchored at a directory.
///
/// The pattern may carry a literal directory prefix (`sub/dir/*.txt`); the
/// prefix is folded into the anchor at parse time so that matching only ever
/// looks at the final name. `?` matches any single character and `*` any run
/// of characters; a pattern without wildcards matches by name equality.
pub struct SearchPattern {
    directory: UPath,
    matcher: Matcher,
}

enum Matcher {
    /// `*` — every name matches.
    All,
    Literal { name: String, ignore_case: bool },
    Wildcard(Regex),
}

impl SearchPattern {
    /// Splits `pattern` into its directory prefix and wildcard tail, joining
    /// the prefix onto `anchor`.
    ///
    /// `ignore_case` follows the case sensitivity of the backend the pattern
    /// will run against.
    pub fn parse(anchor: &UPath, pattern: &str, ignore_case: bool) -> FsResult<SearchPattern> {
        if pattern.is_empty() {
            return Err(FsError::InvalidArgument("the search pattern cannot be empty"));
        }
        let (prefix, tail) = match pattern.rfind(['/', '\\']) {
            Some(at) => (&pattern[..=at], &pattern[at + 1..]),
            None => ("", pattern),
        };
        if tail.is_empty() {
            return Err(FsError::InvalidArgument("the search pattern cannot end with a separator"));
        }
        let directory = if prefix.is_empty() { anchor.clone() } else { anchor.join(prefix)? };

        let matcher = if tail == "*" {
            Matcher::All
        } else if tail.contains(['*', '?']) {
            Matcher::Wildcard(compile_wildcard(tail, ignore_case)?)
        } else {
            Matcher::Literal { name: tail.to_string(), ignore_case }
        };
        Ok(SearchPattern { directory, matcher })
    }

    /// The directory the search starts from: the anchor joined with the
    /// pattern's literal prefix.
    pub fn directory(&self) -> &UPath {
        &self.directory
    }

    /// Whether a candidate name matches the wildcard tail.
    pub fn is_match(&self, name: &str) -> bool {
        match &self.matcher {
            Matcher::All => true,
            Matcher::Literal { name: expected, ignore_case: false } => name == expected,
            Matcher::Literal { name: expected, ignore_case: true } => {
                name.eq_ignore_ascii_case(expected)
            }
            Matcher::Wildcard(regex) => regex.is_match(name),
        }
    }
}

fn compile_wildcard(tail: &str, ignore_case: bool) -> FsResult<Regex> {
    let mut source = String::with_capacity(tail.len() + 8);
    if ignore_case {
        source.push_str("(?i)");
    }
    source.push('^');
    for ch in tail.chars() {
        match ch {
            '*' => source.push_str(".*"),
            '?' => source.push('.'),
            _ => source.push_str(&regex::escape(ch.encode_utf8(&mut [0u8; 4]))),
        }
    }
    source.push('$');
    Regex::new(&source)
        .map_err(|_| FsError::InvalidArgument("the search pattern is not a valid wildcard"))
}
