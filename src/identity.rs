//! Deduplication keys for scraped comments.
//!
//! Comment nodes carry no stable platform identifier, so a comment is
//! identified by a prefix of its author name plus a prefix of its text.
//! Two different comments whose author and text share those prefixes
//! collapse to one key; that collision is accepted.

use std::fmt;

const AUTHOR_PREFIX_CHARS: usize = 15;
const TEXT_PREFIX_CHARS: usize = 20;
const SEPARATOR: char = '_';

/// Lossy fingerprint of a comment. Only used for set membership.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommentKey(String);

impl CommentKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// First 15 characters of `author`, `_`, first 20 characters of `text`.
/// Exact and case-sensitive; counts Unicode scalar values, not bytes.
pub fn identity_key(author: &str, text: &str) -> CommentKey {
    let mut key = String::with_capacity(author.len().min(64) + text.len().min(96) + 1);
    key.extend(author.chars().take(AUTHOR_PREFIX_CHARS));
    key.push(SEPARATOR);
    key.extend(text.chars().take(TEXT_PREFIX_CHARS));
    CommentKey(key)
}
