//! Signature and structure hashing for extracted entities.
//!
//! Both hashes are 12-hex-digit prefixes of a SHA-256 over the entity's
//! canonical text. The structure hash first replaces every occurrence of
//! the entity's own defined name with a sentinel, so rename-only edits
//! keep it stable.

use sha2::{Digest, Sha256};

/// Sentinel substituted for the defined name in structure hashing.
pub const STRUCTURE_SENTINEL: &str = "___";

/// Hex-digit prefix length for entity hashes.
pub const HASH_LEN: usize = 12;

/// SHA-256 of `text`, truncated to `len` hex chars.
pub fn short_hash_len(text: &str, len: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let mut hex = format!("{:x}", hasher.finalize());
    hex.truncate(len);
    hex
}

/// SHA-256 of `text`, truncated to the entity hash length.
pub fn short_hash(text: &str) -> String {
    short_hash_len(text, HASH_LEN)
}

/// Canonical form of entity text: trailing whitespace trimmed per line,
/// internal whitespace preserved.
pub fn canonical_text(text: &str) -> String {
    text.lines()
        .map(|line| line.trim_end())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Hash of the canonical entity text; detects any change to the definition.
pub fn signature_hash(text: &str) -> String {
    short_hash(&canonical_text(text))
}

/// Hash of the canonical entity text with the defined name blanked out;
/// survives rename-only edits.
pub fn structure_hash(text: &str, name: &str) -> String {
    let nameless = canonical_text(text).replace(name, STRUCTURE_SENTINEL);
    short_hash(&nameless)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_hash_is_twelve_hex_chars() {
        let h = short_hash("fn main() {}");
        assert_eq!(h.len(), 12);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn trailing_whitespace_does_not_change_signature() {
        let a = signature_hash("def foo():\n    return 1");
        let b = signature_hash("def foo():   \n    return 1  ");
        assert_eq!(a, b);
    }

    #[test]
    fn body_change_changes_signature() {
        let a = signature_hash("def foo():\n    return 1");
        let b = signature_hash("def foo():\n    return 2");
        assert_ne!(a, b);
    }

    #[test]
    fn rename_preserves_structure_hash() {
        let a = structure_hash("def foo():\n    return foo_helper()", "foo");
        let b = structure_hash("def baz():\n    return baz_helper()", "baz");
        // Every occurrence of the name is replaced, including as a prefix
        // of derived identifiers.
        assert_eq!(a, b);
    }

    #[test]
    fn rename_changes_signature_hash() {
        let a = signature_hash("def foo():\n    return 1");
        let b = signature_hash("def baz():\n    return 1");
        assert_ne!(a, b);
    }

    #[test]
    fn structure_hash_detects_body_change() {
        let a = structure_hash("def foo():\n    return 1", "foo");
        let b = structure_hash("def foo():\n    return 2", "foo");
        assert_ne!(a, b);
    }
}
