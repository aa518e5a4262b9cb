//! core type-safe wrappers around git plumbing primitives.
//!
//! everything the rest of the crate passes around lives here: validated
//! object ids, ref namespaces, tree entry modes and author/committer
//! signatures. The inner representations stay private so a raw string
//! can't masquerade as an id.

use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// a 40-character lowercase hex content hash.
///
/// Identifies exactly one object forever - the store is content-addressed,
/// so two fetches of the same id always decode to the same object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ObjectId(String);

impl ObjectId {
    /// parse an ObjectId from a hex string, validating length and alphabet
    pub fn from_hex(hex: &str) -> StoreResult<Self> {
        if hex.len() != 40 || !hex.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return Err(StoreError::Format(format!(
                "invalid object id: {:?} (want 40 lowercase hex chars)",
                hex
            )));
        }
        Ok(Self(hex.to_string()))
    }

    /// render a binary 20-byte sha as an ObjectId
    pub fn from_raw(raw: &[u8; 20]) -> Self {
        Self(hex::encode(raw))
    }

    /// get the hex string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// short form of the id
    pub fn short(&self) -> &str {
        &self.0[..7]
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// the two ref namespaces we browse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefNamespace {
    Heads,
    Tags,
}

impl RefNamespace {
    /// on-disk directory name under `refs/`
    pub fn dir_name(&self) -> &'static str {
        match self {
            Self::Heads => "heads",
            Self::Tags => "tags",
        }
    }
}

impl fmt::Display for RefNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dir_name())
    }
}

/// the octal permission digits of a tree record.
///
/// git writes `40000` for directories (no leading zero in the raw record),
/// `100644`/`100755` for files, `120000` for symlinks, `160000` for
/// submodule links. We keep the digits as-is and derive directory-ness.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FileMode(String);

impl FileMode {
    pub fn new(digits: impl Into<String>) -> Self {
        Self(digits.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// whether this mode marks a subtree (directory)
    pub fn is_dir(&self) -> bool {
        self.0 == "40000" || self.0 == "040000"
    }
}

impl fmt::Display for FileMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// one record of a tree object: mode, name and the id it points at.
///
/// Entry names are unique within one tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeEntry {
    pub mode: FileMode,
    pub name: String,
    pub id: ObjectId,
}

impl TreeEntry {
    pub fn is_dir(&self) -> bool {
        self.mode.is_dir()
    }
}

/// parsed author/committer line from a commit header.
///
/// git writes `Name <email> <epoch-seconds> <tz-offset>`. Parsing is
/// lenient: a line that doesn't follow the shape keeps its text as the
/// name and leaves email empty and the timestamp unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Signature {
    pub name: String,
    pub email: String,
    pub timestamp: Option<DateTime<Utc>>,
}

impl Signature {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if let Some(open) = line.find('<') {
            if let Some(close) = line[open..].find('>').map(|i| open + i) {
                let name = line[..open].trim().to_string();
                let email = line[open + 1..close].to_string();
                let timestamp = line[close + 1..]
                    .split_whitespace()
                    .next()
                    .and_then(|s| s.parse::<i64>().ok())
                    .and_then(|secs| Utc.timestamp_opt(secs, 0).single());
                return Self {
                    name,
                    email,
                    timestamp,
                };
            }
        }
        Self {
            name: line.to_string(),
            email: String::new(),
            timestamp: None,
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.email.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{} <{}>", self.name, self.email)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_id_valid() {
        let id = ObjectId::from_hex("0123456789abcdef0123456789abcdef01234567").unwrap();
        assert_eq!(id.as_str().len(), 40);
        assert_eq!(id.short(), "0123456");
    }

    #[test]
    fn test_object_id_invalid() {
        assert!(ObjectId::from_hex("").is_err());
        assert!(ObjectId::from_hex("abc").is_err()); // too short
        assert!(ObjectId::from_hex(&"g".repeat(40)).is_err()); // not hex
        assert!(ObjectId::from_hex(&"A".repeat(40)).is_err()); // uppercase
    }

    #[test]
    fn test_object_id_from_raw() {
        let raw = [0xabu8; 20];
        let id = ObjectId::from_raw(&raw);
        assert_eq!(id.as_str(), "ab".repeat(20));
    }

    #[test]
    fn test_file_mode_dir_detection() {
        assert!(FileMode::new("40000".to_string()).is_dir());
        assert!(FileMode::new("040000".to_string()).is_dir());
        assert!(!FileMode::new("100644".to_string()).is_dir());
        assert!(!FileMode::new("100755".to_string()).is_dir());
        assert!(!FileMode::new("120000".to_string()).is_dir());
    }

    #[test]
    fn test_signature_parse_full() {
        let sig = Signature::parse("Jane Doe <jane@example.com> 1700000000 +0100");
        assert_eq!(sig.name, "Jane Doe");
        assert_eq!(sig.email, "jane@example.com");
        let ts = sig.timestamp.unwrap();
        assert_eq!(ts.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_signature_parse_lenient() {
        let sig = Signature::parse("not a real signature");
        assert_eq!(sig.name, "not a real signature");
        assert!(sig.email.is_empty());
        assert!(sig.timestamp.is_none());
    }

    #[test]
    fn test_ref_namespace_names() {
        assert_eq!(RefNamespace::Heads.dir_name(), "heads");
        assert_eq!(RefNamespace::Tags.to_string(), "tags");
    }
}
