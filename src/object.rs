//! decoded object variants and their payload decoders.
//!
//! the batch channel hands us `(id, type, payload)` triples; this module
//! turns the payload into a typed object. Decoders are pure functions -
//! no I/O, no state - so they are easy to test against crafted payloads.
//!
//! tree payloads are binary (names terminated by NUL, shas as raw bytes),
//! so the tree decoder is an explicit byte cursor rather than anything
//! regex-shaped.

use crate::config::ParentSelection;
use crate::error::{StoreError, StoreResult};
use crate::types::{FileMode, ObjectId, Signature, TreeEntry};

/// the kind tag announced by the channel header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Blob,
    Tree,
    Commit,
}

impl ObjectKind {
    /// parse the type token from a response header
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "blob" => Some(Self::Blob),
            "tree" => Some(Self::Tree),
            "commit" => Some(Self::Commit),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blob => "blob",
            Self::Tree => "tree",
            Self::Commit => "commit",
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// a decoded object. Consumers match exhaustively; there is no catch-all
/// kind, so an unhandled variant is a compile error.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Blob(Blob),
    Tree(Tree),
    Commit(Commit),
}

impl Object {
    pub fn id(&self) -> &ObjectId {
        match self {
            Self::Blob(b) => &b.id,
            Self::Tree(t) => &t.id,
            Self::Commit(c) => &c.id,
        }
    }

    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::Blob(_) => ObjectKind::Blob,
            Self::Tree(_) => ObjectKind::Tree,
            Self::Commit(_) => ObjectKind::Commit,
        }
    }
}

/// raw file content
#[derive(Debug, Clone, PartialEq)]
pub struct Blob {
    pub id: ObjectId,
    pub bytes: Vec<u8>,
}

impl Blob {
    /// view the content as text, if it is valid UTF-8
    pub fn as_text(&self) -> Option<&str> {
        std::str::from_utf8(&self.bytes).ok()
    }
}

/// an ordered sequence of named entries
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    pub id: ObjectId,
    pub entries: Vec<TreeEntry>,
}

impl Tree {
    /// look up an entry by name without error control flow
    pub fn entry(&self, name: &str) -> Option<&TreeEntry> {
        self.entries.iter().find(|e| e.name == name)
    }
}

/// a snapshot pointer with parent linkage and log message.
///
/// All `parent` headers are retained in the order they appear; which one
/// the ancestry walk follows is decided by [`ParentSelection`], not here.
#[derive(Debug, Clone, PartialEq)]
pub struct Commit {
    pub id: ObjectId,
    pub tree: ObjectId,
    pub parents: Vec<ObjectId>,
    pub author: Option<Signature>,
    pub committer: Option<Signature>,
    /// first line of the log message
    pub summary: String,
    /// everything after the first line ("" if absent)
    pub body: String,
}

impl Commit {
    /// the parent the walk should follow under the given policy
    pub fn parent(&self, policy: ParentSelection) -> Option<&ObjectId> {
        match policy {
            ParentSelection::FirstListed => self.parents.first(),
            ParentSelection::LastListed => self.parents.last(),
        }
    }

    /// check if this is a merge commit (more than one parent header)
    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }
}

/// wrap a blob payload as-is
pub fn decode_blob(id: ObjectId, payload: Vec<u8>) -> Blob {
    Blob { id, bytes: payload }
}

/// decode a tree payload: a concatenation of records, each being octal
/// mode digits, one space, the entry name, one NUL byte, and 20 raw bytes
/// of binary sha.
pub fn decode_tree(id: ObjectId, payload: &[u8]) -> StoreResult<Tree> {
    let mut entries = Vec::new();
    let mut cursor = payload;

    while !cursor.is_empty() {
        let space = cursor.iter().position(|&b| b == b' ').ok_or_else(|| {
            StoreError::Format(format!("tree {}: record without mode/name separator", id))
        })?;
        let mode_digits = &cursor[..space];
        if mode_digits.is_empty() || !mode_digits.iter().all(|b| (b'0'..=b'7').contains(b)) {
            return Err(StoreError::Format(format!(
                "tree {}: invalid mode {:?}",
                id,
                String::from_utf8_lossy(mode_digits)
            )));
        }
        // mode digits are all ASCII octal at this point
        let mode = FileMode::new(String::from_utf8_lossy(mode_digits).into_owned());
        cursor = &cursor[space + 1..];

        let nul = cursor.iter().position(|&b| b == 0).ok_or_else(|| {
            StoreError::Format(format!("tree {}: entry name not NUL-terminated", id))
        })?;
        let name = std::str::from_utf8(&cursor[..nul])
            .map_err(|_| StoreError::Format(format!("tree {}: entry name is not UTF-8", id)))?
            .to_string();
        if name.is_empty() {
            return Err(StoreError::Format(format!("tree {}: empty entry name", id)));
        }
        cursor = &cursor[nul + 1..];

        if cursor.len() < 20 {
            return Err(StoreError::Format(format!(
                "tree {}: truncated sha for entry '{}' ({} of 20 bytes)",
                id,
                name,
                cursor.len()
            )));
        }
        let mut raw = [0u8; 20];
        raw.copy_from_slice(&cursor[..20]);
        cursor = &cursor[20..];

        entries.push(TreeEntry {
            mode,
            name,
            id: ObjectId::from_raw(&raw),
        });
    }

    Ok(Tree { id, entries })
}

/// decode a commit payload: `"<key> <value>"` header lines up to the first
/// blank line, then the log message. Unrecognized keys are ignored, as are
/// continuation lines of multi-line headers (gpgsig and friends).
pub fn decode_commit(id: ObjectId, payload: &[u8]) -> StoreResult<Commit> {
    let text = String::from_utf8_lossy(payload);
    let mut rest: &str = &text;

    let mut tree = None;
    let mut parents = Vec::new();
    let mut author = None;
    let mut committer = None;

    while !rest.is_empty() {
        let (line, remainder) = rest.split_once('\n').unwrap_or((rest, ""));
        rest = remainder;

        if line.is_empty() {
            break;
        }

        let Some((key, value)) = line.split_once(' ') else {
            continue;
        };
        match key {
            "tree" => tree = Some(ObjectId::from_hex(value)?),
            "parent" => parents.push(ObjectId::from_hex(value)?),
            "author" => author = Some(Signature::parse(value)),
            "committer" => committer = Some(Signature::parse(value)),
            _ => {}
        }
    }

    let tree = tree
        .ok_or_else(|| StoreError::Format(format!("commit {}: missing tree header", id)))?;

    let (summary, body) = match rest.split_once('\n') {
        Some((first, remainder)) => (first.to_string(), remainder.to_string()),
        None => (rest.to_string(), String::new()),
    };

    Ok(Commit {
        id,
        tree,
        parents,
        author,
        committer,
        summary,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oid(n: u8) -> ObjectId {
        ObjectId::from_raw(&[n; 20])
    }

    fn tree_record(mode: &str, name: &str, sha: u8) -> Vec<u8> {
        let mut record = Vec::new();
        record.extend_from_slice(mode.as_bytes());
        record.push(b' ');
        record.extend_from_slice(name.as_bytes());
        record.push(0);
        record.extend_from_slice(&[sha; 20]);
        record
    }

    #[test]
    fn test_decode_blob_is_opaque() {
        let blob = decode_blob(oid(1), vec![0xff, 0xfe, 0x00, 0x41]);
        assert_eq!(blob.bytes, vec![0xff, 0xfe, 0x00, 0x41]);
        assert!(blob.as_text().is_none());
    }

    #[test]
    fn test_decode_blob_text() {
        let blob = decode_blob(oid(1), b"fn main() {}".to_vec());
        assert_eq!(blob.as_text(), Some("fn main() {}"));
    }

    #[test]
    fn test_decode_tree_records() {
        let mut payload = Vec::new();
        payload.extend(tree_record("100644", "a.txt", 0x11));
        payload.extend(tree_record("40000", "src", 0x22));
        payload.extend(tree_record("100755", "run.sh", 0x33));

        let tree = decode_tree(oid(9), &payload).unwrap();
        assert_eq!(tree.entries.len(), 3);

        let a = tree.entry("a.txt").unwrap();
        assert_eq!(a.id.as_str(), "11".repeat(20));
        assert_eq!(a.id.as_str().len(), 40);
        assert!(!a.is_dir());

        let src = tree.entry("src").unwrap();
        assert!(src.is_dir());

        assert!(tree.entry("missing").is_none());
    }

    #[test]
    fn test_decode_tree_empty_payload() {
        let tree = decode_tree(oid(9), &[]).unwrap();
        assert!(tree.entries.is_empty());
    }

    #[test]
    fn test_decode_tree_truncated_sha() {
        let mut payload = tree_record("100644", "a.txt", 0x11);
        payload.extend(b"100644 b.txt\0short");
        let err = decode_tree(oid(9), &payload).unwrap_err();
        assert!(matches!(err, StoreError::Format(_)));
    }

    #[test]
    fn test_decode_tree_garbage_mode() {
        let payload = b"notoctal name\0".to_vec();
        let err = decode_tree(oid(9), &payload).unwrap_err();
        assert!(matches!(err, StoreError::Format(_)));
    }

    #[test]
    fn test_decode_tree_missing_nul() {
        let payload = b"100644 unterminated".to_vec();
        let err = decode_tree(oid(9), &payload).unwrap_err();
        assert!(matches!(err, StoreError::Format(_)));
    }

    #[test]
    fn test_decode_commit_full() {
        let payload = format!(
            "tree {}\nparent {}\nauthor A <a@x> 1700000000 +0000\ncommitter B <b@x> 1700000100 +0000\n\nAdd feature\n\nLonger description\nover two lines\n",
            oid(1),
            oid(2),
        );
        let commit = decode_commit(oid(3), payload.as_bytes()).unwrap();
        assert_eq!(commit.tree, oid(1));
        assert_eq!(commit.parents, vec![oid(2)]);
        assert_eq!(commit.summary, "Add feature");
        assert_eq!(commit.body, "\nLonger description\nover two lines\n");
        assert_eq!(commit.author.as_ref().unwrap().name, "A");
        assert_eq!(commit.committer.as_ref().unwrap().email, "b@x");
        assert!(!commit.is_merge());
    }

    #[test]
    fn test_decode_commit_root_no_parent_no_body() {
        let payload = format!("tree {}\n\nInitial import", oid(1));
        let commit = decode_commit(oid(3), payload.as_bytes()).unwrap();
        assert!(commit.parents.is_empty());
        assert_eq!(commit.summary, "Initial import");
        assert_eq!(commit.body, "");
        assert_eq!(commit.parent(ParentSelection::LastListed), None);
    }

    #[test]
    fn test_decode_commit_merge_parent_policy() {
        let payload = format!(
            "tree {}\nparent {}\nparent {}\n\nMerge branch\n",
            oid(1),
            oid(2),
            oid(4),
        );
        let commit = decode_commit(oid(3), payload.as_bytes()).unwrap();
        assert!(commit.is_merge());
        assert_eq!(commit.parent(ParentSelection::FirstListed), Some(&oid(2)));
        assert_eq!(commit.parent(ParentSelection::LastListed), Some(&oid(4)));
    }

    #[test]
    fn test_decode_commit_ignores_unknown_headers() {
        let payload = format!(
            "tree {}\nencoding UTF-8\ngpgsig -----BEGIN-----\n abcdef\n -----END-----\n\nSigned\n",
            oid(1),
        );
        let commit = decode_commit(oid(3), payload.as_bytes()).unwrap();
        assert_eq!(commit.summary, "Signed");
    }

    #[test]
    fn test_decode_commit_missing_tree() {
        let payload = b"author A <a@x> 1 +0000\n\nno tree".to_vec();
        let err = decode_commit(oid(3), &payload).unwrap_err();
        assert!(matches!(err, StoreError::Format(_)));
    }

    #[test]
    fn test_decode_determinism() {
        let mut payload = Vec::new();
        payload.extend(tree_record("100644", "a.txt", 0x11));
        let first = decode_tree(oid(9), &payload).unwrap();
        let second = decode_tree(oid(9), &payload).unwrap();
        assert_eq!(first, second);
    }
}
