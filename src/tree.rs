//! path navigation through tree hierarchies.
//!
//! resolves `"src/foo/bar"`-style paths against a starting commit or tree
//! id. Runs over [`ObjectSource`] so callers choose where objects come
//! from (the live batch channel, or an in-memory double in tests).

use crate::client::ObjectSource;
use crate::error::{StoreError, StoreResult};
use crate::object::{Object, Tree};
use crate::types::{ObjectId, TreeEntry};

fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

/// fetch the root tree for a starting id: a tree id is used directly, a
/// commit id is dereferenced to its tree
fn root_tree(source: &mut dyn ObjectSource, start: &ObjectId) -> StoreResult<Tree> {
    match source.fetch(start)? {
        Object::Tree(tree) => Ok(tree),
        Object::Commit(commit) => match source.fetch(&commit.tree)? {
            Object::Tree(tree) => Ok(tree),
            other => Err(StoreError::Format(format!(
                "commit {} points at {} which is a {}, expected tree",
                start,
                other.id(),
                other.kind()
            ))),
        },
        Object::Blob(blob) => Err(StoreError::Format(format!(
            "object {} is a blob, expected tree or commit",
            blob.id
        ))),
    }
}

/// resolve the tree at `path` below `start` (a commit or tree id).
///
/// An empty path (or one made only of slashes) returns the root tree.
/// A missing segment, or a non-directory entry where more segments
/// follow, is a not-found error - never an empty default tree.
pub fn tree_at(source: &mut dyn ObjectSource, start: &ObjectId, path: &str) -> StoreResult<Tree> {
    let mut tree = root_tree(source, start)?;
    let segments = segments(path);

    for (depth, segment) in segments.iter().enumerate() {
        let not_found = || StoreError::PathNotFound {
            start: start.to_string(),
            path: segments[..=depth].join("/"),
        };

        let entry = tree.entry(segment).ok_or_else(not_found)?;
        if !entry.is_dir() {
            return Err(not_found());
        }
        let child_id = entry.id.clone();

        tree = match source.fetch(&child_id)? {
            Object::Tree(tree) => tree,
            _ => return Err(not_found()),
        };
    }

    Ok(tree)
}

/// resolve the entry named by the last path segment, navigating through
/// its parent directories first
pub fn entry_at(
    source: &mut dyn ObjectSource,
    start: &ObjectId,
    path: &str,
) -> StoreResult<TreeEntry> {
    let segments = segments(path);
    let Some((name, parents)) = segments.split_last() else {
        return Err(StoreError::EntryNotFound {
            tree: start.to_string(),
            name: String::new(),
        });
    };

    let tree = tree_at(source, start, &parents.join("/"))?;
    tree.entry(name)
        .cloned()
        .ok_or_else(|| StoreError::EntryNotFound {
            tree: tree.id.to_string(),
            name: name.to_string(),
        })
}

/// existence check built on the not-found classification; other errors
/// still propagate
pub fn exists(source: &mut dyn ObjectSource, start: &ObjectId, path: &str) -> StoreResult<bool> {
    match entry_at(source, start, path) {
        Ok(_) => Ok(true),
        Err(e) if e.is_not_found() => Ok(false),
        Err(e) => Err(e),
    }
}
