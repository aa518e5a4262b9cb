//! high-level repository facade.
//!
//! This is the surface the web layer consumes: branch/tag listings, ref
//! resolution, tree and blob lookups, and per-entry history. It wraps
//! the half-duplex batch channel in a mutex so any number of logical
//! callers can share one channel without interleaving requests.
//!
//! Clone this to share across threads - it uses Arc internally.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::client::BatchClient;
use crate::config::RepoConfig;
use crate::error::{StoreError, StoreResult};
use crate::history::{self, FileHistoryEntry};
use crate::object::{Blob, Object, Tree};
use crate::refs::RefStore;
use crate::tree;
use crate::types::{ObjectId, RefNamespace, TreeEntry};

#[derive(Clone)]
pub struct Repository {
    inner: Arc<RepositoryInner>,
}

struct RepositoryInner {
    config: RepoConfig,
    client: Mutex<BatchClient>,
    refs: RefStore,
}

impl Repository {
    /// set up a repository handle. The batch channel starts lazily on the
    /// first object fetch, so this never fails.
    pub fn open(config: RepoConfig) -> Self {
        let client = BatchClient::new(config.clone());
        let refs = RefStore::new(config.git_dir.clone());
        Self {
            inner: Arc::new(RepositoryInner {
                config,
                client: Mutex::new(client),
                refs,
            }),
        }
    }

    pub fn config(&self) -> &RepoConfig {
        &self.inner.config
    }

    // ==================== Refs ====================

    /// all branches, sorted by name: branch name -> commit id
    pub fn branches(&self) -> StoreResult<BTreeMap<String, ObjectId>> {
        self.inner.refs.list(RefNamespace::Heads)
    }

    /// all tags, sorted by name: tag name -> id
    pub fn tags(&self) -> StoreResult<BTreeMap<String, ObjectId>> {
        self.inner.refs.list(RefNamespace::Tags)
    }

    /// resolve a branch name to the commit id it points at
    pub fn ref_to_id(&self, name: &str) -> StoreResult<ObjectId> {
        self.resolve_ref(name, RefNamespace::Heads)
    }

    /// resolve a ref name in an explicit namespace
    pub fn resolve_ref(&self, name: &str, namespace: RefNamespace) -> StoreResult<ObjectId> {
        self.inner.refs.resolve(name, namespace)
    }

    // ==================== Objects ====================

    /// fetch any object by id
    pub fn object(&self, id: &ObjectId) -> StoreResult<Object> {
        self.inner.client.lock().fetch(id)
    }

    /// resolve the tree at `path` below a commit or tree id
    pub fn tree_at(&self, start: &ObjectId, path: &str) -> StoreResult<Tree> {
        let mut client = self.inner.client.lock();
        tree::tree_at(&mut *client, start, path)
    }

    /// resolve the tree at `path` below a branch tip
    pub fn tree_at_ref(&self, branch: &str, path: &str) -> StoreResult<Tree> {
        let id = self.ref_to_id(branch)?;
        self.tree_at(&id, path)
    }

    /// resolve the entry named by `path`
    pub fn entry_at(&self, start: &ObjectId, path: &str) -> StoreResult<TreeEntry> {
        let mut client = self.inner.client.lock();
        tree::entry_at(&mut *client, start, path)
    }

    /// check whether `path` exists below a commit or tree id
    pub fn exists(&self, start: &ObjectId, path: &str) -> StoreResult<bool> {
        let mut client = self.inner.client.lock();
        tree::exists(&mut *client, start, path)
    }

    /// fetch the blob content of the file at `path`
    pub fn content_at(&self, start: &ObjectId, path: &str) -> StoreResult<Blob> {
        let mut client = self.inner.client.lock();
        let entry = tree::entry_at(&mut *client, start, path)?;
        match client.fetch(&entry.id)? {
            Object::Blob(blob) => Ok(blob),
            other => Err(StoreError::Format(format!(
                "'{}' resolves to {} which is a {}, expected blob",
                path,
                other.id(),
                other.kind()
            ))),
        }
    }

    // ==================== History ====================

    /// attribute every entry at `path` in `start`'s tree to the commit
    /// that last changed it, using the configured parent policy
    pub fn file_history(&self, start: &ObjectId, path: &str) -> StoreResult<Vec<FileHistoryEntry>> {
        let mut client = self.inner.client.lock();
        history::reconstruct(&mut *client, start, path, self.inner.config.parent_selection)
    }

    /// release the batch channel. The next fetch reopens it; dropping the
    /// last handle also releases it.
    pub fn close(&self) {
        self.inner.client.lock().close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    // ref operations never touch the batch channel, so they work against
    // a plain directory with no git binary involved
    #[test]
    fn test_ref_surface_without_channel() {
        let dir = TempDir::new().unwrap();
        let heads = dir.path().join("refs").join("heads");
        fs::create_dir_all(&heads).unwrap();
        fs::write(heads.join("main"), format!("{}\n", "ab".repeat(20))).unwrap();
        fs::write(
            dir.path().join("packed-refs"),
            format!("{} refs/tags/v1\n", "cd".repeat(20)),
        )
        .unwrap();

        let repo = Repository::open(RepoConfig::new(dir.path()));

        let branches = repo.branches().unwrap();
        assert_eq!(branches.len(), 1);
        assert_eq!(
            repo.ref_to_id("main").unwrap().as_str(),
            "ab".repeat(20).as_str()
        );

        let tags = repo.tags().unwrap();
        assert!(tags.contains_key("v1"));

        let err = repo.ref_to_id("missing").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_clone_shares_state() {
        let dir = TempDir::new().unwrap();
        let repo = Repository::open(RepoConfig::new(dir.path()));
        let other = repo.clone();
        assert_eq!(repo.config().git_dir, other.config().git_dir);
        repo.close();
        other.close();
    }
}
