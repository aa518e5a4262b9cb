//! loose and packed reference resolution.
//!
//! a ref lives either as an individual file under `refs/<namespace>/` or
//! as a line in the flat `packed-refs` index. Both sides populate the
//! same name space; a loose ref shadows a packed one with the same name.
//! State is re-read from disk on every call - refs move, objects don't.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::{StoreError, StoreResult};
use crate::types::{ObjectId, RefNamespace};

/// resolves ref names against a git directory
#[derive(Debug, Clone)]
pub struct RefStore {
    git_dir: PathBuf,
}

impl RefStore {
    pub fn new(git_dir: impl Into<PathBuf>) -> Self {
        Self {
            git_dir: git_dir.into(),
        }
    }

    /// list all refs in a namespace, sorted by name ascending.
    ///
    /// Packed refs are collected first so loose refs overwrite them on
    /// name collision.
    pub fn list(&self, namespace: RefNamespace) -> StoreResult<BTreeMap<String, ObjectId>> {
        let mut refs = BTreeMap::new();
        self.collect_packed(namespace, &mut refs)?;
        self.collect_loose(namespace, &mut refs)?;
        Ok(refs)
    }

    /// look up a single ref without error control flow
    pub fn lookup(&self, name: &str, namespace: RefNamespace) -> StoreResult<Option<ObjectId>> {
        Ok(self.list(namespace)?.remove(name))
    }

    /// resolve a ref name to the id it points at
    pub fn resolve(&self, name: &str, namespace: RefNamespace) -> StoreResult<ObjectId> {
        self.lookup(name, namespace)?
            .ok_or_else(|| StoreError::RefNotFound(format!("{}/{}", namespace, name)))
    }

    fn collect_loose(
        &self,
        namespace: RefNamespace,
        out: &mut BTreeMap<String, ObjectId>,
    ) -> StoreResult<()> {
        let root = self.git_dir.join("refs").join(namespace.dir_name());
        if !root.is_dir() {
            return Ok(());
        }
        self.walk_loose(&root, "", out)
    }

    // loose refs nest: refs/heads/feature/x is the branch "feature/x"
    fn walk_loose(
        &self,
        dir: &Path,
        prefix: &str,
        out: &mut BTreeMap<String, ObjectId>,
    ) -> StoreResult<()> {
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                warn!(path = %entry.path().display(), "skipping non-UTF-8 ref name");
                continue;
            };
            let name = if prefix.is_empty() {
                file_name.to_string()
            } else {
                format!("{}/{}", prefix, file_name)
            };

            let path = entry.path();
            if path.is_dir() {
                self.walk_loose(&path, &name, out)?;
                continue;
            }

            let content = fs::read_to_string(&path)?;
            match ObjectId::from_hex(content.trim()) {
                Ok(id) => {
                    out.insert(name, id);
                }
                Err(_) => {
                    // lock files and symbolic refs land here; they are
                    // not direct refs and don't belong in the listing
                    warn!(path = %path.display(), "skipping loose ref without a valid id");
                }
            }
        }
        Ok(())
    }

    fn collect_packed(
        &self,
        namespace: RefNamespace,
        out: &mut BTreeMap<String, ObjectId>,
    ) -> StoreResult<()> {
        let path = self.git_dir.join("packed-refs");
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(StoreError::Io(e)),
        };

        for line in content.lines() {
            let line = line.trim();
            // '#' lines are comments, '^' lines carry peeled tag targets
            if line.is_empty() || line.starts_with('#') || line.starts_with('^') {
                continue;
            }
            let Some((sha, ref_path)) = line.split_once(' ') else {
                warn!(line, "skipping malformed packed-refs line");
                continue;
            };
            let Ok(id) = ObjectId::from_hex(sha.trim()) else {
                warn!(line, "skipping packed-refs line without a valid id");
                continue;
            };

            // ref path is "refs/<namespace>/<name...>"; the name is the
            // tail after the leading two segments
            let mut segments = ref_path.split('/');
            if segments.next() != Some("refs") {
                continue;
            }
            if segments.next() != Some(namespace.dir_name()) {
                continue;
            }
            let name = segments.collect::<Vec<_>>().join("/");
            if name.is_empty() {
                continue;
            }
            out.insert(name, id);
        }
        Ok(())
    }
}
