//! per-entry history attribution.
//!
//! for every entry in a directory, find the most recent ancestor commit
//! that last changed it. The trick: an entry's sha is stable across
//! commits that don't touch it, so we track each entry's sha down the
//! ancestry and the first ancestor whose tree disagrees (or lacks the
//! entry) marks the boundary - the *previously* attributed commit is the
//! answer. The walk deliberately looks one step too far to find it.
//!
//! cost is O(commits x path depth) sequential fetches. Objects are
//! immutable and content-addressed, so a read-through cache keyed by id
//! could be layered on top; none is built in.

use std::collections::HashSet;

use serde::Serialize;
use tracing::debug;

use crate::client::ObjectSource;
use crate::config::ParentSelection;
use crate::error::{StoreError, StoreResult};
use crate::object::{Commit, Object};
use crate::tree::tree_at;
use crate::types::{ObjectId, Signature, TreeEntry};

/// the slice of commit metadata an attribution carries - enough for a
/// directory listing to show "last changed by"
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommitAttribution {
    pub id: ObjectId,
    pub summary: String,
    pub committer: Option<Signature>,
}

impl CommitAttribution {
    fn of(commit: &Commit) -> Self {
        Self {
            id: commit.id.clone(),
            summary: commit.summary.clone(),
            committer: commit.committer.clone(),
        }
    }
}

/// one directory entry with the commit that last changed it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileHistoryEntry {
    pub entry: TreeEntry,
    pub commit: CommitAttribution,
    /// number of ancestor commits in which the entry was observed
    /// unchanged before the boundary was found
    pub observations: u32,
}

struct Pending {
    entry: TreeEntry,
    tracked: ObjectId,
    attribution: CommitAttribution,
    observations: u32,
}

impl Pending {
    fn finalize(self) -> FileHistoryEntry {
        FileHistoryEntry {
            entry: self.entry,
            commit: self.attribution,
            observations: self.observations,
        }
    }
}

fn fetch_commit(source: &mut dyn ObjectSource, id: &ObjectId) -> StoreResult<Commit> {
    match source.fetch(id)? {
        Object::Commit(commit) => Ok(commit),
        other => Err(StoreError::Format(format!(
            "object {} is a {}, expected commit",
            id,
            other.kind()
        ))),
    }
}

/// attribute every entry at `path` in `start`'s tree to the most recent
/// ancestor commit that last changed it.
///
/// Result is sorted directories-first, then by name ascending.
pub fn reconstruct(
    source: &mut dyn ObjectSource,
    start: &ObjectId,
    path: &str,
    policy: ParentSelection,
) -> StoreResult<Vec<FileHistoryEntry>> {
    let head = fetch_commit(source, start)?;
    let seed_tree = tree_at(source, start, path)?;

    let mut pending: Vec<Pending> = seed_tree
        .entries
        .into_iter()
        .map(|entry| Pending {
            tracked: entry.id.clone(),
            attribution: CommitAttribution::of(&head),
            observations: 0,
            entry,
        })
        .collect();
    let mut finalized: Vec<FileHistoryEntry> = Vec::new();

    let mut visited: HashSet<ObjectId> = HashSet::new();
    let mut commit = head;

    while !pending.is_empty() {
        if !visited.insert(commit.id.clone()) {
            // a repeated commit means the parent chain loops; objects are
            // content-addressed, so this store is handing out garbage
            return Err(StoreError::Integrity {
                start: start.to_string(),
                unresolved: pending.iter().map(|p| p.entry.name.clone()).collect(),
            });
        }

        let tree = match tree_at(source, &commit.id, path) {
            Ok(tree) => Some(tree),
            Err(e) if e.is_not_found() => None,
            Err(e) => return Err(e),
        };

        let mut still_pending = Vec::with_capacity(pending.len());
        for mut item in pending {
            let unchanged = tree
                .as_ref()
                .and_then(|t| t.entry(&item.entry.name))
                .map(|e| e.id == item.tracked)
                .unwrap_or(false);

            if unchanged {
                // the entry is identical in this older commit; its true
                // last-change boundary lies further back, so the
                // attribution trickles down
                item.attribution = CommitAttribution::of(&commit);
                item.observations += 1;
                still_pending.push(item);
            } else {
                // introduced or changed at the previously attributed
                // commit - that attribution is the answer
                finalized.push(item.finalize());
            }
        }
        pending = still_pending;

        let Some(parent_id) = commit.parent(policy).cloned() else {
            break;
        };
        commit = fetch_commit(source, &parent_id)?;
    }

    // ancestry exhausted: whatever is still tracked was introduced by the
    // oldest commit that contained it, which is its current attribution
    for item in pending {
        finalized.push(item.finalize());
    }

    debug!(
        start = %start.short(),
        path,
        entries = finalized.len(),
        "history reconstruction complete"
    );

    finalized.sort_by(|a, b| {
        b.entry
            .is_dir()
            .cmp(&a.entry.is_dir())
            .then_with(|| a.entry.name.cmp(&b.entry.name))
    });
    Ok(finalized)
}
