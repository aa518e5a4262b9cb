//! gitpeek - read-only Git plumbing for repository browsing.
//!
//! This crate reads a Git object store directly at the plumbing level: it
//! resolves refs, decodes raw objects over a persistent
//! `git cat-file --batch` channel, navigates trees by path, and
//! reconstructs - for every entry in a directory - the most recent
//! commit that last changed it.
//!
//! # Architecture
//!
//! ```text
//!  ┌──────────────────────────────────────────────────────┐
//!  │                     Repository                       │
//!  │   (branches, tags, trees, blobs, per-file history)   │
//!  └──────────────────────────────────────────────────────┘
//!            │               │                │
//!            ▼               ▼                ▼
//!      ┌──────────┐    ┌──────────┐    ┌───────────┐
//!      │   refs   │    │   tree   │    │  history  │
//!      │ (names)  │    │ (paths)  │    │  (walk)   │
//!      └──────────┘    └──────────┘    └───────────┘
//!                            │                │
//!                            ▼                ▼
//!                     ┌────────────────────────────┐
//!                     │     client + object        │
//!                     │ (batch channel + decoders) │
//!                     └────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use gitpeek::{RepoConfig, Repository};
//!
//! let repo = Repository::open(RepoConfig::new("/srv/project/.git"));
//! let head = repo.ref_to_id("main").unwrap();
//! for entry in repo.file_history(&head, "src").unwrap() {
//!     println!("{}  last changed by {}", entry.entry.name, entry.commit.summary);
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod history;
pub mod object;
pub mod refs;
pub mod repository;
pub mod tree;
pub mod types;

pub use client::{BatchClient, ObjectSource};
pub use config::{ParentSelection, RepoConfig};
pub use error::{StoreError, StoreResult};
pub use history::{CommitAttribution, FileHistoryEntry};
pub use object::{Blob, Commit, Object, ObjectKind, Tree};
pub use refs::RefStore;
pub use repository::Repository;
pub use types::{FileMode, ObjectId, RefNamespace, Signature, TreeEntry};
