//! repository configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// how the ancestry walk picks a parent from a merge commit.
///
/// A commit header may carry several `parent` lines. The walk follows
/// exactly one of them; which one is a policy choice, not something we
/// decide silently. `LastListed` matches the behavior this crate
/// replaces, `FirstListed` gives conventional first-parent history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParentSelection {
    FirstListed,
    #[default]
    LastListed,
}

/// configuration for opening a repository
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoConfig {
    /// path to the `.git` directory (or a bare repository)
    pub git_dir: PathBuf,
    /// the git executable used for the batch channel
    pub git_binary: PathBuf,
    /// parent policy for the history walk
    pub parent_selection: ParentSelection,
}

impl RepoConfig {
    /// create a config for the given git dir with default settings
    pub fn new(git_dir: impl Into<PathBuf>) -> Self {
        Self {
            git_dir: git_dir.into(),
            git_binary: PathBuf::from("git"),
            parent_selection: ParentSelection::default(),
        }
    }

    /// override the git executable
    pub fn with_git_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.git_binary = binary.into();
        self
    }

    /// override the parent selection policy
    pub fn with_parent_selection(mut self, policy: ParentSelection) -> Self {
        self.parent_selection = policy;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RepoConfig::new("/tmp/repo/.git");
        assert_eq!(config.git_binary, PathBuf::from("git"));
        assert_eq!(config.parent_selection, ParentSelection::LastListed);
    }

    #[test]
    fn test_builders() {
        let config = RepoConfig::new("/tmp/repo/.git")
            .with_git_binary("/usr/local/bin/git")
            .with_parent_selection(ParentSelection::FirstListed);
        assert_eq!(config.git_binary, PathBuf::from("/usr/local/bin/git"));
        assert_eq!(config.parent_selection, ParentSelection::FirstListed);
    }
}
