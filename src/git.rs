//! Git backend for the markdown store
//!
//! Every write to the roster becomes one commit, so the repository history
//! is the audit log of who was added, changed, or removed.

use git2::{Repository as Git2Repo, Signature};
use std::path::Path;

use crate::error::Result;

const SIGNATURE_NAME: &str = "roster";
const SIGNATURE_EMAIL: &str = "roster@local";

/// Git repository wrapper
pub struct Repository {
    inner: Git2Repo,
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("path", &self.inner.path())
            .finish()
    }
}

impl Repository {
    /// Open an existing repository or initialize a new one
    pub fn open_or_init(path: &Path) -> Result<Self> {
        let inner = match Git2Repo::open(path) {
            Ok(repo) => repo,
            Err(_) => {
                let repo = Git2Repo::init(path)?;
                Self::create_initial_commit(&repo)?;
                tracing::info!("Initialized roster repository at {:?}", path);
                repo
            }
        };

        Ok(Self { inner })
    }

    /// Create the initial commit for a new repository
    fn create_initial_commit(repo: &Git2Repo) -> Result<()> {
        let sig = Signature::now(SIGNATURE_NAME, SIGNATURE_EMAIL)?;
        let tree_id = repo.index()?.write_tree()?;
        let tree = repo.find_tree(tree_id)?;

        repo.commit(Some("HEAD"), &sig, &sig, "Initialize roster", &tree, &[])?;

        Ok(())
    }

    /// Commit current changes with a message
    pub fn commit(&self, message: &str) -> Result<git2::Oid> {
        let sig = self.signature()?;
        let mut index = self.inner.index()?;

        // Stage additions, modifications, and deletions alike
        index.add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)?;
        index.update_all(["*"].iter(), None)?;
        index.write()?;

        let tree_id = index.write_tree()?;
        let tree = self.inner.find_tree(tree_id)?;

        let parent = self.inner.head()?.peel_to_commit()?;

        let oid = self
            .inner
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &[&parent])?;

        tracing::debug!("Committed {}: {}", oid, message);
        Ok(oid)
    }

    /// Summary line of the HEAD commit
    pub fn head_message(&self) -> Result<String> {
        let commit = self.inner.head()?.peel_to_commit()?;
        Ok(commit.summary().unwrap_or_default().to_string())
    }

    /// Number of commits reachable from HEAD
    pub fn commit_count(&self) -> Result<usize> {
        let mut walk = self.inner.revwalk()?;
        walk.push_head()?;
        Ok(walk.count())
    }

    /// Check if there are uncommitted changes
    pub fn has_changes(&self) -> Result<bool> {
        let statuses = self.inner.statuses(None)?;
        Ok(!statuses.is_empty())
    }

    /// Get a signature for commits
    fn signature(&self) -> Result<Signature<'_>> {
        // Try to get from git config, fall back to defaults
        self.inner
            .signature()
            .or_else(|_| Signature::now(SIGNATURE_NAME, SIGNATURE_EMAIL))
            .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_repository() {
        let tmp = TempDir::new().unwrap();
        let repo = Repository::open_or_init(tmp.path()).unwrap();

        assert_eq!(repo.head_message().unwrap(), "Initialize roster");
        assert_eq!(repo.commit_count().unwrap(), 1);
    }

    #[test]
    fn test_commit_and_reopen() {
        let tmp = TempDir::new().unwrap();
        let repo = Repository::open_or_init(tmp.path()).unwrap();

        std::fs::write(tmp.path().join("student.md"), "---\nname: Lin\n---\n").unwrap();
        assert!(repo.has_changes().unwrap());

        let oid = repo.commit("INSERT into students: abc").unwrap();
        assert!(!oid.is_zero());
        assert!(!repo.has_changes().unwrap());

        let reopened = Repository::open_or_init(tmp.path()).unwrap();
        assert_eq!(reopened.commit_count().unwrap(), 2);
        assert_eq!(reopened.head_message().unwrap(), "INSERT into students: abc");
    }

    #[test]
    fn test_commit_records_deletions() {
        let tmp = TempDir::new().unwrap();
        let repo = Repository::open_or_init(tmp.path()).unwrap();
        let file = tmp.path().join("student.md");

        std::fs::write(&file, "x").unwrap();
        repo.commit("add").unwrap();
        std::fs::remove_file(&file).unwrap();
        repo.commit("remove").unwrap();

        assert!(!repo.has_changes().unwrap());
    }
}
