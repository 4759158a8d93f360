use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::branch::{BranchName, CommitSignature, HeadRef};

#[derive(Debug, Error)]
pub enum VcsError {
    #[error("branch {0} does not exist")]
    BranchNotFound(String),
    #[error("failed to check out {branch}: {stderr}")]
    Checkout { branch: String, stderr: String },
    #[error("`git {command}` failed: {stderr}")]
    Command { command: String, stderr: String },
    #[error("failed to run git: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("unexpected git output: {0}")]
    Parse(String),
}

pub type VcsResult<T> = Result<T, VcsError>;

#[async_trait]
pub trait VersionControlService: Send + Sync {
    async fn head(&self) -> VcsResult<HeadRef>;
    /// Messages of up to `max_depth` commits reachable from HEAD, newest first.
    async fn recent_commit_messages(&self, max_depth: usize) -> VcsResult<Vec<String>>;
    /// Switches to an existing local branch; `BranchNotFound` when it is absent.
    async fn checkout_branch(&self, branch: &BranchName) -> VcsResult<()>;
    /// Creates a branch at the current HEAD without switching to it.
    async fn create_branch(&self, branch: &BranchName) -> VcsResult<()>;
    /// Records a commit with no tree changes and returns its id.
    async fn commit_empty(&self, message: &str, signature: &CommitSignature) -> VcsResult<String>;
    async fn push(&self, remote: &str, refspec: &str) -> VcsResult<()>;
    async fn list_working_tree_files(&self) -> VcsResult<Vec<PathBuf>>;
    async fn remote_url(&self, remote: &str) -> VcsResult<String>;
    async fn committer_identity(&self) -> VcsResult<CommitSignature>;
}
