use tracing::{debug, info};

use crate::domain::branch::{Branch, BranchName, seed_commit_message};
use crate::domain::issue::Issue;
use crate::error::{AppError, AppResult};
use crate::services::{VcsError, VersionControlService};

/// States of getting the working tree onto an issue branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchState {
    AttemptExisting,
    CreateNew,
    Ready { is_new: bool },
}

pub struct BranchManager<'a> {
    vcs: &'a dyn VersionControlService,
}

impl<'a> BranchManager<'a> {
    pub fn new(vcs: &'a dyn VersionControlService) -> Self {
        Self { vcs }
    }

    /// Checks out the branch named after `issue.key`, creating and seeding it if absent.
    pub async fn checkout_or_create(&self, issue: &Issue) -> AppResult<Branch> {
        let name = BranchName::for_issue(issue);
        let mut state = BranchState::AttemptExisting;

        loop {
            debug!(branch = %name, ?state, "branch state");
            state = match state {
                BranchState::AttemptExisting => self.attempt_existing(&name).await?,
                BranchState::CreateNew => self.create_new(&name, issue).await?,
                BranchState::Ready { is_new } => {
                    let head = self.vcs.head().await?;
                    return Ok(Branch {
                        name,
                        head_commit: head.commit,
                        is_new,
                    });
                }
            };
        }
    }

    pub async fn attempt_existing(&self, name: &BranchName) -> AppResult<BranchState> {
        match self.vcs.checkout_branch(name).await {
            Ok(()) => {
                info!(branch = %name, "Checked out existing branch");
                Ok(BranchState::Ready { is_new: false })
            }
            Err(VcsError::BranchNotFound(_)) => Ok(BranchState::CreateNew),
            Err(source @ VcsError::Checkout { .. }) => Err(AppError::CheckoutFailed {
                branch: name.to_string(),
                source,
            }),
            Err(source) => Err(AppError::BranchLookupFailed {
                branch: name.to_string(),
                source,
            }),
        }
    }

    pub async fn create_new(&self, name: &BranchName, issue: &Issue) -> AppResult<BranchState> {
        let signature = self
            .vcs
            .committer_identity()
            .await
            .map_err(AppError::CommitFailed)?;

        self.vcs
            .create_branch(name)
            .await
            .map_err(|source| AppError::BranchCreateFailed {
                branch: name.to_string(),
                source,
            })?;
        self.vcs
            .checkout_branch(name)
            .await
            .map_err(|source| AppError::CheckoutFailed {
                branch: name.to_string(),
                source,
            })?;

        let message = seed_commit_message(issue);
        let commit = self
            .vcs
            .commit_empty(&message, &signature)
            .await
            .map_err(AppError::CommitFailed)?;
        info!(branch = %name, commit = %commit, "Created branch with seed commit");

        Ok(BranchState::Ready { is_new: true })
    }
}
