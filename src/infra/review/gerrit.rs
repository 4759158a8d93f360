use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::domain::review::ReviewMeta;
use crate::error::{AppError, AppResult};
use crate::services::{ReviewPublisher, VersionControlService};

const REMOTE: &str = "origin";

/// Builds `<head>:refs/for/<base>[%wip][%r=a,r=b]`.
pub fn gerrit_refspec(head_ref: &str, meta: &ReviewMeta) -> String {
    let mut refspec = format!("{head_ref}:refs/for/{}", meta.base_branch);
    if meta.is_draft {
        refspec.push_str("%wip");
    }
    if !meta.reviewers.is_empty() {
        refspec.push_str("%r=");
        refspec.push_str(&meta.reviewers.join(",r="));
    }
    refspec
}

/// Publishes a patch set by pushing to Gerrit's magic `refs/for` namespace.
pub struct GerritReview {
    vcs: Arc<dyn VersionControlService>,
}

impl GerritReview {
    pub fn new(vcs: Arc<dyn VersionControlService>) -> Self {
        Self { vcs }
    }

    async fn refspec(&self, meta: &ReviewMeta) -> AppResult<String> {
        let head = self.vcs.head().await?;
        Ok(gerrit_refspec(&head.name, meta))
    }
}

#[async_trait]
impl ReviewPublisher for GerritReview {
    fn name(&self) -> &'static str {
        "gerrit"
    }

    async fn preview(&self, meta: &ReviewMeta) -> AppResult<String> {
        let refspec = self.refspec(meta).await?;
        Ok(format!("git push {REMOTE} {refspec}"))
    }

    async fn publish(&self, meta: &ReviewMeta) -> AppResult<()> {
        let refspec = self.refspec(meta).await?;
        debug!(refspec = %refspec, "Using refspec");

        self.vcs
            .push(REMOTE, &refspec)
            .await
            .map_err(|source| AppError::PushFailed {
                remote: REMOTE.to_string(),
                refspec: refspec.clone(),
                source,
            })?;
        info!(title = %meta.title, "Published review");
        Ok(())
    }

    async fn merge(&self, _meta: &ReviewMeta) -> AppResult<()> {
        Err(AppError::ReviewPublishNotImplemented {
            backend: self.name(),
            operation: "merge",
        })
    }
}
