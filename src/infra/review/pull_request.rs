use async_trait::async_trait;

use crate::domain::review::ReviewMeta;
use crate::error::{AppError, AppResult};
use crate::services::ReviewPublisher;

/// Pull-request style reviews. The hosting API is not wired up yet.
#[derive(Default)]
pub struct PullRequestReview;

impl PullRequestReview {
    pub fn new() -> Self {
        Self
    }

    fn not_implemented(&self, operation: &'static str) -> AppError {
        AppError::ReviewPublishNotImplemented {
            backend: self.name(),
            operation,
        }
    }
}

#[async_trait]
impl ReviewPublisher for PullRequestReview {
    fn name(&self) -> &'static str {
        "github"
    }

    async fn preview(&self, meta: &ReviewMeta) -> AppResult<String> {
        let state = if meta.is_draft { "draft " } else { "" };
        Ok(format!(
            "open {state}pull request \"{}\" into {}",
            meta.title, meta.base_branch
        ))
    }

    async fn publish(&self, _meta: &ReviewMeta) -> AppResult<()> {
        Err(self.not_implemented("publish"))
    }

    async fn merge(&self, _meta: &ReviewMeta) -> AppResult<()> {
        Err(self.not_implemented("merge"))
    }
}
