use async_trait::async_trait;

use crate::domain::review::ReviewMeta;
use crate::error::AppResult;

/// A code-review backend able to publish the current branch.
#[async_trait]
pub trait ReviewPublisher: Send + Sync {
    fn name(&self) -> &'static str;
    /// Human-readable description of what `publish` would do.
    async fn preview(&self, meta: &ReviewMeta) -> AppResult<String>;
    async fn publish(&self, meta: &ReviewMeta) -> AppResult<()>;
    async fn merge(&self, meta: &ReviewMeta) -> AppResult<()>;
}
