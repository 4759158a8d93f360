use tracing::{debug, info};

use crate::context::AppContext;
use crate::domain::review::{ReviewMeta, ReviewTool};
use crate::error::AppResult;
use crate::infra::review::build_publisher;

#[derive(Debug, Clone, Default)]
pub struct TasteRequest {
    pub reviewers: Vec<String>,
    /// Target branch; the configured default when absent.
    pub base_branch: Option<String>,
    pub draft: bool,
    pub dry_run: bool,
    /// Overrides the configured review tool.
    pub review_tool: Option<String>,
}

#[derive(Debug, Clone)]
pub enum TasteOutcome {
    DryRun {
        backend: &'static str,
        action: String,
    },
    Published {
        backend: &'static str,
        meta: ReviewMeta,
    },
}

/// Publishes the current branch for review through the configured backend.
pub async fn taste(ctx: &AppContext, request: TasteRequest) -> AppResult<TasteOutcome> {
    let tool: ReviewTool = request
        .review_tool
        .as_deref()
        .unwrap_or(&ctx.config.review_tool)
        .parse()?;
    let publisher = build_publisher(tool, ctx.version_control.clone());

    let base_branch = request
        .base_branch
        .filter(|branch| !branch.trim().is_empty())
        .unwrap_or_else(|| ctx.config.default_branch.clone());
    debug!(target_branch = %base_branch, "Determined target branch");

    let message = ctx
        .version_control
        .recent_commit_messages(1)
        .await?
        .into_iter()
        .next()
        .unwrap_or_default();
    let meta =
        ReviewMeta::from_commit_message(&message, request.reviewers, base_branch, request.draft);
    debug!(title = %meta.title, description = %meta.description, "Review metadata");

    if request.dry_run {
        let action = publisher.preview(&meta).await?;
        info!(backend = publisher.name(), action = %action, "Dry run");
        return Ok(TasteOutcome::DryRun {
            backend: publisher.name(),
            action,
        });
    }

    publisher.publish(&meta).await?;
    Ok(TasteOutcome::Published {
        backend: publisher.name(),
        meta,
    })
}
