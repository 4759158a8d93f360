mod gerrit;
mod pull_request;

use std::sync::Arc;

pub use gerrit::GerritReview;
pub use pull_request::PullRequestReview;

use crate::domain::review::ReviewTool;
use crate::services::{ReviewPublisher, VersionControlService};

pub fn build_publisher(
    tool: ReviewTool,
    vcs: Arc<dyn VersionControlService>,
) -> Arc<dyn ReviewPublisher> {
    match tool {
        ReviewTool::Gerrit => Arc::new(GerritReview::new(vcs)),
        ReviewTool::GitHub => Arc::new(PullRequestReview::new()),
    }
}
