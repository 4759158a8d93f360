use std::str::FromStr;

use crate::error::AppError;

/// Metadata shared by every review backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewMeta {
    pub title: String,
    pub description: String,
    pub reviewers: Vec<String>,
    pub base_branch: String,
    pub is_draft: bool,
}

impl ReviewMeta {
    /// Splits a commit message into a title line and the remaining body.
    pub fn from_commit_message(
        message: &str,
        reviewers: Vec<String>,
        base_branch: impl Into<String>,
        is_draft: bool,
    ) -> Self {
        let mut parts = message.trim().splitn(2, '\n');
        let title = parts.next().unwrap_or_default().trim().to_string();
        let description = parts.next().unwrap_or_default().trim().to_string();
        Self {
            title,
            description,
            reviewers,
            base_branch: base_branch.into(),
            is_draft,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewTool {
    Gerrit,
    GitHub,
}

impl FromStr for ReviewTool {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "gerrit" => Ok(ReviewTool::Gerrit),
            "github" => Ok(ReviewTool::GitHub),
            _ => Err(AppError::ReviewToolUnsupported(value.to_string())),
        }
    }
}
