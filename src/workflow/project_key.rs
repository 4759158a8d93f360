use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::services::VersionControlService;

/// How many commits, newest first, are searched for an issue key.
pub const MAX_SEARCH_DEPTH: usize = 5;

static ISSUE_KEY_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z]{3,})-[0-9]+").expect("valid issue key pattern"));

/// Returns the project key prefix when `message` starts with an issue key.
pub fn match_project_key(message: &str) -> Option<&str> {
    ISSUE_KEY_PREFIX
        .captures(message)
        .and_then(|captures| captures.get(1))
        .map(|prefix| prefix.as_str())
}

pub async fn infer_project_key(vcs: &dyn VersionControlService) -> AppResult<String> {
    let messages = vcs
        .recent_commit_messages(MAX_SEARCH_DEPTH)
        .await
        .map_err(|err| {
            debug!(error = %err, "unable to read commit history");
            AppError::ProjectKeyNotInferable
        })?;

    let key = messages
        .iter()
        .take(MAX_SEARCH_DEPTH)
        .find_map(|message| match_project_key(message))
        .ok_or(AppError::ProjectKeyNotInferable)?;

    info!(
        project_key = key,
        "Inferred project key; override with --project if incorrect"
    );
    Ok(key.to_string())
}
