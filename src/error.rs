use std::io;

use thiserror::Error;

use crate::services::issue_tracker::TrackerError;
use crate::services::version_control::VcsError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("an issue summary is required when creating a new issue")]
    MissingSummary,
    #[error("unable to infer a project key from recent commits; pass --project")]
    ProjectKeyNotInferable,
    #[error("could not find project with key {0}")]
    UnknownProject(String),
    #[error("could not find issue type {requested}, available types are {available:?}")]
    UnknownIssueType {
        requested: String,
        available: Vec<String>,
    },
    #[error("failed to fetch issue {key}: {source}")]
    IssueFetchFailed {
        key: String,
        #[source]
        source: TrackerError,
    },
    #[error("failed to create issue: {source}")]
    IssueCreateFailed {
        response: Option<String>,
        #[source]
        source: TrackerError,
    },
    #[error("issue {key} was created but could not be fetched: {source}")]
    IssueFetchAfterCreateFailed {
        key: String,
        #[source]
        source: TrackerError,
    },
    #[error("failed to look up branch {branch}: {source}")]
    BranchLookupFailed {
        branch: String,
        #[source]
        source: VcsError,
    },
    #[error("failed to create branch {branch}: {source}")]
    BranchCreateFailed {
        branch: String,
        #[source]
        source: VcsError,
    },
    #[error("failed to check out branch {branch}: {source}")]
    CheckoutFailed {
        branch: String,
        #[source]
        source: VcsError,
    },
    #[error("failed to create seed commit: {0}")]
    CommitFailed(#[source] VcsError),
    #[error("failed to push {refspec} to {remote}: {source}")]
    PushFailed {
        remote: String,
        refspec: String,
        #[source]
        source: VcsError,
    },
    #[error("review tool '{0}' is not supported")]
    ReviewToolUnsupported(String),
    #[error("{backend} reviews do not support {operation} yet")]
    ReviewPublishNotImplemented {
        backend: &'static str,
        operation: &'static str,
    },
    #[error("issue tracker error: {0}")]
    IssueTracker(#[from] TrackerError),
    #[error("version control error: {0}")]
    VersionControl(#[from] VcsError),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
