use async_trait::async_trait;
use thiserror::Error;

use crate::domain::issue::{CreateMetadata, Issue, NewIssue, TrackerUser};

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("issue tracker is not configured: {0}")]
    NotConfigured(String),
    #[error("{0} was not found")]
    NotFound(String),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("tracker responded with {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("field {0} is not accepted by this issue type")]
    InvalidField(String),
    #[error("failed to decode tracker response: {0}")]
    Decode(String),
}

impl TrackerError {
    /// Response body attached to a rejection, if the tracker sent one.
    pub fn response_body(&self) -> Option<&str> {
        match self {
            TrackerError::Rejected { body, .. } => Some(body),
            _ => None,
        }
    }
}

pub type TrackerResult<T> = Result<T, TrackerError>;

#[async_trait]
pub trait IssueTrackerService: Send + Sync {
    async fn get_issue(&self, key: &str) -> TrackerResult<Issue>;
    async fn get_myself(&self) -> TrackerResult<TrackerUser>;
    async fn update_assignee(&self, issue_id: &str, user: &TrackerUser) -> TrackerResult<()>;
    async fn get_create_metadata(&self, project_key: &str) -> TrackerResult<CreateMetadata>;
    /// Submits a new issue and returns the key the tracker assigned.
    async fn create_issue(&self, issue: &NewIssue) -> TrackerResult<String>;
}
