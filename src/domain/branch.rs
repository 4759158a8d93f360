use std::fmt;

use crate::domain::issue::Issue;

/// A local branch named after an issue key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchName(pub String);

impl BranchName {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn for_issue(issue: &Issue) -> Self {
        Self(issue.key.trim().to_string())
    }

    pub fn ref_name(&self) -> String {
        format!("refs/heads/{}", self.0)
    }
}

impl fmt::Display for BranchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of getting the working tree onto an issue branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    pub name: BranchName,
    pub head_commit: String,
    pub is_new: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitSignature {
    pub name: String,
    pub email: String,
}

/// The current HEAD: its symbolic ref (when attached) and commit id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadRef {
    pub name: String,
    pub commit: String,
}

pub fn seed_commit_message(issue: &Issue) -> String {
    let mut message = format!("{}. {}", issue.key, issue.summary);
    if !issue.description.trim().is_empty() && issue.description != issue.summary {
        message.push_str("\n\n");
        message.push_str(&issue.description);
    }
    message
}
