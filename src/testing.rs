//! In-memory collaborators for workflow tests.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::config::{AppConfig, StoredConfig};
use crate::context::AppContext;
use crate::domain::branch::{BranchName, CommitSignature, HeadRef};
use crate::domain::issue::{
    CreateMetadata, FieldDescriptor, FieldSchema, Issue, IssueTypeMeta, NewIssue, ProjectMeta,
    TrackerUser,
};
use crate::services::issue_tracker::{IssueTrackerService, TrackerError, TrackerResult};
use crate::services::version_control::{VcsError, VcsResult, VersionControlService};

pub fn issue(key: &str, summary: &str, description: &str) -> Issue {
    Issue {
        id: format!("id-{key}"),
        key: key.to_string(),
        summary: summary.to_string(),
        description: description.to_string(),
        field_values: Default::default(),
        components: Vec::new(),
        labels: Vec::new(),
        url: None,
    }
}

#[derive(Default)]
pub struct FakeTracker {
    pub issues: Mutex<Vec<Issue>>,
    pub metadata: CreateMetadata,
    pub created: Mutex<Vec<NewIssue>>,
    pub assignments: Mutex<Vec<(String, String)>>,
    pub fail_assign: bool,
    pub reject_create: Option<String>,
    pub next_key: Option<String>,
    /// Accept creates without making the new issue fetchable.
    pub drop_created: bool,
}

impl FakeTracker {
    pub fn with_issue(issue: Issue) -> Self {
        Self {
            issues: Mutex::new(vec![issue]),
            ..Self::default()
        }
    }

    pub fn writes(&self) -> usize {
        self.created.lock().unwrap().len() + self.assignments.lock().unwrap().len()
    }
}

#[async_trait]
impl IssueTrackerService for FakeTracker {
    async fn get_issue(&self, key: &str) -> TrackerResult<Issue> {
        self.issues
            .lock()
            .unwrap()
            .iter()
            .find(|issue| issue.key == key)
            .cloned()
            .ok_or_else(|| TrackerError::NotFound(key.to_string()))
    }

    async fn get_myself(&self) -> TrackerResult<TrackerUser> {
        Ok(TrackerUser {
            account_id: "dev".to_string(),
            display_name: Some("Dev Eloper".to_string()),
        })
    }

    async fn update_assignee(&self, issue_id: &str, user: &TrackerUser) -> TrackerResult<()> {
        if self.fail_assign {
            return Err(TrackerError::Transport("connection reset".to_string()));
        }
        self.assignments
            .lock()
            .unwrap()
            .push((issue_id.to_string(), user.account_id.clone()));
        Ok(())
    }

    async fn get_create_metadata(&self, _project_key: &str) -> TrackerResult<CreateMetadata> {
        Ok(self.metadata.clone())
    }

    async fn create_issue(&self, new_issue: &NewIssue) -> TrackerResult<String> {
        if let Some(body) = &self.reject_create {
            return Err(TrackerError::Rejected {
                status: 400,
                body: body.clone(),
            });
        }
        self.created.lock().unwrap().push(new_issue.clone());
        let key = self.next_key.clone().unwrap_or_else(|| "NEW-1".to_string());
        let field = |name: &str| new_issue.fields.get(name).cloned().unwrap_or_default();
        let mut created = issue(&key, &field("Summary"), &field("Description"));
        created.components = new_issue.components.clone();
        created.labels = new_issue.labels.clone();
        if !self.drop_created {
            self.issues.lock().unwrap().push(created);
        }
        Ok(key)
    }
}

#[derive(Default)]
pub struct FakeRepoState {
    pub branches: BTreeSet<String>,
    pub current: Option<String>,
    pub commits: Vec<(String, String)>,
    pub pushes: Vec<(String, String)>,
    pub history: Vec<String>,
}

#[derive(Default)]
pub struct FakeVcs {
    pub state: Mutex<FakeRepoState>,
    pub files: Vec<PathBuf>,
    pub remote: Option<String>,
    pub identity: Option<CommitSignature>,
    pub corrupt: bool,
    pub dirty_worktree: bool,
    pub fail_push: bool,
}

impl FakeVcs {
    pub fn with_history(messages: &[&str]) -> Self {
        let vcs = Self {
            identity: Some(CommitSignature {
                name: "Dev Eloper".to_string(),
                email: "dev@example.com".to_string(),
            }),
            ..Self::default()
        };
        {
            let mut state = vcs.state.lock().unwrap();
            state.history = messages.iter().map(|m| m.to_string()).collect();
            state.branches.insert("main".to_string());
            state.current = Some("main".to_string());
        }
        vcs
    }

    pub fn commit_count(&self) -> usize {
        self.state.lock().unwrap().commits.len()
    }

    pub fn mutations(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.commits.len() + state.pushes.len() + state.branches.len().saturating_sub(1)
    }

    pub fn current_branch(&self) -> Option<String> {
        self.state.lock().unwrap().current.clone()
    }
}

#[async_trait]
impl VersionControlService for FakeVcs {
    async fn head(&self) -> VcsResult<HeadRef> {
        let state = self.state.lock().unwrap();
        let branch = state.current.clone().unwrap_or_else(|| "main".to_string());
        Ok(HeadRef {
            name: format!("refs/heads/{branch}"),
            commit: format!("{:040x}", state.commits.len() + state.history.len()),
        })
    }

    async fn recent_commit_messages(&self, max_depth: usize) -> VcsResult<Vec<String>> {
        let state = self.state.lock().unwrap();
        Ok(state.history.iter().take(max_depth).cloned().collect())
    }

    async fn checkout_branch(&self, branch: &BranchName) -> VcsResult<()> {
        if self.corrupt {
            return Err(VcsError::Command {
                command: "show-ref".to_string(),
                stderr: "fatal: bad object HEAD".to_string(),
            });
        }
        let mut state = self.state.lock().unwrap();
        if !state.branches.contains(branch.as_str()) {
            return Err(VcsError::BranchNotFound(branch.to_string()));
        }
        if self.dirty_worktree {
            return Err(VcsError::Checkout {
                branch: branch.to_string(),
                stderr: "error: Your local changes would be overwritten by checkout".to_string(),
            });
        }
        state.current = Some(branch.to_string());
        Ok(())
    }

    async fn create_branch(&self, branch: &BranchName) -> VcsResult<()> {
        self.state
            .lock()
            .unwrap()
            .branches
            .insert(branch.to_string());
        Ok(())
    }

    async fn commit_empty(&self, message: &str, _signature: &CommitSignature) -> VcsResult<String> {
        let mut state = self.state.lock().unwrap();
        let branch = state.current.clone().unwrap_or_default();
        state.commits.push((branch, message.to_string()));
        state.history.insert(0, message.to_string());
        Ok(format!("{:040x}", state.commits.len()))
    }

    async fn push(&self, remote: &str, refspec: &str) -> VcsResult<()> {
        if self.fail_push {
            return Err(VcsError::Command {
                command: format!("push {remote} {refspec}"),
                stderr: "remote rejected".to_string(),
            });
        }
        self.state
            .lock()
            .unwrap()
            .pushes
            .push((remote.to_string(), refspec.to_string()));
        Ok(())
    }

    async fn list_working_tree_files(&self) -> VcsResult<Vec<PathBuf>> {
        Ok(self.files.clone())
    }

    async fn remote_url(&self, remote: &str) -> VcsResult<String> {
        self.remote.clone().ok_or_else(|| VcsError::Command {
            command: format!("remote get-url {remote}"),
            stderr: format!("error: No such remote '{remote}'"),
        })
    }

    async fn committer_identity(&self) -> VcsResult<CommitSignature> {
        self.identity.clone().ok_or_else(|| VcsError::Command {
            command: "config user.name".to_string(),
            stderr: String::new(),
        })
    }
}

pub fn context(tracker: Arc<FakeTracker>, vcs: Arc<FakeVcs>) -> AppContext {
    let config = AppConfig::resolve(StoredConfig::default(), |_| None, Path::new("."));
    AppContext::new(config, vcs, tracker)
}

/// Create metadata for one project whose single issue type accepts the base fields.
pub fn create_metadata(project_key: &str, issue_type: &str) -> CreateMetadata {
    let mut schema = FieldSchema::default();
    for (name, id, kind) in [
        ("Project", "project", "project"),
        ("Issue Type", "issuetype", "issuetype"),
        ("Summary", "summary", "string"),
        ("Description", "description", "string"),
        ("Assignee", "assignee", "user"),
    ] {
        schema.insert(name, FieldDescriptor::new(id, kind));
    }
    CreateMetadata {
        projects: vec![ProjectMeta {
            key: project_key.to_string(),
            issue_types: vec![IssueTypeMeta {
                name: issue_type.to_string(),
                schema,
            }],
        }],
    }
}
