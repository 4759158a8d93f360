use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::domain::issue::{
    ASSIGNEE_FIELD, ConditionalField, DESCRIPTION_FIELD, FieldMap, FieldSchema, ISSUE_TYPE_FIELD,
    Issue, NewIssue, PROJECT_FIELD, SUMMARY_FIELD,
};
use crate::error::{AppError, AppResult};
use crate::services::{IssueTrackerService, VersionControlService};
use crate::workflow::project_key::infer_project_key;

const ORIGIN: &str = "origin";

/// Free-form input for a new issue, as gathered from the command line.
#[derive(Debug, Clone, Default)]
pub struct CreateIssueRequest {
    pub project_key: Option<String>,
    pub issue_type: String,
    pub summary: String,
    pub description: String,
    pub testing_required: bool,
    pub doc_impact: bool,
    pub components: Vec<String>,
    pub labels: Vec<String>,
    pub auto_metadata: bool,
}

impl CreateIssueRequest {
    /// Checks the summary and returns it with the effective description.
    pub fn text(&self) -> AppResult<(String, String)> {
        let summary = self.summary.trim();
        if summary.is_empty() {
            return Err(AppError::MissingSummary);
        }
        let description = match self.description.trim() {
            "" => summary,
            description => description,
        };
        Ok((summary.to_string(), description.to_string()))
    }

    fn conditional_fields(&self) -> [(ConditionalField, bool); 2] {
        [
            (ConditionalField::TESTING_STATUS, self.testing_required),
            (ConditionalField::DOC_IMPACT, self.doc_impact),
        ]
    }
}

/// Values every new issue carries regardless of schema.
pub struct BaseFields<'a> {
    pub project_key: &'a str,
    pub issue_type: &'a str,
    pub summary: &'a str,
    pub description: &'a str,
    pub assignee: &'a str,
}

/// Builds the outgoing field map, setting optional fields only when the schema has them.
pub fn build_field_map(
    schema: &FieldSchema,
    base: &BaseFields<'_>,
    optional: &[(ConditionalField, bool)],
) -> FieldMap {
    let mut fields = FieldMap::from([
        (PROJECT_FIELD.to_string(), base.project_key.to_string()),
        (ISSUE_TYPE_FIELD.to_string(), base.issue_type.to_string()),
        (SUMMARY_FIELD.to_string(), base.summary.to_string()),
        (DESCRIPTION_FIELD.to_string(), base.description.to_string()),
        (ASSIGNEE_FIELD.to_string(), base.assignee.to_string()),
    ]);

    for (field, flag) in optional {
        if schema.has(field.name) {
            fields.insert(field.name.to_string(), field.value(*flag).to_string());
        } else {
            debug!(field = field.name, "field not in schema; skipping");
        }
    }
    fields
}

/// Repository name from a remote URL, e.g. `git@host:org/repo.git` -> `repo`.
pub fn repository_component(remote_url: &str) -> Option<String> {
    let trimmed = remote_url.trim().trim_end_matches('/');
    let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);
    trimmed
        .rsplit(['/', ':'])
        .next()
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}

fn push_unique(components: &mut Vec<String>, component: String) {
    if !components.contains(&component) {
        components.push(component);
    }
}

pub struct IssueResolver<'a> {
    tracker: &'a dyn IssueTrackerService,
    vcs: &'a dyn VersionControlService,
    component_extensions: &'a BTreeMap<String, String>,
}

impl<'a> IssueResolver<'a> {
    pub fn new(
        tracker: &'a dyn IssueTrackerService,
        vcs: &'a dyn VersionControlService,
        component_extensions: &'a BTreeMap<String, String>,
    ) -> Self {
        Self {
            tracker,
            vcs,
            component_extensions,
        }
    }

    pub async fn fetch_and_claim(&self, key: &str, claim: bool) -> AppResult<Issue> {
        let issue = self
            .tracker
            .get_issue(key)
            .await
            .map_err(|source| AppError::IssueFetchFailed {
                key: key.to_string(),
                source,
            })?;

        if claim {
            let claimed = match self.tracker.get_myself().await {
                Ok(user) => self
                    .tracker
                    .update_assignee(&issue.id, &user)
                    .await
                    .map(|()| user),
                Err(err) => Err(err),
            };
            match claimed {
                Ok(user) => info!(
                    issue = %issue.key,
                    assignee = user.display_name.as_deref().unwrap_or(&user.account_id),
                    "Assigned issue"
                ),
                Err(err) => warn!(issue = %issue.key, error = %err, "Failed to update assignee"),
            }
        }

        Ok(issue)
    }

    pub async fn create_from_fields(&self, request: &CreateIssueRequest) -> AppResult<Issue> {
        let (summary, description) = request.text()?;

        let project_key = match request.project_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => key.to_string(),
            _ => infer_project_key(self.vcs).await?,
        };

        let metadata = self.tracker.get_create_metadata(&project_key).await?;
        let project = metadata
            .project(&project_key)
            .ok_or_else(|| AppError::UnknownProject(project_key.clone()))?;
        let issue_type = project.issue_type(&request.issue_type).ok_or_else(|| {
            AppError::UnknownIssueType {
                requested: request.issue_type.clone(),
                available: project.issue_type_names(),
            }
        })?;

        let user = self.tracker.get_myself().await?;
        let fields = build_field_map(
            &issue_type.schema,
            &BaseFields {
                project_key: &project_key,
                issue_type: &issue_type.name,
                summary: &summary,
                description: &description,
                assignee: &user.account_id,
            },
            &request.conditional_fields(),
        );

        let mut components = Vec::new();
        for component in &request.components {
            push_unique(&mut components, component.clone());
        }
        if request.auto_metadata {
            self.enrich_components(&mut components).await;
        }

        let new_issue = NewIssue {
            schema: issue_type.schema.clone(),
            fields,
            components,
            labels: request.labels.clone(),
        };
        debug!(fields = ?new_issue.fields, components = ?new_issue.components, "Initialized issue");

        let key = self
            .tracker
            .create_issue(&new_issue)
            .await
            .map_err(|source| AppError::IssueCreateFailed {
                response: source.response_body().map(str::to_string),
                source,
            })?;
        info!(issue = %key, "Created issue");

        self.tracker
            .get_issue(&key)
            .await
            .map_err(|source| AppError::IssueFetchAfterCreateFailed { key, source })
    }

    /// Adds components implied by the working tree; never fails.
    pub async fn enrich_components(&self, components: &mut Vec<String>) {
        match self.vcs.list_working_tree_files().await {
            Ok(files) => {
                for (extension, component) in self.component_extensions {
                    let present = files.iter().any(|file| has_extension(file, extension));
                    if present {
                        push_unique(components, component.clone());
                    }
                }
            }
            Err(err) => warn!(
                error = %err,
                "Unable to list working tree; skipping file-type components"
            ),
        }

        match self.vcs.remote_url(ORIGIN).await {
            Ok(url) => match repository_component(&url) {
                Some(component) => push_unique(components, component),
                None => warn!(url = %url, "Unable to derive repository name from remote"),
            },
            Err(err) => warn!(
                error = %err,
                "Unable to read remote URL; skipping repository component"
            ),
        }
    }
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}
