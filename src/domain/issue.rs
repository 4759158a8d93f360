use std::collections::BTreeMap;

pub const PROJECT_FIELD: &str = "Project";
pub const ISSUE_TYPE_FIELD: &str = "Issue Type";
pub const SUMMARY_FIELD: &str = "Summary";
pub const DESCRIPTION_FIELD: &str = "Description";
pub const ASSIGNEE_FIELD: &str = "Assignee";
pub const TESTING_STATUS_FIELD: &str = "Testing Status";
pub const DOC_IMPACT_FIELD: &str = "Doc Impact";

/// An issue as the tracker reports it after a fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub id: String,
    pub key: String,
    pub summary: String,
    pub description: String,
    pub field_values: BTreeMap<String, String>,
    pub components: Vec<String>,
    pub labels: Vec<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerUser {
    pub account_id: String,
    pub display_name: Option<String>,
}

/// The create-time view of a field: its tracker identifier and value kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub id: String,
    pub kind: String,
}

impl FieldDescriptor {
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
        }
    }
}

/// Fields a project and issue type combination accepts, keyed by display name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSchema {
    fields: BTreeMap<String, FieldDescriptor>,
}

impl FieldSchema {
    pub fn new(fields: BTreeMap<String, FieldDescriptor>) -> Self {
        Self { fields }
    }

    pub fn has(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn descriptor(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.get(name)
    }

    #[cfg(test)]
    pub fn insert(&mut self, name: impl Into<String>, descriptor: FieldDescriptor) {
        self.fields.insert(name.into(), descriptor);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueTypeMeta {
    pub name: String,
    pub schema: FieldSchema,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectMeta {
    pub key: String,
    pub issue_types: Vec<IssueTypeMeta>,
}

impl ProjectMeta {
    pub fn issue_type(&self, name: &str) -> Option<&IssueTypeMeta> {
        self.issue_types.iter().find(|meta| meta.name == name)
    }

    pub fn issue_type_names(&self) -> Vec<String> {
        self.issue_types.iter().map(|meta| meta.name.clone()).collect()
    }
}

/// Create metadata for every project the tracker returned.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateMetadata {
    pub projects: Vec<ProjectMeta>,
}

impl CreateMetadata {
    pub fn project(&self, key: &str) -> Option<&ProjectMeta> {
        self.projects.iter().find(|project| project.key == key)
    }
}

/// Outgoing field values keyed by display name.
pub type FieldMap = BTreeMap<String, String>;

/// Everything needed to submit a new issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIssue {
    pub schema: FieldSchema,
    pub fields: FieldMap,
    pub components: Vec<String>,
    pub labels: Vec<String>,
}

/// Chooses between the two literal values of a flag-driven optional field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConditionalField {
    pub name: &'static str,
    pub when_set: &'static str,
    pub when_unset: &'static str,
}

impl ConditionalField {
    pub const TESTING_STATUS: Self = Self {
        name: TESTING_STATUS_FIELD,
        when_set: "Required",
        when_unset: "Not Required",
    };

    pub const DOC_IMPACT: Self = Self {
        name: DOC_IMPACT_FIELD,
        when_set: "Yes",
        when_unset: "No",
    };

    pub fn value(&self, flag: bool) -> &'static str {
        if flag { self.when_set } else { self.when_unset }
    }
}
