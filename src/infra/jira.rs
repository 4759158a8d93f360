use std::collections::BTreeMap;

use async_trait::async_trait;
use base64::prelude::{BASE64_STANDARD, Engine as _};
use reqwest::{
    Client, Method, RequestBuilder, Response,
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::domain::issue::{
    CreateMetadata, FieldDescriptor, FieldSchema, Issue, IssueTypeMeta, NewIssue, ProjectMeta,
    TrackerUser,
};
use crate::services::IssueTrackerService;
use crate::services::issue_tracker::{TrackerError, TrackerResult};

pub struct JiraClient {
    http: Client,
    base_url: Option<String>,
    username: Option<String>,
    token: Option<String>,
}

impl JiraClient {
    pub fn new(base_url: Option<String>, username: Option<String>, token: Option<String>) -> Self {
        Self {
            http: Client::new(),
            base_url,
            username,
            token,
        }
    }

    fn api_details(&self) -> TrackerResult<(&str, &str, &str)> {
        let base_url = self
            .base_url
            .as_deref()
            .ok_or_else(|| TrackerError::NotConfigured("Jira base URL".to_string()))?;
        let username = self
            .username
            .as_deref()
            .ok_or_else(|| TrackerError::NotConfigured("Jira username".to_string()))?;
        let token = self
            .token
            .as_deref()
            .ok_or_else(|| TrackerError::NotConfigured("Jira API token".to_string()))?;
        Ok((base_url, username, token))
    }

    fn auth_header(username: &str, token: &str) -> String {
        let credentials = format!("{username}:{token}");
        let encoded = BASE64_STANDARD.encode(credentials);
        format!("Basic {encoded}")
    }

    fn api_url(base_url: &str, path: &str) -> String {
        format!("{}/rest/api/3/{path}", base_url.trim_end_matches('/'))
    }

    fn browse_url(base_url: &str, key: &str) -> String {
        format!("{}/browse/{}", base_url.trim_end_matches('/'), key)
    }

    fn request(&self, method: Method, path: &str) -> TrackerResult<RequestBuilder> {
        let (base_url, username, token) = self.api_details()?;
        Ok(self
            .http
            .request(method, Self::api_url(base_url, path))
            .header(AUTHORIZATION, Self::auth_header(username, token))
            .header(ACCEPT, "application/json")
            .header(CONTENT_TYPE, "application/json"))
    }

    /// Sends a request, mapping 404 to `NotFound(subject)` and other failures to `Rejected`.
    async fn send(&self, request: RequestBuilder, subject: &str) -> TrackerResult<Response> {
        let response = request
            .send()
            .await
            .map_err(|err| TrackerError::Transport(format!("failed to call Jira: {err}")))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(TrackerError::NotFound(subject.to_string()));
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unable to read response>".to_string());
            return Err(TrackerError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> TrackerResult<T> {
        response
            .json()
            .await
            .map_err(|err| TrackerError::Decode(err.to_string()))
    }
}

#[async_trait]
impl IssueTrackerService for JiraClient {
    async fn get_issue(&self, key: &str) -> TrackerResult<Issue> {
        let request = self
            .request(Method::GET, &format!("issue/{key}"))?
            .query(&[("expand", "names")]);
        let response = self.send(request, &format!("issue {key}")).await?;
        let payload: JiraIssueResponse = Self::decode(response).await?;

        let (base_url, _, _) = self.api_details()?;
        let url = Self::browse_url(base_url, &payload.key);
        Ok(payload.into_issue(url))
    }

    async fn get_myself(&self) -> TrackerResult<TrackerUser> {
        let response = self
            .send(self.request(Method::GET, "myself")?, "current user")
            .await?;
        let user: JiraUser = Self::decode(response).await?;
        Ok(TrackerUser {
            account_id: user.account_id,
            display_name: user.display_name,
        })
    }

    async fn update_assignee(&self, issue_id: &str, user: &TrackerUser) -> TrackerResult<()> {
        let request = self
            .request(Method::PUT, &format!("issue/{issue_id}/assignee"))?
            .json(&json!({ "accountId": user.account_id }));
        self.send(request, &format!("issue {issue_id}")).await?;
        Ok(())
    }

    async fn get_create_metadata(&self, project_key: &str) -> TrackerResult<CreateMetadata> {
        let request = self.request(Method::GET, "issue/createmeta")?.query(&[
            ("projectKeys", project_key),
            ("expand", "projects.issuetypes.fields"),
        ]);
        let response = self
            .send(request, &format!("create metadata for {project_key}"))
            .await?;
        let payload: JiraCreateMetaResponse = Self::decode(response).await?;
        Ok(payload.into_metadata())
    }

    async fn create_issue(&self, issue: &NewIssue) -> TrackerResult<String> {
        let fields = encode_fields(issue)?;
        let payload = Value::Object(fields.clone());
        debug!(fields = %payload, "Submitting issue");

        let request = self
            .request(Method::POST, "issue")?
            .json(&json!({ "fields": fields }));
        let response = self.send(request, "issue endpoint").await?;
        let payload: JiraCreateIssueResponse = Self::decode(response).await?;
        Ok(payload.key)
    }
}

/// Encodes display-name keyed values into Jira field ids using the schema's value kinds.
pub fn encode_fields(issue: &NewIssue) -> TrackerResult<Map<String, Value>> {
    let mut fields = Map::new();
    for (name, value) in &issue.fields {
        let descriptor = issue
            .schema
            .descriptor(name)
            .ok_or_else(|| TrackerError::InvalidField(name.clone()))?;
        fields.insert(descriptor.id.clone(), encode_value(descriptor, value));
    }
    if !issue.components.is_empty() {
        let components = issue
            .components
            .iter()
            .map(|name| json!({ "name": name }))
            .collect();
        fields.insert("components".to_string(), Value::Array(components));
    }
    if !issue.labels.is_empty() {
        fields.insert("labels".to_string(), json!(issue.labels));
    }
    Ok(fields)
}

fn encode_value(descriptor: &FieldDescriptor, value: &str) -> Value {
    if descriptor.id == "description" {
        return serde_json::to_value(JiraDescription::from_markdown(value))
            .unwrap_or_else(|_| Value::String(value.to_string()));
    }
    match descriptor.kind.as_str() {
        "project" => json!({ "key": value }),
        "user" => json!({ "accountId": value }),
        "issuetype" | "priority" | "version" | "component" => json!({ "name": value }),
        "option" => json!({ "value": value }),
        "number" => value
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(value.to_string())),
        "array" => json!([value]),
        _ => Value::String(value.to_string()),
    }
}

/// Flattens a field value into display text; `None` for shapes with no obvious text.
fn field_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Object(object) if object.get("type").and_then(Value::as_str) == Some("doc") => {
            Some(adf_to_text(value))
        }
        Value::Object(object) => ["value", "name", "displayName", "key"]
            .iter()
            .find_map(|key| object.get(*key).and_then(Value::as_str))
            .map(str::to_string),
        _ => None,
    }
}

/// Collects the text of an Atlassian document, one paragraph per block.
fn adf_to_text(value: &Value) -> String {
    fn collect(node: &Value, out: &mut String) {
        if let Some(text) = node.get("text").and_then(Value::as_str) {
            out.push_str(text);
        }
        if node.get("type").and_then(Value::as_str) == Some("hardBreak") {
            out.push('\n');
        }
        if let Some(children) = node.get("content").and_then(Value::as_array) {
            for child in children {
                collect(child, out);
            }
        }
    }

    match value {
        Value::String(text) => text.clone(),
        Value::Object(_) => value
            .get("content")
            .and_then(Value::as_array)
            .map(|blocks| {
                blocks
                    .iter()
                    .map(|block| {
                        let mut text = String::new();
                        collect(block, &mut text);
                        text
                    })
                    .filter(|text| !text.trim().is_empty())
                    .collect::<Vec<_>>()
                    .join("\n\n")
            })
            .unwrap_or_default(),
        _ => String::new(),
    }
}

#[derive(Deserialize)]
struct JiraIssueResponse {
    id: String,
    key: String,
    #[serde(default)]
    fields: Map<String, Value>,
    #[serde(default)]
    names: BTreeMap<String, String>,
}

impl JiraIssueResponse {
    fn into_issue(self, url: String) -> Issue {
        let text = |id: &str| self.fields.get(id).map(adf_to_text).unwrap_or_default();
        let summary = text("summary");
        let description = text("description");

        let names_of = |id: &str, key: &str| -> Vec<String> {
            self.fields
                .get(id)
                .and_then(Value::as_array)
                .map(|items| {
                    items
                        .iter()
                        .filter_map(|item| match item {
                            Value::String(name) => Some(name.clone()),
                            other => other.get(key).and_then(Value::as_str).map(str::to_string),
                        })
                        .collect()
                })
                .unwrap_or_default()
        };
        let components = names_of("components", "name");
        let labels = names_of("labels", "name");

        let field_values = self
            .fields
            .iter()
            .filter_map(|(id, value)| {
                let name = self.names.get(id).cloned().unwrap_or_else(|| id.clone());
                field_text(value).map(|text| (name, text))
            })
            .collect();

        Issue {
            id: self.id,
            key: self.key,
            summary,
            description,
            field_values,
            components,
            labels,
            url: Some(url),
        }
    }
}

#[derive(Deserialize)]
struct JiraUser {
    #[serde(rename = "accountId")]
    account_id: String,
    #[serde(rename = "displayName")]
    display_name: Option<String>,
}

#[derive(Deserialize)]
struct JiraCreateMetaResponse {
    #[serde(default)]
    projects: Vec<JiraMetaProject>,
}

impl JiraCreateMetaResponse {
    fn into_metadata(self) -> CreateMetadata {
        let projects = self
            .projects
            .into_iter()
            .map(|project| ProjectMeta {
                key: project.key,
                issue_types: project
                    .issuetypes
                    .into_iter()
                    .map(|issue_type| IssueTypeMeta {
                        name: issue_type.name,
                        schema: FieldSchema::new(
                            issue_type
                                .fields
                                .into_iter()
                                .map(|(id, field)| {
                                    (field.name, FieldDescriptor::new(id, field.schema.kind))
                                })
                                .collect(),
                        ),
                    })
                    .collect(),
            })
            .collect();
        CreateMetadata { projects }
    }
}

#[derive(Deserialize)]
struct JiraMetaProject {
    key: String,
    #[serde(default)]
    issuetypes: Vec<JiraMetaIssueType>,
}

#[derive(Deserialize)]
struct JiraMetaIssueType {
    name: String,
    #[serde(default)]
    fields: BTreeMap<String, JiraMetaField>,
}

#[derive(Deserialize)]
struct JiraMetaField {
    name: String,
    #[serde(default)]
    schema: JiraFieldType,
}

#[derive(Deserialize, Default)]
struct JiraFieldType {
    #[serde(rename = "type", default)]
    kind: String,
}

#[derive(Serialize)]
struct JiraDescription {
    #[serde(rename = "type")]
    doc_type: &'static str,
    version: u8,
    content: Vec<JiraDocNode>,
}

impl JiraDescription {
    fn from_markdown(description: &str) -> Self {
        let cleaned = description.replace('\r', "");
        let content = cleaned
            .split("\n\n")
            .map(|section| section.trim())
            .filter(|section| !section.is_empty())
            .map(|section| JiraDocNode::paragraph(section.replace('\n', " ")))
            .collect();

        Self {
            doc_type: "doc",
            version: 1,
            content,
        }
    }
}

#[derive(Serialize)]
struct JiraDocNode {
    #[serde(rename = "type")]
    node_type: &'static str,
    content: Vec<JiraDocText>,
}

impl JiraDocNode {
    fn paragraph(text: String) -> Self {
        Self {
            node_type: "paragraph",
            content: vec![JiraDocText::text(text)],
        }
    }
}

#[derive(Serialize)]
struct JiraDocText {
    #[serde(rename = "type")]
    text_type: &'static str,
    text: String,
}

impl JiraDocText {
    fn text(text: String) -> Self {
        Self {
            text_type: "text",
            text,
        }
    }
}

#[derive(Deserialize)]
struct JiraCreateIssueResponse {
    key: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::issue::FieldMap;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> JiraClient {
        JiraClient::new(
            Some(server.uri()),
            Some("dev@example.com".to_string()),
            Some("token".to_string()),
        )
    }

    fn schema() -> FieldSchema {
        let mut schema = FieldSchema::default();
        schema.insert("Project", FieldDescriptor::new("project", "project"));
        schema.insert("Issue Type", FieldDescriptor::new("issuetype", "issuetype"));
        schema.insert("Summary", FieldDescriptor::new("summary", "string"));
        schema.insert("Description", FieldDescriptor::new("description", "string"));
        schema.insert("Assignee", FieldDescriptor::new("assignee", "user"));
        schema.insert("Testing Status", FieldDescriptor::new("customfield_10200", "option"));
        schema
    }

    #[test]
    fn encodes_fields_by_schema_kind() {
        let issue = NewIssue {
            schema: schema(),
            fields: FieldMap::from([
                ("Project".to_string(), "ABC".to_string()),
                ("Issue Type".to_string(), "Bug".to_string()),
                ("Summary".to_string(), "Fix bug".to_string()),
                ("Description".to_string(), "First\n\nSecond".to_string()),
                ("Assignee".to_string(), "557058:abc".to_string()),
                ("Testing Status".to_string(), "Required".to_string()),
            ]),
            components: vec!["network".to_string()],
            labels: Vec::new(),
        };

        let fields = encode_fields(&issue).unwrap();
        assert_eq!(fields["project"], json!({ "key": "ABC" }));
        assert_eq!(fields["issuetype"], json!({ "name": "Bug" }));
        assert_eq!(fields["summary"], json!("Fix bug"));
        assert_eq!(fields["assignee"], json!({ "accountId": "557058:abc" }));
        assert_eq!(fields["customfield_10200"], json!({ "value": "Required" }));
        assert_eq!(fields["components"], json!([{ "name": "network" }]));
        assert_eq!(fields["description"]["content"].as_array().unwrap().len(), 2);
        assert!(!fields.contains_key("labels"));
    }

    #[test]
    fn rejects_fields_outside_schema() {
        let issue = NewIssue {
            schema: FieldSchema::default(),
            fields: FieldMap::from([("Summary".to_string(), "Fix bug".to_string())]),
            components: Vec::new(),
            labels: Vec::new(),
        };
        assert!(matches!(
            encode_fields(&issue),
            Err(TrackerError::InvalidField(name)) if name == "Summary"
        ));
    }

    #[test]
    fn flattens_document_descriptions() {
        let doc = serde_json::to_value(JiraDescription::from_markdown(
            "Fix bug\n\nRoot cause was X",
        ))
        .unwrap();
        assert_eq!(adf_to_text(&doc), "Fix bug\n\nRoot cause was X");
    }

    #[tokio::test]
    async fn fetches_issue_with_named_fields() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/3/issue/ABC-1"))
            .and(query_param("expand", "names"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": "10001",
                "key": "ABC-1",
                "fields": {
                    "summary": "Fix bug",
                    "description": null,
                    "customfield_10200": { "value": "Required" },
                    "components": [{ "name": "network" }],
                    "labels": ["triage"]
                },
                "names": {
                    "summary": "Summary",
                    "customfield_10200": "Testing Status"
                }
            })))
            .mount(&server)
            .await;

        let issue = client(&server).get_issue("ABC-1").await.unwrap();
        assert_eq!(issue.id, "10001");
        assert_eq!(issue.summary, "Fix bug");
        assert_eq!(issue.description, "");
        assert_eq!(issue.components, vec!["network"]);
        assert_eq!(issue.labels, vec!["triage"]);
        assert_eq!(issue.field_values["Testing Status"], "Required");
        assert_eq!(
            issue.url.as_deref(),
            Some(format!("{}/browse/ABC-1", server.uri()).as_str())
        );
    }

    #[tokio::test]
    async fn missing_issue_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/3/issue/ABC-404"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = client(&server).get_issue("ABC-404").await.unwrap_err();
        assert!(matches!(err, TrackerError::NotFound(_)));
    }

    #[tokio::test]
    async fn parses_create_metadata() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/3/issue/createmeta"))
            .and(query_param("projectKeys", "ABC"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "projects": [{
                    "key": "ABC",
                    "issuetypes": [{
                        "name": "Bug",
                        "fields": {
                            "summary": { "name": "Summary", "schema": { "type": "string" } },
                            "customfield_10300": {
                                "name": "Doc Impact",
                                "schema": { "type": "option" }
                            }
                        }
                    }]
                }]
            })))
            .mount(&server)
            .await;

        let metadata = client(&server).get_create_metadata("ABC").await.unwrap();
        let bug = metadata.project("ABC").unwrap().issue_type("Bug").unwrap();
        assert!(bug.schema.has("Doc Impact"));
        assert!(!bug.schema.has("Testing Status"));
        assert_eq!(
            bug.schema.descriptor("Doc Impact").unwrap(),
            &FieldDescriptor::new("customfield_10300", "option")
        );
    }

    #[tokio::test]
    async fn create_failure_keeps_response_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/api/3/issue"))
            .respond_with(
                ResponseTemplate::new(400).set_body_string(r#"{"errors":{"summary":"required"}}"#),
            )
            .mount(&server)
            .await;

        let issue = NewIssue {
            schema: schema(),
            fields: FieldMap::from([("Summary".to_string(), "Fix bug".to_string())]),
            components: Vec::new(),
            labels: Vec::new(),
        };
        let err = client(&server).create_issue(&issue).await.unwrap_err();
        assert_eq!(err.response_body(), Some(r#"{"errors":{"summary":"required"}}"#));
    }

    #[tokio::test]
    async fn claims_issue_for_current_user() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/api/3/myself"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "accountId": "5b10ac8d82e05b22cc7d4ef5",
                "displayName": "Dev Eloper"
            })))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/rest/api/3/issue/10001/assignee"))
            .and(body_json(json!({ "accountId": "5b10ac8d82e05b22cc7d4ef5" })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server);
        let me = client.get_myself().await.unwrap();
        assert_eq!(me.display_name.as_deref(), Some("Dev Eloper"));
        client.update_assignee("10001", &me).await.unwrap();
    }

    #[tokio::test]
    async fn unconfigured_client_fails_without_network() {
        let client = JiraClient::new(None, None, None);
        assert!(matches!(
            client.get_myself().await,
            Err(TrackerError::NotConfigured(_))
        ));
    }
}
