use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

const CONFIG_FILE_NAME: &str = "config.json";
const DEFAULT_REVIEW_TOOL: &str = "gerrit";
const DEFAULT_BRANCH: &str = "main";
const DEFAULT_ISSUE_TYPE: &str = "Bug";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub jira_base_url: Option<String>,
    pub jira_username: Option<String>,
    pub jira_token: Option<String>,
    pub review_tool: String,
    pub default_branch: String,
    pub default_issue_type: String,
    /// File extension (without the dot) mapped to the component it implies.
    pub component_extensions: BTreeMap<String, String>,
    pub workspace_root: PathBuf,
}

/// The on-disk configuration file. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoredConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jira_base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jira_username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jira_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_tool: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_branch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_issue_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component_extensions: Option<BTreeMap<String, String>>,
}

impl StoredConfig {
    pub fn load() -> AppResult<Self> {
        Self::load_from(&config_file_path()?)
    }

    pub fn load_from(path: &Path) -> AppResult<Self> {
        match fs::read_to_string(path) {
            Ok(contents) => serde_json::from_str(&contents).map_err(|err| {
                AppError::Configuration(format!("invalid config file {}: {err}", path.display()))
            }),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(AppError::Io(err)),
        }
    }

    pub fn save(&self) -> AppResult<()> {
        self.save_to(&config_file_path()?)
    }

    pub fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(self)
            .map_err(|err| AppError::Configuration(format!("failed to write config: {err}")))?;
        fs::write(path, data)?;
        Ok(())
    }
}

impl AppConfig {
    pub fn load(workspace_hint: &Path) -> AppResult<Self> {
        let stored = StoredConfig::load()?;
        Ok(Self::resolve(stored, |name| env::var(name).ok(), workspace_hint))
    }

    /// Layers environment overrides on top of the stored file.
    pub fn resolve(
        stored: StoredConfig,
        lookup: impl Fn(&str) -> Option<String>,
        workspace_hint: &Path,
    ) -> Self {
        let env_value = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        Self {
            jira_base_url: env_value("TAPROOM_JIRA_URL").or(stored.jira_base_url),
            jira_username: env_value("TAPROOM_JIRA_USERNAME").or(stored.jira_username),
            jira_token: env_value("TAPROOM_JIRA_TOKEN").or(stored.jira_token),
            review_tool: env_value("TAPROOM_REVIEW_TOOL")
                .or(stored.review_tool)
                .unwrap_or_else(|| DEFAULT_REVIEW_TOOL.to_string()),
            default_branch: env_value("TAPROOM_DEFAULT_BRANCH")
                .or(stored.default_branch)
                .unwrap_or_else(|| DEFAULT_BRANCH.to_string()),
            default_issue_type: stored
                .default_issue_type
                .unwrap_or_else(|| DEFAULT_ISSUE_TYPE.to_string()),
            component_extensions: stored
                .component_extensions
                .unwrap_or_else(default_component_extensions),
            workspace_root: workspace_hint.to_path_buf(),
        }
    }
}

fn default_component_extensions() -> BTreeMap<String, String> {
    BTreeMap::from([("tf".to_string(), "Terraform".to_string())])
}

pub fn config_directory() -> AppResult<PathBuf> {
    if let Some(dir) = env::var_os("TAPROOM_CONFIG_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Some(dir) = env::var_os("XDG_CONFIG_HOME") {
        return Ok(PathBuf::from(dir).join("taproom"));
    }
    env::var_os("HOME")
        .map(|home| PathBuf::from(home).join(".config").join("taproom"))
        .ok_or_else(|| AppError::Configuration("unable to find home directory".to_string()))
}

pub fn config_file_path() -> AppResult<PathBuf> {
    Ok(config_directory()?.join(CONFIG_FILE_NAME))
}
