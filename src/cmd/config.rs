use std::io::{self, Write};

use clap::{Args, Subcommand};

use crate::config::{StoredConfig, config_file_path};
use crate::domain::review::ReviewTool;
use crate::error::AppResult;

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    /// Run the interactive configuration wizard.
    Init,
    /// Show the stored configuration (secrets masked).
    Show,
}

pub fn run(command: ConfigCommand) -> AppResult<()> {
    match command {
        ConfigCommand::Init => run_init(),
        ConfigCommand::Show => run_show(),
    }
}

fn run_init() -> AppResult<()> {
    let mut cfg = StoredConfig::load()?;

    println!("Configuring taproom.");
    println!("Press Enter to keep the current value, '-' to clear it.");
    println!("Secrets are stored in the local config file; protect your filesystem accordingly.");
    println!();

    apply_prompt(
        "Jira base URL (e.g., https://company.atlassian.net)",
        &mut cfg.jira_base_url,
        false,
    )?;
    apply_prompt("Jira username", &mut cfg.jira_username, false)?;
    apply_prompt("Jira API token", &mut cfg.jira_token, true)?;
    apply_prompt("Default issue type", &mut cfg.default_issue_type, false)?;
    apply_prompt("Review tool (gerrit/github)", &mut cfg.review_tool, false)?;
    if let Some(tool) = cfg.review_tool.as_deref() {
        tool.parse::<ReviewTool>()?;
    }
    apply_prompt("Default review branch", &mut cfg.default_branch, false)?;

    cfg.save()?;

    let path = config_file_path()?;
    println!("\nConfiguration saved to {}", path.display());
    Ok(())
}

fn run_show() -> AppResult<()> {
    let cfg = StoredConfig::load()?;
    let path = config_file_path()?;

    println!("Configuration file: {}", path.display());
    println!("Jira base URL: {}", display_value(&cfg.jira_base_url));
    println!("Jira username: {}", display_value(&cfg.jira_username));
    println!("Jira API token: {}", mask_secret(&cfg.jira_token));
    println!(
        "Default issue type: {}",
        display_value(&cfg.default_issue_type)
    );
    println!("Review tool: {}", display_value(&cfg.review_tool));
    println!("Default review branch: {}", display_value(&cfg.default_branch));
    match &cfg.component_extensions {
        Some(extensions) if !extensions.is_empty() => {
            for (extension, component) in extensions {
                println!("Component for *.{extension}: {component}");
            }
        }
        _ => println!("Component extensions: <default>"),
    }

    Ok(())
}

fn apply_prompt(field: &str, target: &mut Option<String>, secret: bool) -> AppResult<()> {
    match prompt(field, target.as_deref(), secret)? {
        PromptAction::Keep => {}
        PromptAction::Clear => *target = None,
        PromptAction::Set(value) => *target = Some(value),
    }
    Ok(())
}

fn prompt(field: &str, current: Option<&str>, secret: bool) -> AppResult<PromptAction> {
    let mut stdout = io::stdout();

    match (current, secret) {
        (Some(_), true) => write!(stdout, "{field} [****] (Enter to keep, '-' to clear): ")?,
        (Some(value), false) => {
            write!(stdout, "{field} [{value}] (Enter to keep, '-' to clear): ")?
        }
        (None, _) => write!(stdout, "{field} (Enter to skip): ")?,
    }
    stdout.flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let trimmed = input.trim();

    if trimmed.is_empty() {
        Ok(PromptAction::Keep)
    } else if trimmed == "-" {
        Ok(PromptAction::Clear)
    } else {
        Ok(PromptAction::Set(trimmed.to_string()))
    }
}

fn display_value(value: &Option<String>) -> String {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .map(|v| v.to_string())
        .unwrap_or_else(|| "<not set>".to_string())
}

fn mask_secret(value: &Option<String>) -> String {
    match value {
        Some(token) if token.chars().count() > 6 => {
            let length = token.chars().count();
            let prefix: String = token.chars().take(3).collect();
            let suffix: String = token.chars().skip(length - 3).collect();
            format!("{prefix}***{suffix}")
        }
        Some(token) if !token.is_empty() => "***".to_string(),
        _ => "<not set>".to_string(),
    }
}

enum PromptAction {
    Keep,
    Clear,
    Set(String),
}
