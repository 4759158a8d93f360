mod cmd;
mod config;
mod context;
mod domain;
mod error;
mod infra;
mod services;
#[cfg(test)]
mod testing;
mod workflow;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

use crate::cmd::brew::{self as brew_cmd, BrewArgs};
use crate::cmd::config::{self as config_cmd, ConfigArgs};
use crate::cmd::taste::{self as taste_cmd, TasteArgs};
use crate::config::AppConfig;
use crate::context::AppContext;
use crate::error::{AppError, AppResult};
use crate::infra::git::GitCli;
use crate::infra::jira::JiraClient;

#[derive(Parser)]
#[command(
    name = "taproom",
    author,
    version,
    about = "Issue tracker, git and code review workflow CLI"
)]
struct Cli {
    /// Enable debug logging.
    #[arg(long, global = true)]
    debug: bool,
    /// Validate input and print what would happen without changing the tracker or repository.
    #[arg(long, global = true)]
    dry_run: bool,
    /// Tool used to publish reviews, e.g. gerrit or github.
    #[arg(long, global = true)]
    review_tool: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Work on an existing issue, or create one when no key is given, and check out its branch.
    Brew(BrewArgs),
    /// Publish the current branch for review.
    Taste(TasteArgs),
    /// Manage CLI configuration.
    Config(ConfigArgs),
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    if let Err(err) = run(cli).await {
        match &err {
            AppError::IssueCreateFailed {
                response: Some(body),
                ..
            } => error!(error = %err, response = %body, "Fatal error"),
            _ => error!(error = %err, "Fatal error"),
        }
        std::process::exit(1);
    }
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> AppResult<()> {
    match cli.command {
        Commands::Config(args) => config_cmd::run(args.command),
        Commands::Brew(args) => {
            let ctx = build_context()?;
            brew_cmd::run(&ctx, args, cli.dry_run).await
        }
        Commands::Taste(args) => {
            let ctx = build_context()?;
            taste_cmd::run(&ctx, args, cli.review_tool, cli.dry_run).await
        }
    }
}

fn build_context() -> AppResult<AppContext> {
    let cwd = std::env::current_dir()?;
    let config = AppConfig::load(&cwd)?;

    if config.jira_base_url.is_none() {
        warn!("Jira base URL not configured; issue lookups will fail.");
    }
    if config.jira_username.is_none() || config.jira_token.is_none() {
        warn!("Jira credentials not configured; issue lookups will fail.");
    }

    let git = Arc::new(GitCli::new(config.workspace_root.clone()));
    let issue_tracker = Arc::new(JiraClient::new(
        config.jira_base_url.clone(),
        config.jira_username.clone(),
        config.jira_token.clone(),
    ));

    Ok(AppContext::new(config, git, issue_tracker))
}
