use clap::Args;
use tracing::debug;

use crate::context::AppContext;
use crate::error::AppResult;
use crate::workflow::brew::{BrewOutcome, BrewRequest, brew};
use crate::workflow::issue::CreateIssueRequest;

#[derive(Args, Debug, Clone)]
pub struct BrewArgs {
    /// Existing issue to work on. A new issue is created when omitted.
    pub issue_key: Option<String>,
    /// Issue tracker project key, e.g. ABC. Inferred from recent commits when omitted.
    #[arg(short, long = "project")]
    pub project_key: Option<String>,
    /// Issue type to create, e.g. Bug or "New Feature". Defaults to the configured type.
    #[arg(short = 't', long)]
    pub issue_type: Option<String>,
    /// Issue summary.
    #[arg(short, long, default_value = "")]
    pub summary: String,
    /// Detailed description. Defaults to the summary.
    #[arg(short, long, default_value = "")]
    pub description: String,
    /// Set the Doc Impact field to "Yes".
    #[arg(short = 'x', long)]
    pub doc_impact: bool,
    /// Mark extended testing as required.
    #[arg(short = 'q', long = "testing-status")]
    pub testing_required: bool,
    /// Components for the new issue (comma separated).
    #[arg(short, long, value_delimiter = ',')]
    pub components: Vec<String>,
    /// Labels for the new issue (comma separated).
    #[arg(short, long, value_delimiter = ',')]
    pub labels: Vec<String>,
    /// Add components derived from the working tree and remote.
    #[arg(long)]
    pub auto_metadata: bool,
}

pub async fn run(ctx: &AppContext, args: BrewArgs, dry_run: bool) -> AppResult<()> {
    let request = BrewRequest {
        issue_key: args.issue_key,
        create: CreateIssueRequest {
            project_key: args.project_key,
            issue_type: args
                .issue_type
                .unwrap_or_else(|| ctx.config.default_issue_type.clone()),
            summary: args.summary,
            description: args.description,
            testing_required: args.testing_required,
            doc_impact: args.doc_impact,
            components: args.components,
            labels: args.labels,
            auto_metadata: args.auto_metadata,
        },
        dry_run,
    };

    match brew(ctx, request).await? {
        BrewOutcome::DryRun {
            issue_key,
            summary,
            description,
        } => {
            match issue_key {
                Some(key) => println!("Dry run: would check out branch {key}"),
                None => println!("Dry run: would create a new issue and branch"),
            }
            println!("Summary: {summary}");
            println!("Description: {description}");
        }
        BrewOutcome::Ready { issue, branch } => {
            debug!(fields = ?issue.field_values, "Issue fields");
            let commit = branch.head_commit.get(..10).unwrap_or(&branch.head_commit);
            if branch.is_new {
                println!("Branch {} created with seed commit {commit}.", branch.name);
            } else {
                println!("Switched to existing branch {} at {commit}.", branch.name);
            }
            println!("{}: {}", issue.key, issue.summary);
            if !issue.components.is_empty() {
                println!("Components: {}", issue.components.join(", "));
            }
            if !issue.labels.is_empty() {
                println!("Labels: {}", issue.labels.join(", "));
            }
            if let Some(url) = &issue.url {
                println!("View issue: {url}");
            }
        }
    }
    Ok(())
}
