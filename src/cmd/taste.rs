use clap::Args;

use crate::context::AppContext;
use crate::error::AppResult;
use crate::workflow::taste::{TasteOutcome, TasteRequest, taste};

#[derive(Args, Debug, Clone)]
pub struct TasteArgs {
    /// Publish the review as work in progress.
    #[arg(long)]
    pub wip: bool,
    /// Reviewer emails (comma separated).
    #[arg(short, long, value_delimiter = ',')]
    pub reviewers: Vec<String>,
    /// Target branch for the review. Defaults to the configured branch.
    #[arg(long)]
    pub branch: Option<String>,
}

pub async fn run(
    ctx: &AppContext,
    args: TasteArgs,
    review_tool: Option<String>,
    dry_run: bool,
) -> AppResult<()> {
    let request = TasteRequest {
        reviewers: args.reviewers,
        base_branch: args.branch,
        draft: args.wip,
        dry_run,
        review_tool,
    };

    match taste(ctx, request).await? {
        TasteOutcome::DryRun { backend, action } => {
            println!("Dry run ({backend}): would {action}");
        }
        TasteOutcome::Published { backend, meta } => {
            println!("Published review via {backend}: {}", meta.title);
        }
    }
    Ok(())
}
