use tracing::info;

use crate::context::AppContext;
use crate::domain::branch::Branch;
use crate::domain::issue::Issue;
use crate::error::AppResult;
use crate::workflow::branch::BranchManager;
use crate::workflow::issue::{CreateIssueRequest, IssueResolver};

#[derive(Debug, Clone)]
pub struct BrewRequest {
    /// Existing issue to work on; a new issue is created when absent.
    pub issue_key: Option<String>,
    pub create: CreateIssueRequest,
    pub dry_run: bool,
}

#[derive(Debug, Clone)]
pub enum BrewOutcome {
    DryRun {
        issue_key: Option<String>,
        summary: String,
        description: String,
    },
    Ready {
        issue: Issue,
        branch: Branch,
    },
}

/// Resolves or creates the issue, then gets the working tree onto its branch.
pub async fn brew(ctx: &AppContext, request: BrewRequest) -> AppResult<BrewOutcome> {
    let resolver = IssueResolver::new(
        ctx.issue_tracker.as_ref(),
        ctx.version_control.as_ref(),
        &ctx.config.component_extensions,
    );

    let issue = match request.issue_key.as_deref().map(str::trim) {
        Some(key) if !key.is_empty() => {
            let issue = resolver.fetch_and_claim(key, !request.dry_run).await?;
            if request.dry_run {
                info!(issue = %issue.key, summary = %issue.summary, "Dry run");
                return Ok(BrewOutcome::DryRun {
                    issue_key: Some(issue.key),
                    summary: issue.summary,
                    description: issue.description,
                });
            }
            issue
        }
        _ => {
            if request.dry_run {
                let (summary, description) = request.create.text()?;
                info!(summary = %summary, description = %description, "Dry run");
                return Ok(BrewOutcome::DryRun {
                    issue_key: None,
                    summary,
                    description,
                });
            }
            resolver.create_from_fields(&request.create).await?
        }
    };

    let branch = BranchManager::new(ctx.version_control.as_ref())
        .checkout_or_create(&issue)
        .await?;
    Ok(BrewOutcome::Ready { issue, branch })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::error::AppError;
    use crate::testing::{FakeTracker, FakeVcs, context, create_metadata, issue};

    fn new_issue(summary: &str, description: &str) -> BrewRequest {
        BrewRequest {
            issue_key: None,
            create: CreateIssueRequest {
                project_key: Some("ABC".to_string()),
                issue_type: "Bug".to_string(),
                summary: summary.to_string(),
                description: description.to_string(),
                ..CreateIssueRequest::default()
            },
            dry_run: false,
        }
    }

    fn existing(key: &str) -> BrewRequest {
        BrewRequest {
            issue_key: Some(key.to_string()),
            ..new_issue("", "")
        }
    }

    #[tokio::test]
    async fn dry_run_makes_no_changes() {
        let tracker = Arc::new(FakeTracker::default());
        let vcs = Arc::new(FakeVcs::with_history(&[]));
        let ctx = context(tracker.clone(), vcs.clone());

        let mut request = new_issue("Fix bug", "");
        request.dry_run = true;
        match brew(&ctx, request).await.unwrap() {
            BrewOutcome::DryRun {
                issue_key,
                summary,
                description,
            } => {
                assert!(issue_key.is_none());
                assert_eq!(summary, "Fix bug");
                assert_eq!(description, "Fix bug");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(tracker.writes(), 0);
        assert_eq!(vcs.mutations(), 0);
    }

    #[tokio::test]
    async fn dry_run_on_existing_issue_skips_claim_and_checkout() {
        let tracker = Arc::new(FakeTracker::with_issue(issue("ABC-1", "Fix bug", "Fix bug")));
        let vcs = Arc::new(FakeVcs::with_history(&[]));
        let ctx = context(tracker.clone(), vcs.clone());

        let mut request = existing("ABC-1");
        request.dry_run = true;
        let outcome = brew(&ctx, request).await.unwrap();

        assert!(matches!(
            outcome,
            BrewOutcome::DryRun { issue_key: Some(key), .. } if key == "ABC-1"
        ));
        assert_eq!(tracker.writes(), 0);
        assert_eq!(vcs.current_branch().as_deref(), Some("main"));
    }

    #[tokio::test]
    async fn missing_summary_stops_before_any_mutation() {
        let tracker = Arc::new(FakeTracker::default());
        let vcs = Arc::new(FakeVcs::with_history(&[]));
        let ctx = context(tracker.clone(), vcs.clone());

        let err = brew(&ctx, new_issue("", "details")).await.unwrap_err();
        assert!(matches!(err, AppError::MissingSummary));
        assert_eq!(tracker.writes(), 0);
        assert_eq!(vcs.mutations(), 0);
    }

    #[tokio::test]
    async fn creates_issue_then_seeds_branch() {
        let tracker = Arc::new(FakeTracker {
            metadata: create_metadata("ABC", "Bug"),
            next_key: Some("ABC-12".to_string()),
            ..FakeTracker::default()
        });
        let vcs = Arc::new(FakeVcs::with_history(&[]));
        let ctx = context(tracker.clone(), vcs.clone());

        let outcome = brew(&ctx, new_issue("Fix bug", "Root cause was X"))
            .await
            .unwrap();

        let BrewOutcome::Ready { issue, branch } = outcome else {
            panic!("expected a ready branch");
        };
        assert_eq!(issue.key, "ABC-12");
        assert_eq!(branch.name.as_str(), "ABC-12");
        assert!(branch.is_new);
        assert_eq!(
            vcs.state.lock().unwrap().commits[0].1,
            "ABC-12. Fix bug\n\nRoot cause was X"
        );
        assert!(tracker.assignments.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn rerunning_with_key_adds_no_commit() {
        let tracker = Arc::new(FakeTracker {
            metadata: create_metadata("ABC", "Bug"),
            next_key: Some("ABC-12".to_string()),
            ..FakeTracker::default()
        });
        let vcs = Arc::new(FakeVcs::with_history(&[]));
        let ctx = context(tracker.clone(), vcs.clone());

        brew(&ctx, new_issue("Fix bug", "")).await.unwrap();
        let outcome = brew(&ctx, existing("ABC-12")).await.unwrap();

        assert!(matches!(outcome, BrewOutcome::Ready { ref branch, .. } if !branch.is_new));
        assert_eq!(vcs.commit_count(), 1);
        assert_eq!(tracker.assignments.lock().unwrap().len(), 1);
    }
}
