use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::domain::branch::{BranchName, CommitSignature, HeadRef};
use crate::services::VersionControlService;
use crate::services::version_control::{VcsError, VcsResult};

/// Separates commit messages in `git log` output.
const RECORD_SEPARATOR: char = '\u{1e}';

pub struct GitCli {
    workspace_root: PathBuf,
}

struct GitOutput {
    success: bool,
    code: Option<i32>,
    stdout: String,
    stderr: String,
}

impl GitCli {
    pub fn new(workspace_root: PathBuf) -> Self {
        Self { workspace_root }
    }

    async fn run(&self, args: &[&str]) -> VcsResult<GitOutput> {
        self.run_with_env(args, &[]).await
    }

    async fn run_with_env(&self, args: &[&str], env: &[(&str, &str)]) -> VcsResult<GitOutput> {
        debug!(args = ?args, "running git");
        let output = Command::new("git")
            .args(args)
            .envs(env.iter().copied())
            .current_dir(&self.workspace_root)
            .stdin(Stdio::null())
            .output()
            .await?;
        Ok(GitOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }

    /// Runs git and returns trimmed stdout, failing on a non-zero exit.
    async fn run_checked(&self, args: &[&str]) -> VcsResult<String> {
        self.run_checked_with_env(args, &[]).await
    }

    async fn run_checked_with_env(
        &self,
        args: &[&str],
        env: &[(&str, &str)],
    ) -> VcsResult<String> {
        let output = self.run_with_env(args, env).await?;
        if !output.success {
            return Err(VcsError::Command {
                command: args.join(" "),
                stderr: output.stderr,
            });
        }
        Ok(output.stdout.trim().to_string())
    }

    async fn config_value(&self, key: &str) -> VcsResult<String> {
        let value = self.run_checked(&["config", "--get", key]).await?;
        if value.is_empty() {
            return Err(VcsError::Parse(format!("{key} is empty")));
        }
        Ok(value)
    }
}

#[async_trait]
impl VersionControlService for GitCli {
    async fn head(&self) -> VcsResult<HeadRef> {
        let commit = self.run_checked(&["rev-parse", "HEAD"]).await?;
        let symbolic = self.run(&["symbolic-ref", "-q", "HEAD"]).await?;
        let name = if symbolic.success {
            symbolic.stdout.trim().to_string()
        } else {
            "HEAD".to_string()
        };
        Ok(HeadRef { name, commit })
    }

    async fn recent_commit_messages(&self, max_depth: usize) -> VcsResult<Vec<String>> {
        let limit = format!("--max-count={max_depth}");
        let format = format!("--format=%B{RECORD_SEPARATOR}");
        let output = self.run(&["log", &limit, &format, "HEAD"]).await?;
        if !output.success {
            // An unborn branch has no history to search.
            if output.stderr.contains("does not have any commits") {
                return Ok(Vec::new());
            }
            return Err(VcsError::Command {
                command: "log".to_string(),
                stderr: output.stderr,
            });
        }
        Ok(output
            .stdout
            .split(RECORD_SEPARATOR)
            .map(str::trim)
            .filter(|message| !message.is_empty())
            .map(str::to_string)
            .collect())
    }

    async fn checkout_branch(&self, branch: &BranchName) -> VcsResult<()> {
        let ref_name = branch.ref_name();
        let lookup = self
            .run(&["show-ref", "--verify", "--quiet", &ref_name])
            .await?;
        match (lookup.success, lookup.code) {
            (true, _) => {}
            (false, Some(1)) => return Err(VcsError::BranchNotFound(branch.to_string())),
            (false, _) => {
                return Err(VcsError::Command {
                    command: format!("show-ref --verify {ref_name}"),
                    stderr: lookup.stderr,
                });
            }
        }
        let checkout = self.run(&["checkout", branch.as_str()]).await?;
        if !checkout.success {
            return Err(VcsError::Checkout {
                branch: branch.to_string(),
                stderr: checkout.stderr,
            });
        }
        Ok(())
    }

    async fn create_branch(&self, branch: &BranchName) -> VcsResult<()> {
        self.run_checked(&["branch", branch.as_str()]).await?;
        Ok(())
    }

    async fn commit_empty(&self, message: &str, signature: &CommitSignature) -> VcsResult<String> {
        // The commit reuses the parent's tree so nothing staged is swept in.
        let parent = self.run(&["rev-parse", "--verify", "-q", "HEAD"]).await?;
        let parent = parent.success.then(|| parent.stdout.trim().to_string());
        let tree = match &parent {
            Some(commit) => format!("{commit}^{{tree}}"),
            // Root commit on an unborn branch: empty stdin yields the empty tree.
            None => self.run_checked(&["mktree"]).await?,
        };

        let mut args = vec!["commit-tree", tree.as_str()];
        if let Some(commit) = &parent {
            args.extend(["-p", commit.as_str()]);
        }
        args.extend(["-m", message]);
        let env = [
            ("GIT_AUTHOR_NAME", signature.name.as_str()),
            ("GIT_AUTHOR_EMAIL", signature.email.as_str()),
            ("GIT_COMMITTER_NAME", signature.name.as_str()),
            ("GIT_COMMITTER_EMAIL", signature.email.as_str()),
        ];
        let commit = self.run_checked_with_env(&args, &env).await?;
        if commit.is_empty() {
            return Err(VcsError::Parse("commit-tree returned no commit id".to_string()));
        }

        self.run_checked(&["update-ref", "-m", "taproom: seed commit", "HEAD", &commit])
            .await?;
        Ok(commit)
    }

    async fn push(&self, remote: &str, refspec: &str) -> VcsResult<()> {
        self.run_checked(&["push", remote, refspec]).await?;
        Ok(())
    }

    async fn list_working_tree_files(&self) -> VcsResult<Vec<PathBuf>> {
        let mut entries = tokio::fs::read_dir(&self.workspace_root).await?;
        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                files.push(PathBuf::from(entry.file_name()));
            }
        }
        files.sort();
        Ok(files)
    }

    async fn remote_url(&self, remote: &str) -> VcsResult<String> {
        self.run_checked(&["remote", "get-url", remote]).await
    }

    async fn committer_identity(&self) -> VcsResult<CommitSignature> {
        Ok(CommitSignature {
            name: self.config_value("user.name").await?,
            email: self.config_value("user.email").await?,
        })
    }
}
