use clap::Parser;
use std::path::PathBuf;

use crate::config::Overrides;

#[derive(Parser)]
#[command(
    name = "git-publish",
    version,
    about = "Stage, commit and push a working tree to a hosted git remote"
)]
pub struct Cli {
    /// Print a JSON report instead of the live console transcript
    #[arg(long)]
    pub json: bool,

    /// Repository directory (defaults to the current directory)
    #[arg(short = 'C', long, env = "GIT_PUBLISH_REPO_DIR")]
    pub repo_dir: Option<PathBuf>,

    /// URL the remote alias is bound to
    #[arg(long, env = "GIT_PUBLISH_REMOTE_URL")]
    pub remote_url: Option<String>,

    /// Remote alias to replace [default: origin]
    #[arg(long, env = "GIT_PUBLISH_REMOTE")]
    pub remote: Option<String>,

    /// Branch name the current branch is renamed to [default: main]
    #[arg(long, env = "GIT_PUBLISH_BRANCH")]
    pub branch: Option<String>,

    /// Commit message [default: "Initial commit"]
    #[arg(short, long, env = "GIT_PUBLISH_MESSAGE")]
    pub message: Option<String>,

    /// Git executable [default: git]
    #[arg(long, env = "GIT_PUBLISH_GIT")]
    pub git: Option<String>,

    /// Config file (defaults to the platform config directory)
    #[arg(long, env = "GIT_PUBLISH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print the commands without running them
    #[arg(long)]
    pub dry_run: bool,

    /// Emit debug diagnostics on stderr
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            repo_dir: self.repo_dir.clone(),
            remote_url: self.remote_url.clone(),
            remote: self.remote.clone(),
            branch: self.branch.clone(),
            message: self.message.clone(),
            git: self.git.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_all_flags() {
        let cli = Cli::try_parse_from([
            "git-publish",
            "-C",
            "/srv/widgets",
            "--remote-url",
            "https://example.com/acme/widgets.git",
            "--remote",
            "upstream",
            "--branch",
            "trunk",
            "-m",
            "Publish",
            "--git",
            "/usr/bin/git",
            "--dry-run",
            "--json",
        ])
        .unwrap();

        let overrides = cli.overrides();
        assert_eq!(overrides.repo_dir, Some(PathBuf::from("/srv/widgets")));
        assert_eq!(
            overrides.remote_url.as_deref(),
            Some("https://example.com/acme/widgets.git")
        );
        assert_eq!(overrides.remote.as_deref(), Some("upstream"));
        assert_eq!(overrides.branch.as_deref(), Some("trunk"));
        assert_eq!(overrides.message.as_deref(), Some("Publish"));
        assert_eq!(overrides.git.as_deref(), Some("/usr/bin/git"));
        assert!(cli.dry_run);
        assert!(cli.json);
    }

    #[test]
    fn rejects_positional_arguments() {
        assert!(Cli::try_parse_from(["git-publish", "extra"]).is_err());
    }
}
