#![cfg(test)]

use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

use crate::config::{PublishConfig, DEFAULT_BRANCH, DEFAULT_GIT, DEFAULT_MESSAGE, DEFAULT_REMOTE};
use crate::runner::{CommandResult, Runner};

pub fn args(tokens: &[&str]) -> Vec<String> {
    tokens.iter().map(|t| t.to_string()).collect()
}

pub struct TestEnv {
    dir: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        std::fs::create_dir_all(dir.path().join("src")).unwrap();
        std::fs::create_dir_all(dir.path().join("remotes")).unwrap();
        Self { dir }
    }

    /// Initializes an empty repository with a local identity so commits made
    /// by the publisher do not depend on the user's global git config.
    pub fn init_repo(&self, name: &str) -> PathBuf {
        let repo_path = self.dir.path().join("src").join(name);
        std::fs::create_dir_all(&repo_path).unwrap();

        run_git(&repo_path, &["init"]);
        run_git(&repo_path, &["config", "user.name", "Test"]);
        run_git(&repo_path, &["config", "user.email", "test@test.com"]);
        run_git(&repo_path, &["config", "commit.gpgsign", "false"]);

        repo_path
    }

    pub fn create_repo(&self, name: &str) -> PathBuf {
        let repo_path = self.init_repo(name);
        run_git(&repo_path, &["commit", "--allow-empty", "-m", "initial"]);
        repo_path
    }

    pub fn create_bare_repo(&self, name: &str) -> PathBuf {
        let path = self.dir.path().join("remotes").join(format!("{}.git", name));
        std::fs::create_dir_all(&path).unwrap();
        run_git(&path, &["init", "--bare"]);
        path
    }

    pub fn write_file(&self, repo: &Path, file: &str, contents: &str) {
        std::fs::write(repo.join(file), contents).expect("failed to write file");
    }

    pub fn missing_remote(&self) -> PathBuf {
        self.dir.path().join("remotes").join("missing.git")
    }
}

pub fn run_git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim_end().to_string()
}

pub fn config_for(repo_dir: &Path, remote_url: &str) -> PublishConfig {
    PublishConfig {
        repo_dir: repo_dir.to_path_buf(),
        git: DEFAULT_GIT.to_string(),
        remote: DEFAULT_REMOTE.to_string(),
        remote_url: remote_url.to_string(),
        branch: DEFAULT_BRANCH.to_string(),
        message: DEFAULT_MESSAGE.to_string(),
    }
}

/// In-memory runner that records every invocation and fails the ones whose
/// arguments (after the program) start with a registered prefix.
pub struct ScriptedRunner {
    pub calls: Vec<Vec<String>>,
    failures: Vec<(Vec<String>, i32)>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn fail_on(mut self, prefix: &[&str], status: i32) -> Self {
        self.failures.push((args(prefix), status));
        self
    }
}

impl Runner for ScriptedRunner {
    fn run(&mut self, argv: &[String]) -> CommandResult {
        self.calls.push(argv.to_vec());

        let rest = argv.get(1..).unwrap_or_default();
        let status = self
            .failures
            .iter()
            .find(|(prefix, _)| rest.starts_with(prefix))
            .map_or(0, |(_, status)| *status);

        CommandResult {
            args: argv.to_vec(),
            stdout: String::new(),
            stderr: if status == 0 {
                String::new()
            } else {
                "simulated failure".to_string()
            },
            status,
        }
    }
}
