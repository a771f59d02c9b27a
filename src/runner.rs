use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// Status reported when a process could not be launched or exited without a code.
pub const FAILURE_STATUS: i32 = 1;

/// Captured outcome of one external invocation.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CommandResult {
    pub args: Vec<String>,
    pub stdout: String,
    pub stderr: String,
    pub status: i32,
}

impl CommandResult {
    pub fn success(&self) -> bool {
        self.status == 0
    }

    pub fn command_line(&self) -> String {
        self.args.join(" ")
    }
}

/// Runs one command to completion. Never fails: a non-zero exit or a launch
/// failure is reported through [`CommandResult::status`].
pub trait Runner {
    fn run(&mut self, args: &[String]) -> CommandResult;
}

/// Launches real processes in a fixed working directory and echoes each
/// invocation, its stdout and its stderr to `out`.
pub struct ProcessRunner<W: Write> {
    cwd: PathBuf,
    out: W,
}

impl<W: Write> ProcessRunner<W> {
    pub fn new(cwd: impl Into<PathBuf>, out: W) -> Self {
        Self {
            cwd: cwd.into(),
            out,
        }
    }

    #[cfg(test)]
    pub fn into_writer(self) -> W {
        self.out
    }

    // Console echo is best effort; a closed stdout must not change the status.
    fn echo(&mut self, text: &str) {
        let _ = writeln!(self.out, "{}", text);
    }
}

impl<W: Write> Runner for ProcessRunner<W> {
    fn run(&mut self, args: &[String]) -> CommandResult {
        let mut result = CommandResult {
            args: args.to_vec(),
            stdout: String::new(),
            stderr: String::new(),
            status: FAILURE_STATUS,
        };

        let Some((program, rest)) = args.split_first() else {
            self.echo("Error: no command given");
            return result;
        };

        tracing::debug!(
            program = %program,
            args = ?rest,
            cwd = %self.cwd.display(),
            "launching"
        );

        let output = Command::new(program)
            .args(rest)
            .current_dir(&self.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output();

        self.echo(&format!("\n>>> {}", result.command_line()));

        let output = match output {
            Ok(output) => output,
            Err(e) => {
                tracing::debug!(program = %program, error = %e, "launch failed");
                self.echo(&format!("Error: failed to run {}: {}", program, e));
                return result;
            }
        };

        result.stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        result.stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        result.status = output.status.code().unwrap_or(FAILURE_STATUS);

        if !result.stdout.trim().is_empty() {
            let stdout = result.stdout.trim_end().to_string();
            self.echo(&stdout);
        }
        if !result.stderr.trim().is_empty() {
            let stderr = format!("STDERR: {}", result.stderr.trim_end());
            self.echo(&stderr);
        }

        tracing::debug!(
            command = %result.command_line(),
            status = result.status,
            signaled = output.status.code().is_none(),
            "exited"
        );

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{args, TestEnv};
    use std::path::Path;

    fn run_in(dir: &Path, tokens: &[&str]) -> (CommandResult, String) {
        let mut runner = ProcessRunner::new(dir, Vec::new());
        let result = runner.run(&args(tokens));
        let echoed = String::from_utf8(runner.into_writer()).unwrap();
        (result, echoed)
    }

    #[test]
    fn run_captures_stdout_and_status() {
        let env = TestEnv::new();
        let repo = env.create_repo("test-repo");
        let (result, echoed) = run_in(&repo, &["git", "status"]);
        assert_eq!(result.status, 0);
        assert!(result.success());
        assert!(!result.stdout.is_empty());
        assert!(echoed.contains(">>> git status"));
        assert!(echoed.contains(result.stdout.trim_end()));
    }

    #[test]
    fn run_uses_working_directory() {
        let env = TestEnv::new();
        let repo = env.create_repo("test-repo");
        let (result, _) = run_in(&repo, &["git", "rev-parse", "--show-toplevel"]);
        assert_eq!(result.status, 0);
        assert_eq!(
            std::fs::canonicalize(result.stdout.trim()).unwrap(),
            std::fs::canonicalize(&repo).unwrap()
        );
    }

    #[test]
    fn run_returns_nonzero_status_without_error() {
        let env = TestEnv::new();
        let repo = env.create_repo("test-repo");
        let (result, echoed) = run_in(&repo, &["git", "remote", "remove", "origin"]);
        assert_ne!(result.status, 0);
        assert!(!result.stderr.is_empty());
        assert!(echoed.contains("STDERR: "), "stderr should be echoed: {}", echoed);
    }

    #[test]
    fn run_missing_executable_returns_failure_status() {
        let tmp = tempfile::tempdir().unwrap();
        let (result, echoed) =
            run_in(tmp.path(), &["git-publish-no-such-binary", "status"]);
        assert_eq!(result.status, FAILURE_STATUS);
        assert!(result.stdout.is_empty());
        assert!(echoed.contains("Error: failed to run git-publish-no-such-binary"));
    }

    #[test]
    fn run_missing_working_directory_returns_failure_status() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("gone");
        let (result, echoed) = run_in(&missing, &["git", "status"]);
        assert_eq!(result.status, FAILURE_STATUS);
        assert!(echoed.contains("Error:"));
    }

    #[test]
    fn run_empty_args_returns_failure_status() {
        let tmp = tempfile::tempdir().unwrap();
        let (result, echoed) = run_in(tmp.path(), &[]);
        assert_eq!(result.status, FAILURE_STATUS);
        assert!(echoed.contains("no command given"));
    }

    #[test]
    fn command_line_joins_tokens() {
        let result = CommandResult {
            args: args(&["git", "commit", "-m", "Initial commit"]),
            stdout: String::new(),
            stderr: String::new(),
            status: 0,
        };
        assert_eq!(result.command_line(), "git commit -m Initial commit");
    }
}
