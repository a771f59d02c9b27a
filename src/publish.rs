//! The fixed publish sequence.
//!
//! Every step runs exactly once, in order, whatever the earlier steps
//! returned. Only the push decides the outcome; other failures are either
//! expected, ignored, or reported as warnings.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;

use crate::config::PublishConfig;
use crate::runner::{CommandResult, Runner};

const RULE_WIDTH: usize = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Status,
    StageAll,
    Commit,
    RenameBranch,
    RemoveRemote,
    AddRemote,
    ListRemotes,
    ShowLastCommit,
    Push,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailurePolicy {
    /// Output is for the operator only.
    Informational,
    /// Failure is normal, e.g. removing a remote that was never added.
    Expected,
    /// Failure is reported and the sequence carries on.
    Recoverable,
    /// Failure fails the publish.
    Decisive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StepOutcome {
    Ok,
    Ignored,
    Expected,
    Warning,
    Failed,
}

impl Step {
    pub const PLAN: [Step; 9] = [
        Step::Status,
        Step::StageAll,
        Step::Commit,
        Step::RenameBranch,
        Step::RemoveRemote,
        Step::AddRemote,
        Step::ListRemotes,
        Step::ShowLastCommit,
        Step::Push,
    ];

    /// Full argument list, program first.
    pub fn args(self, config: &PublishConfig) -> Vec<String> {
        let tail: Vec<&str> = match self {
            Step::Status => vec!["status"],
            Step::StageAll => vec!["add", "."],
            Step::Commit => vec!["commit", "-m", config.message.as_str()],
            Step::RenameBranch => vec!["branch", "-M", config.branch.as_str()],
            Step::RemoveRemote => vec!["remote", "remove", config.remote.as_str()],
            Step::AddRemote => vec![
                "remote",
                "add",
                config.remote.as_str(),
                config.remote_url.as_str(),
            ],
            Step::ListRemotes => vec!["remote", "-v"],
            Step::ShowLastCommit => vec!["log", "--oneline", "-n", "1"],
            Step::Push => vec!["push", "-u", config.remote.as_str(), config.branch.as_str()],
        };

        std::iter::once(config.git.as_str())
            .chain(tail)
            .map(str::to_string)
            .collect()
    }

    fn policy(self) -> FailurePolicy {
        match self {
            Step::Status | Step::ListRemotes | Step::ShowLastCommit => {
                FailurePolicy::Informational
            }
            Step::RemoveRemote => FailurePolicy::Expected,
            Step::StageAll | Step::Commit | Step::RenameBranch | Step::AddRemote => {
                FailurePolicy::Recoverable
            }
            Step::Push => FailurePolicy::Decisive,
        }
    }

    fn outcome(self, result: &CommandResult) -> StepOutcome {
        if result.success() {
            return StepOutcome::Ok;
        }
        match self.policy() {
            FailurePolicy::Informational => StepOutcome::Ignored,
            FailurePolicy::Expected => StepOutcome::Expected,
            FailurePolicy::Recoverable => StepOutcome::Warning,
            FailurePolicy::Decisive => StepOutcome::Failed,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    pub step: Step,
    pub result: CommandResult,
    pub outcome: StepOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublishReport {
    pub repo_dir: PathBuf,
    pub remote: String,
    pub remote_url: String,
    pub branch: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub steps: Vec<StepReport>,
    pub pushed: bool,
}

impl PublishReport {
    pub fn warnings(&self) -> impl Iterator<Item = &StepReport> {
        self.steps
            .iter()
            .filter(|s| s.outcome == StepOutcome::Warning)
    }

    pub fn push_status(&self) -> Option<i32> {
        self.steps
            .iter()
            .find(|s| s.step == Step::Push)
            .map(|s| s.result.status)
    }
}

#[derive(Debug, Serialize)]
pub struct PlanResult {
    pub repo_dir: PathBuf,
    pub commands: Vec<PlannedCommand>,
}

#[derive(Debug, Serialize)]
pub struct PlannedCommand {
    pub step: Step,
    pub args: Vec<String>,
}

pub fn plan(config: &PublishConfig) -> PlanResult {
    PlanResult {
        repo_dir: config.repo_dir.clone(),
        commands: Step::PLAN
            .iter()
            .map(|&step| PlannedCommand {
                step,
                args: step.args(config),
            })
            .collect(),
    }
}

pub fn format_plan_human(result: &PlanResult) -> String {
    let mut lines = vec![format!(
        "Dry run in {}, would run:",
        result.repo_dir.display()
    )];
    for command in &result.commands {
        lines.push(format!("  {}", command.args.join(" ")));
    }
    lines.join("\n")
}

/// Runs the plan against `runner`, writing section banners, warnings and the
/// final indicator to `out`. Console writes are best effort: once the first
/// command has run, a closed `out` must not cut the sequence short.
pub fn publish<R, W>(runner: &mut R, config: &PublishConfig, out: &mut W) -> PublishReport
where
    R: Runner + ?Sized,
    W: Write + ?Sized,
{
    let started_at = Utc::now();
    say(out, format_args!("Project directory: {}", config.repo_dir.display()));

    let mut steps = Vec::with_capacity(Step::PLAN.len());
    for step in Step::PLAN {
        write_section(out, step, config);

        let result = runner.run(&step.args(config));
        let outcome = step.outcome(&result);
        tracing::debug!(
            step = ?step,
            status = result.status,
            outcome = ?outcome,
            "step finished"
        );

        if outcome == StepOutcome::Warning {
            if step == Step::Commit {
                say(out, format_args!("warning: commit failed or nothing to commit"));
            } else {
                say(
                    out,
                    format_args!(
                        "warning: `{}` failed (exit {})",
                        result.command_line(),
                        result.status
                    ),
                );
            }
        }

        steps.push(StepReport {
            step,
            result,
            outcome,
        });
    }

    debug_assert_eq!(steps.len(), Step::PLAN.len());

    let pushed = steps
        .iter()
        .any(|s| s.step == Step::Push && s.outcome == StepOutcome::Ok);

    if pushed {
        say(
            out,
            format_args!(
                "\n✓ Successfully pushed {} to {}",
                config.branch, config.remote
            ),
        );
    } else {
        say(
            out,
            format_args!("\n✗ Push failed - check authentication and try again"),
        );
    }

    PublishReport {
        repo_dir: config.repo_dir.clone(),
        remote: config.remote.clone(),
        remote_url: config.remote_url.clone(),
        branch: config.branch.clone(),
        started_at,
        finished_at: Utc::now(),
        steps,
        pushed,
    }
}

fn say<W: Write + ?Sized>(out: &mut W, line: std::fmt::Arguments<'_>) {
    if let Err(e) = writeln!(out, "{}", line) {
        tracing::debug!(error = %e, "console write failed");
    }
}

fn write_section<W>(out: &mut W, step: Step, config: &PublishConfig)
where
    W: Write + ?Sized,
{
    let rule = "=".repeat(RULE_WIDTH);
    match step {
        Step::RemoveRemote => say(out, format_args!("\n{}", rule)),
        Step::ListRemotes => say(out, format_args!("\n{}\nFINAL STATUS\n{}", rule, rule)),
        Step::Push => say(
            out,
            format_args!(
                "\n{}\nPUSHING TO {}...\n{}",
                rule,
                config.remote.to_uppercase(),
                rule
            ),
        ),
        _ => {}
    }
}
