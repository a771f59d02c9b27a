mod cli;
mod config;
mod paths;
mod publish;
mod runner;
mod testutil;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use std::io::Write;
use tracing_subscriber::EnvFilter;

use runner::ProcessRunner;

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: Cli) -> Result<()> {
    let file = config::load_config_file(cli.config.as_deref())?;
    let config = config::resolve(cli.overrides(), file)?;
    tracing::debug!(
        repo_dir = %config.repo_dir.display(),
        remote = %config.remote,
        branch = %config.branch,
        "resolved config"
    );

    if cli.dry_run {
        let result = publish::plan(&config);
        return output(&result, cli.json, publish::format_plan_human);
    }

    // The live transcript is the human output; JSON mode reports at the end instead.
    let console = || -> Box<dyn Write> {
        if cli.json {
            Box::new(std::io::sink())
        } else {
            Box::new(std::io::stdout())
        }
    };

    let mut runner = ProcessRunner::new(&config.repo_dir, console());
    let mut out = console();
    let report = publish::publish(&mut runner, &config, &mut out);
    let _ = out.flush();
    tracing::debug!(
        push_status = ?report.push_status(),
        warnings = report.warnings().count(),
        "publish finished"
    );

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    }
    if !report.pushed {
        std::process::exit(1);
    }
    Ok(())
}

fn output<T: serde::Serialize>(result: &T, json: bool, human_fn: fn(&T) -> String) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else {
        let text = human_fn(result);
        if !text.is_empty() {
            println!("{}", text);
        }
    }
    Ok(())
}
