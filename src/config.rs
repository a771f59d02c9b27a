use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::paths::expand_path;

pub const APP_NAME: &str = "git-publish";

pub const DEFAULT_GIT: &str = "git";
pub const DEFAULT_REMOTE: &str = "origin";
pub const DEFAULT_BRANCH: &str = "main";
pub const DEFAULT_MESSAGE: &str = "Initial commit";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub publish: PublishSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PublishSection {
    #[serde(default)]
    pub remote_url: Option<String>,
    #[serde(default)]
    pub remote: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub git: Option<String>,
}

/// Values supplied on the command line or through the environment.
/// Anything left `None` falls back to the config file, then to the defaults.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub repo_dir: Option<PathBuf>,
    pub remote_url: Option<String>,
    pub remote: Option<String>,
    pub branch: Option<String>,
    pub message: Option<String>,
    pub git: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PublishConfig {
    pub repo_dir: PathBuf,
    pub git: String,
    pub remote: String,
    pub remote_url: String,
    pub branch: String,
    pub message: String,
}

pub fn default_config_path() -> Result<PathBuf> {
    let proj = directories::ProjectDirs::from("", "", APP_NAME)
        .context("could not determine config directory")?;
    Ok(proj.config_dir().join("config.toml"))
}

/// Loads the config file. An explicit path must exist; the default path is
/// optional and yields an empty config when absent.
pub fn load_config_file(explicit: Option<&Path>) -> Result<ConfigFile> {
    if let Some(path) = explicit {
        let path = expand_path(path);
        if !path.exists() {
            bail!("config not found at {}", path.display());
        }
        return load_config(&path);
    }

    let path = default_config_path()?;
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(ConfigFile::default());
    }
    load_config(&path)
}

pub fn load_config(path: &Path) -> Result<ConfigFile> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config from {}", path.display()))?;
    parse_config(&contents).with_context(|| format!("invalid config at {}", path.display()))
}

pub fn parse_config(contents: &str) -> Result<ConfigFile> {
    toml::from_str(contents).context("failed to parse config TOML")
}

pub fn resolve(overrides: Overrides, file: ConfigFile) -> Result<PublishConfig> {
    let repo_dir = match overrides.repo_dir {
        Some(dir) => expand_path(&dir),
        None => std::env::current_dir().context("failed to determine current directory")?,
    };
    if !repo_dir.is_dir() {
        bail!("repository directory {} does not exist", repo_dir.display());
    }

    let section = file.publish;

    let Some(remote_url) = overrides.remote_url.or(section.remote_url) else {
        bail!(
            "no remote URL configured\nHint: pass --remote-url <url>, set GIT_PUBLISH_REMOTE_URL, or add remote_url under [publish] in the config file"
        );
    };

    let config = PublishConfig {
        repo_dir,
        git: non_empty("git", overrides.git.or(section.git), DEFAULT_GIT)?,
        remote: non_empty("remote", overrides.remote.or(section.remote), DEFAULT_REMOTE)?,
        remote_url: non_empty("remote URL", Some(remote_url), "")?,
        branch: non_empty("branch", overrides.branch.or(section.branch), DEFAULT_BRANCH)?,
        message: overrides
            .message
            .or(section.message)
            .unwrap_or_else(|| DEFAULT_MESSAGE.to_string()),
    };

    debug_assert!(config.repo_dir.is_dir(), "repo_dir must be a directory");

    Ok(config)
}

fn non_empty(label: &str, value: Option<String>, default: &str) -> Result<String> {
    let value = value.unwrap_or_else(|| default.to_string());
    if value.trim().is_empty() {
        bail!("{} must not be empty", label);
    }
    Ok(value)
}
