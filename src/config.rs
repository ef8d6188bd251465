// Invocation settings resolved once from CLI arguments and environment
// overrides, immutable for the rest of the run

use crate::errors::{DcgossError, Result};
use crate::output;
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Compose file names probed in the project directory, in order
const COMPOSE_FILE_NAMES: &[&str] = &[
    "compose.yaml",
    "compose.yml",
    "docker-compose.yaml",
    "docker-compose.yml",
];

const DEFAULT_RETRY_TIMEOUT: f64 = 300.0;
const DEFAULT_SLEEP_INTERVAL: f64 = 0.2;
const DEFAULT_STARTUP_WINDOW: f64 = 5.0;
const DEFAULT_GOSS_OPTS: &str = "--format=documentation";
const DEFAULT_WAIT_OPTS: &str = "--retry-timeout=30s --sleep=1s";

#[derive(Debug, Clone)]
pub struct Settings {
    /// Compose project directory (positional CLI argument, default cwd)
    pub project_dir: PathBuf,
    /// Resolved compose definition inside `project_dir`
    pub compose_file: PathBuf,
    /// Host-side goss binary that gets staged into the container
    pub goss_binary: PathBuf,
    /// Directory holding the goss spec files
    pub files_dir: PathBuf,
    /// Main spec file; must exist
    pub goss_file: PathBuf,
    /// Optional variables file
    pub vars_file: PathBuf,
    /// Optional wait spec executed before the main suite
    pub wait_file: PathBuf,
    /// Where container logs are written during teardown
    pub log_dir: PathBuf,
    /// Overall bound on the startup wait
    pub retry_timeout: Duration,
    /// Settle delay before invoking the validator
    pub sleep_interval: Duration,
    /// Window used to detect containers that crash right after starting
    pub startup_window: Duration,
    /// Extra `goss validate` arguments for the main suite
    pub goss_opts: Vec<String>,
    /// Extra `goss validate` arguments for the wait spec
    pub wait_opts: Vec<String>,
    /// Save container logs during teardown
    pub keep_logs: bool,
}

impl Settings {
    /// Resolve all settings for one invocation. Fails on a missing compose
    /// file, a missing goss file, or a missing goss binary, before any
    /// container resources are created.
    pub fn resolve(path: Option<PathBuf>) -> Result<Self> {
        let project_dir = match path {
            Some(p) => p,
            None => env::current_dir()?,
        };

        if !project_dir.is_dir() {
            return Err(DcgossError::ConfigError(format!(
                "project path '{}' is not a directory",
                project_dir.display()
            )));
        }

        let compose_file = find_compose_file(&project_dir)
            .ok_or_else(|| DcgossError::ComposeFileNotFound(project_dir.clone()))?;

        let goss_binary = match env::var_os("GOSS_PATH") {
            Some(p) => {
                let p = PathBuf::from(p);
                if !p.is_file() {
                    return Err(DcgossError::ConfigError(format!(
                        "GOSS_PATH '{}' does not exist",
                        p.display()
                    )));
                }
                p
            }
            None => find_in_path("goss").ok_or(DcgossError::GossBinaryNotFound)?,
        };

        let files_dir = env_path("GOSS_FILES_PATH").unwrap_or_else(|| project_dir.clone());
        let goss_file = env_path("GOSS_FILE").unwrap_or_else(|| files_dir.join("goss.yaml"));
        if !goss_file.is_file() {
            return Err(DcgossError::GossFileNotFound(goss_file));
        }

        let vars_file = env_path("GOSS_VARS").unwrap_or_else(|| files_dir.join("goss_vars.yaml"));
        let wait_file = env_path("GOSS_WAIT").unwrap_or_else(|| files_dir.join("goss_wait.yaml"));
        let log_dir = env_path("GOSS_LOGS").unwrap_or_else(|| files_dir.join(".goss/logs"));

        Ok(Settings {
            project_dir,
            compose_file,
            goss_binary,
            files_dir,
            goss_file,
            vars_file,
            wait_file,
            log_dir,
            retry_timeout: env_duration("GOSS_RETRY_TIMEOUT", DEFAULT_RETRY_TIMEOUT)?,
            sleep_interval: env_duration("GOSS_SLEEP", DEFAULT_SLEEP_INTERVAL)?,
            startup_window: env_duration("GOSS_INITIAL_STARTUP", DEFAULT_STARTUP_WINDOW)?,
            goss_opts: env_opts("GOSS_OPTS", DEFAULT_GOSS_OPTS)?,
            wait_opts: env_opts("GOSS_WAIT_OPTS", DEFAULT_WAIT_OPTS)?,
            keep_logs: !output::env_flag("NO_LOGS"),
        })
    }
}

/// Probe the project directory for a compose definition
fn find_compose_file(project_dir: &Path) -> Option<PathBuf> {
    COMPOSE_FILE_NAMES
        .iter()
        .map(|name| project_dir.join(name))
        .find(|candidate| candidate.is_file())
}

/// Locate a binary on PATH
fn find_in_path(binary: &str) -> Option<PathBuf> {
    let path = env::var_os("PATH")?;
    env::split_paths(&path)
        .map(|dir| dir.join(binary))
        .find(|candidate| candidate.is_file())
}

fn env_path(name: &str) -> Option<PathBuf> {
    env::var_os(name).map(PathBuf::from)
}

/// Parse an environment override as seconds (fractions allowed)
fn env_duration(name: &str, default_secs: f64) -> Result<Duration> {
    let secs = match env::var(name) {
        Ok(value) => value.parse::<f64>().map_err(|_| {
            DcgossError::ConfigError(format!("{} must be a number of seconds, got '{}'", name, value))
        })?,
        Err(_) => default_secs,
    };

    if !secs.is_finite() || secs < 0.0 {
        return Err(DcgossError::ConfigError(format!(
            "{} must be a non-negative number of seconds",
            name
        )));
    }

    Ok(Duration::from_secs_f64(secs))
}

/// Split an argument-list override with shell quoting rules
fn env_opts(name: &str, default: &str) -> Result<Vec<String>> {
    let raw = env::var(name).unwrap_or_else(|_| default.to_string());
    shell_words::split(&raw)
        .map_err(|e| DcgossError::ConfigError(format!("failed to parse {}: {}", name, e)))
}
