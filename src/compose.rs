// Compose CLI contract
// Builds and runs docker-compose invocations pinned to one project
// namespace so concurrent runs against different projects stay isolated

use crate::config::Settings;
use crate::errors::{DcgossError, Result};
use crate::output;
use crate::runner::{CommandOutput, CommandRunner};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Compose command variant
#[derive(Debug, Clone, Copy)]
enum ComposeVariant {
    /// Modern `docker compose` (subcommand of docker)
    Subcommand,
    /// Legacy `docker-compose` (standalone binary)
    Hyphenated,
}

/// One compose project scoped to the invocation's project directory
pub struct Compose {
    runner: Arc<dyn CommandRunner>,
    variant: ComposeVariant,
    project_name: String,
    project_dir: PathBuf,
    compose_file: PathBuf,
}

impl std::fmt::Debug for Compose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compose")
            .field("variant", &self.variant)
            .field("project_name", &self.project_name)
            .field("project_dir", &self.project_dir)
            .field("compose_file", &self.compose_file)
            .finish()
    }
}

impl Compose {
    pub fn new(settings: &Settings, runner: Arc<dyn CommandRunner>) -> Result<Self> {
        let variant = detect_variant(runner.as_ref())?;

        Ok(Self {
            runner,
            variant,
            project_name: project_name_for(&settings.project_dir),
            project_dir: settings.project_dir.clone(),
            compose_file: settings.compose_file.clone(),
        })
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    /// Assemble a full compose command line for the given operation
    fn command(&self, op_args: &[String]) -> (String, Vec<String>) {
        let (program, mut args) = match self.variant {
            ComposeVariant::Subcommand => ("docker".to_string(), vec!["compose".to_string()]),
            ComposeVariant::Hyphenated => ("docker-compose".to_string(), Vec::new()),
        };

        if output::env_flag("NO_COLOR") {
            match self.variant {
                ComposeVariant::Subcommand => {
                    args.push("--ansi".to_string());
                    args.push("never".to_string());
                }
                ComposeVariant::Hyphenated => args.push("--no-ansi".to_string()),
            }
        }

        args.push("--project-name".to_string());
        args.push(self.project_name.clone());
        args.push("--project-directory".to_string());
        args.push(self.project_dir.to_string_lossy().to_string());
        args.push("--file".to_string());
        args.push(self.compose_file.to_string_lossy().to_string());
        args.extend_from_slice(op_args);

        (program, args)
    }

    /// Run an operation with inherited stdio, mapping nonzero exit to an error
    fn run_checked(&self, action: &str, op_args: &[String]) -> Result<()> {
        let (program, args) = self.command(op_args);
        let code = self.runner.run(&program, &args)?;

        if code != 0 {
            return Err(DcgossError::ComposeFailed {
                action: action.to_string(),
                code,
            });
        }

        Ok(())
    }

    /// Build or start the service and its dependencies, detached
    pub fn up(&self, service: &str) -> Result<()> {
        self.run_checked(
            "up",
            &[
                "up".to_string(),
                "--detach".to_string(),
                service.to_string(),
            ],
        )
    }

    /// Stop all project services
    pub fn stop(&self) -> Result<()> {
        self.run_checked("stop", &["stop".to_string()])
    }

    /// Remove project containers, networks and volumes
    pub fn down(&self) -> Result<()> {
        self.run_checked("down", &["down".to_string(), "--volumes".to_string()])
    }

    /// Exec a non-interactive command inside the service container and
    /// return its exit code verbatim
    pub fn exec(&self, service: &str, cmd: &[String]) -> Result<i32> {
        let mut op_args = vec!["exec".to_string(), "-T".to_string(), service.to_string()];
        op_args.extend_from_slice(cmd);

        let (program, args) = self.command(&op_args);
        self.runner.run(&program, &args)
    }

    /// Exec a non-interactive command and capture its output
    pub fn exec_captured(&self, service: &str, cmd: &[String]) -> Result<CommandOutput> {
        let mut op_args = vec!["exec".to_string(), "-T".to_string(), service.to_string()];
        op_args.extend_from_slice(cmd);

        let (program, args) = self.command(&op_args);
        self.runner.run_captured(&program, &args)
    }

    /// Exec with a TTY and inherited stdio, for interactive sessions
    pub fn exec_interactive(&self, service: &str, cmd: &[String]) -> Result<i32> {
        let mut op_args = vec!["exec".to_string(), service.to_string()];
        op_args.extend_from_slice(cmd);

        let (program, args) = self.command(&op_args);
        self.runner.run(&program, &args)
    }

    /// Container logs for one service
    pub fn logs(&self, service: &str) -> Result<String> {
        let op_args = vec![
            "logs".to_string(),
            "--no-color".to_string(),
            service.to_string(),
        ];
        let (program, args) = self.command(&op_args);
        let out = self.runner.run_captured(&program, &args)?;

        if !out.success() {
            return Err(DcgossError::ComposeFailed {
                action: "logs".to_string(),
                code: out.code,
            });
        }

        Ok(out.stdout)
    }

    /// Names of the project's running services
    pub fn running_services(&self) -> Result<Vec<String>> {
        let op_args = vec!["ps".to_string(), "--services".to_string()];
        let (program, args) = self.command(&op_args);
        let out = self.runner.run_captured(&program, &args)?;

        if !out.success() {
            return Ok(Vec::new());
        }

        Ok(out
            .stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Container ID for a service, if one has been created
    pub fn container_id(&self, service: &str) -> Result<Option<String>> {
        let op_args = vec![
            "ps".to_string(),
            "--quiet".to_string(),
            service.to_string(),
        ];
        let (program, args) = self.command(&op_args);
        let out = self.runner.run_captured(&program, &args)?;

        if !out.success() {
            return Ok(None);
        }

        let id = out.stdout.trim();
        if id.is_empty() {
            Ok(None)
        } else {
            Ok(Some(id.to_string()))
        }
    }
}

/// Prefer modern `docker compose`, fall back to legacy `docker-compose`
fn detect_variant(runner: &dyn CommandRunner) -> Result<ComposeVariant> {
    let probe = |program: &str, args: &[String]| {
        runner
            .run_captured(program, args)
            .map(|out| out.success())
            .unwrap_or(false)
    };

    if probe(
        "docker",
        &["compose".to_string(), "version".to_string()],
    ) {
        return Ok(ComposeVariant::Subcommand);
    }

    if probe("docker-compose", &["version".to_string()]) {
        return Ok(ComposeVariant::Hyphenated);
    }

    Err(DcgossError::ComposeBinaryNotFound)
}

/// Derive the compose project name from the project directory.
/// Compose project names must be lowercase alphanumeric with hyphens and
/// cannot start or end with a hyphen.
pub fn project_name_for(project_dir: &Path) -> String {
    let raw = project_dir
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default();

    let sanitized = raw
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect::<String>();

    let sanitized = sanitized
        .trim_matches('-')
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    if sanitized.is_empty() {
        "goss".to_string()
    } else {
        format!("goss-{}", sanitized)
    }
}

#[derive(Debug, Deserialize)]
struct ComposeDefinition {
    #[serde(default)]
    services: BTreeMap<String, serde_yml::Value>,
}

/// Service names defined in a compose file
pub fn defined_services(compose_file: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(compose_file)?;
    let definition: ComposeDefinition = serde_yml::from_str(&content).map_err(|e| {
        DcgossError::ConfigError(format!(
            "failed to parse '{}': {}",
            compose_file.display(),
            e
        ))
    })?;

    Ok(definition.services.into_keys().collect())
}
