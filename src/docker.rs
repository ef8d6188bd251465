// Docker engine contract
// Container state queries and file transfer in and out of containers

use crate::errors::{DcgossError, Result};
use crate::runner::CommandRunner;
use chrono::{DateTime, FixedOffset};
use serde::Deserialize;
use std::sync::Arc;

/// The slice of `docker inspect` state the readiness gate cares about
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContainerState {
    pub running: bool,
    pub restarting: bool,
    pub started_at: Option<DateTime<FixedOffset>>,
}

#[derive(Debug, Deserialize)]
struct InspectEntry {
    #[serde(rename = "State", default)]
    state: RawState,
}

#[derive(Debug, Deserialize, Default)]
struct RawState {
    #[serde(rename = "Running", default)]
    running: bool,
    #[serde(rename = "Restarting", default)]
    restarting: bool,
    #[serde(rename = "StartedAt")]
    started_at: Option<String>,
}

pub struct Docker {
    runner: Arc<dyn CommandRunner>,
}

impl Docker {
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// Query the current state of a container
    pub fn inspect(&self, container_id: &str) -> Result<ContainerState> {
        let args = vec!["inspect".to_string(), container_id.to_string()];
        let out = self.runner.run_captured("docker", &args)?;

        if !out.success() {
            return Err(DcgossError::DockerError(format!(
                "docker inspect failed: {}",
                out.stderr.trim()
            )));
        }

        let entries: Vec<InspectEntry> = serde_json::from_str(&out.stdout)
            .map_err(|e| DcgossError::DockerError(format!("unexpected inspect output: {}", e)))?;

        let entry = entries.into_iter().next().ok_or_else(|| {
            DcgossError::DockerError(format!("no such container: {}", container_id))
        })?;

        Ok(ContainerState {
            running: entry.state.running,
            restarting: entry.state.restarting,
            started_at: entry
                .state
                .started_at
                .as_deref()
                .and_then(|ts| DateTime::parse_from_rfc3339(ts).ok()),
        })
    }

    /// Copy files between the host and a container
    pub fn cp(&self, source: &str, target: &str) -> Result<()> {
        let args = vec!["cp".to_string(), source.to_string(), target.to_string()];
        let out = self.runner.run_captured("docker", &args)?;

        if !out.success() {
            return Err(DcgossError::DockerError(format!(
                "docker cp {} {} failed: {}",
                source,
                target,
                out.stderr.trim()
            )));
        }

        Ok(())
    }
}
