use crate::compose::Compose;
use crate::config::Settings;
use crate::docker::Docker;
use crate::errors::Result;
use crate::runner::SystemRunner;
use crate::sequencer::Sequencer;
use std::path::PathBuf;
use std::sync::Arc;

/// Start a service and open an interactive goss editing session inside its
/// container. The returned code mirrors the session's result.
pub fn run(service: &str, path: Option<PathBuf>) -> Result<i32> {
    let settings = Settings::resolve(path)?;
    let runner = Arc::new(SystemRunner);

    let compose = Compose::new(&settings, runner.clone())?;
    let docker = Docker::new(runner);

    Sequencer::new(settings, compose, docker).edit(service)
}
