// Orchestration sequencer
// Drives one invocation through its lifecycle: start the service, gate on
// readiness, execute or edit the goss suite inside the container, and tear
// the compose project down on every exit path

use crate::clock::{Clock, SystemClock};
use crate::compose::{self, Compose};
use crate::config::Settings;
use crate::docker::{ContainerState, Docker};
use crate::errors::{DcgossError, Result};
use crate::goss::{GossFiles, CONTAINER_DIR, GOSS_FILE_NAME, WAIT_FILE_NAME};
use crate::output;
use crate::signal;
use std::fs;
use std::sync::Arc;
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_secs(1);

pub struct Sequencer {
    settings: Settings,
    compose: Compose,
    docker: Docker,
    clock: Arc<dyn Clock>,
}

impl Sequencer {
    pub fn new(settings: Settings, compose: Compose, docker: Docker) -> Self {
        Self::with_clock(settings, compose, docker, Arc::new(SystemClock))
    }

    pub fn with_clock(
        settings: Settings,
        compose: Compose,
        docker: Docker,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            settings,
            compose,
            docker,
            clock,
        }
    }

    /// Run the goss suite against the named service. The returned code is
    /// the validator's own exit code; internal failures surface as errors.
    pub fn run(&self, service: &str) -> Result<i32> {
        self.preflight(service)?;

        let files = GossFiles::new(&self.settings);
        let mut resources = self.startup(service, &files)?;

        let outcome = self.execute_checks(service, &files);
        let teardown = resources.teardown();

        match outcome {
            Ok(code) => {
                if let Err(e) = teardown {
                    output::warn(e);
                }
                if code == 0 {
                    output::info("All goss tests passed");
                }
                Ok(code)
            }
            Err(e) => {
                if let Err(te) = teardown {
                    output::warn(te);
                }
                Err(e)
            }
        }
    }

    /// Start the service and open an interactive shell in its container
    /// with goss staged on PATH; edited specs are copied back out.
    pub fn edit(&self, service: &str) -> Result<i32> {
        self.preflight(service)?;

        let files = GossFiles::new(&self.settings);
        let mut resources = self.startup(service, &files)?;

        let outcome = self.edit_session(service, &files);
        let teardown = resources.teardown();

        match outcome {
            Ok(code) => {
                if let Err(e) = teardown {
                    output::warn(e);
                }
                Ok(code)
            }
            Err(e) => {
                if let Err(te) = teardown {
                    output::warn(te);
                }
                Err(e)
            }
        }
    }

    /// Configuration checks that run before any resource is created
    fn preflight(&self, service: &str) -> Result<()> {
        let services = compose::defined_services(&self.settings.compose_file)?;

        if !services.iter().any(|name| name == service) {
            return Err(DcgossError::ServiceNotFound(
                service.to_string(),
                self.settings.compose_file.clone(),
            ));
        }

        Ok(())
    }

    /// Bring the service up and wait until its container is ready. The
    /// returned guard owns the compose resources from the moment `up` is
    /// attempted.
    fn startup<'a>(&'a self, service: &str, files: &GossFiles) -> Result<ResourceGuard<'a>> {
        output::info("Starting up...");

        // Anything left over from a previous invocation of this project
        output::info("Removing any previous test resources...");
        self.compose.down()?;

        let resources = ResourceGuard::new(self);

        output::info(format!(
            "Starting '{}' service and any dependencies...",
            service
        ));
        self.compose.up(service)?;

        output::info(format!(
            "Waiting for '{}' service container to start...",
            service
        ));
        let container_id = self.wait_ready(service)?;

        output::info("Copying goss binary and configuration into container...");
        files.copy_in(&self.docker, &container_id)?;

        Ok(resources)
    }

    /// Readiness gate: poll until the container is running and has not
    /// restarted within the stability window. Bounded by the retry timeout.
    fn wait_ready(&self, service: &str) -> Result<String> {
        let start = self.clock.now();

        loop {
            if signal::interrupted() {
                return Err(DcgossError::Interrupted);
            }

            if self.clock.now().duration_since(start) > self.settings.retry_timeout {
                return Err(DcgossError::StartupTimeout(
                    self.settings.retry_timeout.as_secs(),
                ));
            }

            let state = match self.running_state(service)? {
                Some(state) => state,
                None => {
                    self.clock.sleep(POLL_INTERVAL);
                    continue;
                }
            };

            // Confirm the same container incarnation is still up after the
            // stability window, otherwise it is crash-looping
            self.clock.sleep(self.settings.startup_window);

            match self.running_state(service)? {
                Some(after) if after.started_at == state.started_at => {
                    if let Some(id) = self.compose.container_id(service)? {
                        return Ok(id);
                    }
                }
                _ => {}
            }
        }
    }

    /// Container state for the service, filtered to running and not restarting
    fn running_state(&self, service: &str) -> Result<Option<ContainerState>> {
        let id = match self.compose.container_id(service)? {
            Some(id) => id,
            None => return Ok(None),
        };

        let state = self.docker.inspect(&id)?;
        if state.running && !state.restarting {
            Ok(Some(state))
        } else {
            Ok(None)
        }
    }

    /// Render-check the spec, run the wait suite when present, then run the
    /// main suite once and return its exit code verbatim
    fn execute_checks(&self, service: &str, files: &GossFiles) -> Result<i32> {
        self.clock.sleep(self.settings.sleep_interval);

        output::info("Validating goss file...");
        self.render_check(service, files)?;

        if self.settings.wait_file.is_file() {
            output::info("Executing goss wait checks...");
            let code = self.validate(service, files, WAIT_FILE_NAME, &self.settings.wait_opts)?;
            if code != 0 {
                output::warn("goss wait checks failed");
                return Ok(code);
            }
        }

        output::info("Executing goss tests...");
        self.validate(service, files, GOSS_FILE_NAME, &self.settings.goss_opts)
    }

    fn render_check(&self, service: &str, files: &GossFiles) -> Result<()> {
        let mut cmd = vec![format!("{}/goss", CONTAINER_DIR)];
        cmd.extend(files.validate_args(GOSS_FILE_NAME));
        cmd.push("render".to_string());

        let out = self.compose.exec_captured(service, &cmd)?;
        if !out.success() {
            let detail = if out.stdout.trim().is_empty() {
                out.stderr
            } else {
                out.stdout
            };
            return Err(DcgossError::RenderFailed(detail.trim().to_string()));
        }

        Ok(())
    }

    fn validate(
        &self,
        service: &str,
        files: &GossFiles,
        spec_name: &str,
        opts: &[String],
    ) -> Result<i32> {
        if signal::interrupted() {
            return Err(DcgossError::Interrupted);
        }

        let mut cmd = vec![format!("{}/goss", CONTAINER_DIR)];
        cmd.extend(files.validate_args(spec_name));
        cmd.push("validate".to_string());
        cmd.extend_from_slice(opts);
        if output::env_flag("NO_COLOR") {
            cmd.push("--no-color".to_string());
        } else {
            cmd.push("--color".to_string());
        }

        self.compose.exec(service, &cmd)
    }

    fn edit_session(&self, service: &str, files: &GossFiles) -> Result<i32> {
        let container_id = self.compose.container_id(service)?.ok_or_else(|| {
            DcgossError::DockerError(format!("container for '{}' is gone", service))
        })?;

        let short_id = &container_id[..container_id.len().min(12)];
        output::info(format!(
            "Starting shell within '{}' service container ({})...",
            service, short_id
        ));
        output::info("Use 'goss add' or 'goss autoadd' to add checks and type 'exit' when ready to save.");

        let shell = format!(
            "cd {dir}; PATH=\"{dir}:$PATH\" exec sh",
            dir = CONTAINER_DIR
        );
        let cmd = vec!["sh".to_string(), "-c".to_string(), shell];
        let code = self.compose.exec_interactive(service, &cmd)?;

        output::info("Saving edited goss files...");
        files.copy_out(&self.docker, &container_id)?;

        Ok(code)
    }

    /// Stop and remove everything this invocation created. Log capture is
    /// best-effort and never fails the teardown itself.
    fn teardown_project(&self) -> Result<()> {
        output::info("Shutting down...");

        if self.settings.keep_logs {
            self.save_container_logs();
        }

        output::info("Stopping services...");
        let stop = self.compose.stop();

        output::info("Removing services and networks...");
        let down = self.compose.down();

        let mut failures = Vec::new();
        if let Err(e) = stop {
            failures.push(e.to_string());
        }
        if let Err(e) = down {
            failures.push(e.to_string());
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(DcgossError::TeardownFailed(failures.join("; ")))
        }
    }

    fn save_container_logs(&self) {
        let services = match self.compose.running_services() {
            Ok(services) => services,
            Err(e) => {
                output::warn(format!("Failed to list services for log capture: {}", e));
                return;
            }
        };

        if services.is_empty() {
            return;
        }

        output::info("Saving container logs...");
        if let Err(e) = fs::create_dir_all(&self.settings.log_dir) {
            output::warn(format!(
                "Failed to create log directory '{}': {}",
                self.settings.log_dir.display(),
                e
            ));
            return;
        }

        for service in services {
            let target = self.settings.log_dir.join(format!("{}.log", service));
            match self.compose.logs(&service) {
                Ok(content) => {
                    if let Err(e) = fs::write(&target, content) {
                        output::warn(format!("Failed to write '{}': {}", target.display(), e));
                    }
                }
                Err(e) => {
                    output::warn(format!("Failed to capture logs for '{}': {}", service, e));
                }
            }
        }
    }
}

/// Owns the Orchestrated Resource Set of one invocation. Teardown runs
/// exactly once: explicitly on the normal path so its error can be
/// captured, or on drop as the backstop for early exits.
pub struct ResourceGuard<'a> {
    sequencer: &'a Sequencer,
    torn_down: bool,
}

impl<'a> ResourceGuard<'a> {
    fn new(sequencer: &'a Sequencer) -> Self {
        Self {
            sequencer,
            torn_down: false,
        }
    }

    /// Idempotent: the second and later calls are no-ops
    pub fn teardown(&mut self) -> Result<()> {
        if self.torn_down {
            return Ok(());
        }
        self.torn_down = true;
        self.sequencer.teardown_project()
    }
}

impl Drop for ResourceGuard<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.teardown() {
            output::warn(e);
        }
    }
}
