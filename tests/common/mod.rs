/// Common test utilities for dcgoss integration tests
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// A compose project rooted in a temporary directory
#[allow(dead_code)]
pub struct TestProject {
    pub temp_dir: TempDir,
    pub project_path: PathBuf,
}

#[allow(dead_code)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub exit_code: Option<i32>,
}

impl TestProject {
    /// Create an empty project directory
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let project_path = temp_dir.path().join("project");
        std::fs::create_dir(&project_path).expect("Failed to create project directory");

        TestProject {
            temp_dir,
            project_path,
        }
    }

    /// Create a project with a compose file defining a `web` service,
    /// a goss file and a stub goss binary
    pub fn with_web_service() -> Self {
        let project = Self::new();
        project.write_compose("services:\n  web:\n    image: nginx\n");
        project.write_goss_file("port:\n  tcp:80:\n    listening: true\n");
        project.write_goss_binary();
        project
    }

    #[allow(dead_code)]
    pub fn path(&self) -> &Path {
        &self.project_path
    }

    pub fn write_compose(&self, content: &str) {
        std::fs::write(self.project_path.join("docker-compose.yml"), content)
            .expect("Failed to write compose file");
    }

    pub fn write_goss_file(&self, content: &str) {
        std::fs::write(self.project_path.join("goss.yaml"), content)
            .expect("Failed to write goss file");
    }

    /// Write a stub goss binary so binary resolution succeeds without a
    /// real goss install
    pub fn write_goss_binary(&self) {
        let path = self.project_path.join("goss");
        std::fs::write(&path, "#!/bin/sh\nexit 0\n").expect("Failed to write goss stub");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
                .expect("Failed to mark goss stub executable");
        }
    }

    pub fn goss_binary(&self) -> PathBuf {
        self.project_path.join("goss")
    }

    /// Run dcgoss in this project directory
    pub fn dcgoss(&self, args: &[&str]) -> CommandResult {
        self.dcgoss_with_env(args, &[])
    }

    /// Run dcgoss with extra environment variables set
    pub fn dcgoss_with_env(&self, args: &[&str], env: &[(&str, &str)]) -> CommandResult {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_dcgoss"));
        cmd.args(args)
            .current_dir(&self.project_path)
            .env("GOSS_PATH", self.goss_binary());

        for (key, value) in env {
            cmd.env(key, value);
        }

        let output = cmd.output().expect("Failed to execute dcgoss");

        CommandResult {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            exit_code: output.status.code(),
        }
    }
}
