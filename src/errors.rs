use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DcgossError {
    #[error("goss binary not found on PATH and GOSS_PATH is not set")]
    GossBinaryNotFound,

    #[error("goss file '{}' does not exist", .0.display())]
    GossFileNotFound(PathBuf),

    #[error("no compose file found in '{}'", .0.display())]
    ComposeFileNotFound(PathBuf),

    #[error("service '{0}' is not defined in '{}'", .1.display())]
    ServiceNotFound(String, PathBuf),

    #[error("compose binary not found: neither 'docker compose' nor 'docker-compose' is available")]
    ComposeBinaryNotFound,

    #[error("compose {action} failed with exit code {code}")]
    ComposeFailed { action: String, code: i32 },

    #[error("Docker error: {0}")]
    DockerError(String),

    #[error("goss file failed to render:\n{0}")]
    RenderFailed(String),

    #[error("timeout reached while waiting for container startup ({0}s)")]
    StartupTimeout(u64),

    #[error("interrupted")]
    Interrupted,

    #[error("teardown failed: {0}")]
    TeardownFailed(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DcgossError {
    /// Process exit code for this error. Validator results never pass
    /// through here; the sequencer surfaces them as plain exit codes.
    pub fn exit_code(&self) -> i32 {
        match self {
            DcgossError::Interrupted => 2,
            DcgossError::TeardownFailed(_) => 3,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, DcgossError>;
