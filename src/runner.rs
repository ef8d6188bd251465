// Subprocess seam for the external docker and goss tooling
// Everything the sequencer spawns goes through this trait so the
// state machine can be exercised with scripted results in tests

use crate::errors::Result;
use crate::output;
use std::process::Command;

/// Captured result of an external command
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

pub trait CommandRunner: Send + Sync {
    /// Run a command with stdio inherited from the calling process and
    /// return its exit code
    fn run(&self, program: &str, args: &[String]) -> Result<i32>;

    /// Run a command with stdout and stderr captured
    fn run_captured(&self, program: &str, args: &[String]) -> Result<CommandOutput>;
}

/// Runner that spawns real processes
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

fn render_cmdline(program: &str, args: &[String]) -> String {
    let mut cmdline = vec![program.to_string()];
    cmdline.extend_from_slice(args);
    cmdline.join(" ")
}

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[String]) -> Result<i32> {
        output::debug(format!("Executing: {}", render_cmdline(program, args)));

        let status = Command::new(program).args(args).status()?;

        // A None code means the child died to a signal
        Ok(status.code().unwrap_or(1))
    }

    fn run_captured(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        output::debug(format!("Executing: {}", render_cmdline(program, args)));

        let out = Command::new(program).args(args).output()?;

        Ok(CommandOutput {
            code: out.status.code().unwrap_or(1),
            stdout: String::from_utf8_lossy(&out.stdout).to_string(),
            stderr: String::from_utf8_lossy(&out.stderr).to_string(),
        })
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::FakeRunner;
    use super::*;

    #[test]
    fn test_one_shot_responses_consumed_in_order() {
        let runner = FakeRunner::new();
        runner.on_code("inspect", 1);
        runner.on_code("inspect", 0);

        let args = vec!["inspect".to_string(), "abc".to_string()];
        assert_eq!(runner.run("docker", &args).unwrap(), 1);
        assert_eq!(runner.run("docker", &args).unwrap(), 0);
        // Queue drained, default response
        assert_eq!(runner.run("docker", &args).unwrap(), 0);
    }

    #[test]
    fn test_persistent_response_and_call_log() {
        let runner = FakeRunner::new();
        runner.always_stdout("ps --quiet", "deadbeef\n");

        let args = vec![
            "ps".to_string(),
            "--quiet".to_string(),
            "web".to_string(),
        ];
        let out = runner.run_captured("docker-compose", &args).unwrap();
        assert_eq!(out.stdout, "deadbeef\n");
        assert!(out.success());
        assert_eq!(runner.count("ps --quiet"), 1);
    }
}
