use crate::errors::Result;
use clap_complete::{generate, Shell};
use std::io;

/// Print a completion script for the given shell to stdout
///
/// ```bash
/// eval "$(dcgoss completions bash)"
/// ```
pub fn run(shell: Shell, cmd: &mut clap::Command) -> Result<()> {
    let name = cmd.get_name().to_string();
    generate(shell, cmd, name, &mut io::stdout());
    Ok(())
}
