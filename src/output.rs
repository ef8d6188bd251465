// Leveled diagnostics for the CLI
// Info goes to stdout, warnings and errors to stderr

use colored::Colorize;
use std::env;
use std::fmt::Display;

/// Check whether an environment flag is set to a truthy value
pub fn env_flag(name: &str) -> bool {
    matches!(
        env::var(name).unwrap_or_default().to_lowercase().as_str(),
        "1" | "true"
    )
}

pub fn info(msg: impl Display) {
    println!("{}: {}", "INFO".cyan(), msg);
}

pub fn warn(msg: impl Display) {
    eprintln!("{}: {}", "WARNING".yellow(), msg);
}

pub fn error(msg: impl Display) {
    eprintln!("{}: {}", "ERROR".red(), msg);
}

/// Only emitted when the DEBUG environment flag is set
pub fn debug(msg: impl Display) {
    if env_flag("DEBUG") {
        println!("{}: {}", "DEBUG".purple(), msg);
    }
}
