use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use std::process;

use dcgoss::{cli, output, signal};

#[derive(Parser)]
#[command(name = "dcgoss")]
#[command(about = "Run and edit goss test suites inside docker-compose managed containers", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the goss suite against a compose service
    Run {
        /// Compose service name
        service: String,
        /// Compose project directory (defaults to the current directory)
        path: Option<PathBuf>,
    },
    /// Start a service and edit its goss suite interactively
    Edit {
        /// Compose service name
        service: String,
        /// Compose project directory (defaults to the current directory)
        path: Option<PathBuf>,
    },
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    signal::install();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run { service, path } => cli::run::run(&service, path),
        Commands::Edit { service, path } => cli::edit::run(&service, path),
        Commands::Completions { shell } => {
            cli::completions::run(shell, &mut Cli::command()).map(|_| 0)
        }
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            output::error(&e);
            process::exit(e.exit_code());
        }
    }
}
