use clap::{Parser, Subcommand};

/// Top-level CLI entry point for the convergence engine.
#[derive(Parser, Debug)]
#[command(
    name = "converge",
    about = "Declarative personal-machine configuration engine",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Preview package and extension changes without applying them
    #[arg(short = 'd', long, global = true)]
    pub dry_run: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Converge this machine toward the description in machine.rs
    Apply,
    /// Print version information
    Version,
}
