mod cli;
mod clients;
mod commands;
mod config;
mod dispatch;
mod error;
mod function;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use std::io;

/// Global context for the application
pub struct Context {
    pub quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    // Logs go to stderr; stdout carries the response.
    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .target(env_logger::Target::Stderr)
        .init();

    let ctx = Context { quiet: cli.quiet };

    match cli.command {
        Command::Run(args) => commands::run::run(&ctx, args),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "function-grafana-data", &mut io::stdout());
            Ok(())
        }
    }
}
