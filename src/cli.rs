use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "function-grafana-data")]
#[command(version)]
#[command(about = "Crossplane composition function resolving Grafana names to IDs", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run one invocation on a JSON request
    Run(RunArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Request file (reads stdin when omitted)
    #[arg(short, long, value_name = "FILE")]
    pub request: Option<PathBuf>,

    /// Response file (writes stdout when omitted)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Maximum pages fetched per listing, overriding the function input
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub max_pages: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_defaults_to_stdio() {
        let cli = Cli::try_parse_from(["function-grafana-data", "run"]).unwrap();
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert!(args.request.is_none());
        assert!(args.output.is_none());
        assert!(args.max_pages.is_none());
    }

    #[test]
    fn test_run_with_files_and_verbosity() {
        let cli = Cli::try_parse_from([
            "function-grafana-data",
            "-vv",
            "run",
            "--request",
            "req.json",
            "-o",
            "rsp.json",
            "--max-pages",
            "10",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let Command::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.request, Some(PathBuf::from("req.json")));
        assert_eq!(args.output, Some(PathBuf::from("rsp.json")));
        assert_eq!(args.max_pages, Some(10));
    }

    #[test]
    fn test_zero_max_pages_rejected() {
        assert!(
            Cli::try_parse_from(["function-grafana-data", "run", "--max-pages", "0"]).is_err()
        );
    }
}
