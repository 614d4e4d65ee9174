//! CLI argument definitions using clap derive macros.

use clap::{Parser, Subcommand};

/// Batch-scrape CBSE school affiliation directory pages into CSV.
///
/// Affdir fetches one directory page per affiliation number with a
/// bounded worker pool, extracts the school's fields, and writes the
/// accumulated records as a fixed-schema CSV file.
#[derive(Parser, Debug)]
#[command(name = "affdir")]
#[command(author, version, about)]
pub struct Cli {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scrape a list of affiliation numbers and write a CSV file
    Run {
        /// Comma-separated affiliation numbers
        affnos: String,

        /// Output filename (.csv appended when missing)
        #[arg(short, long, default_value = "schools")]
        output: String,

        /// Maximum concurrent fetches (1-100)
        #[arg(short = 'c', long, default_value_t = 20, value_parser = clap::value_parser!(u8).range(1..=100))]
        workers: u8,

        /// Override the directory endpoint (testing)
        #[arg(long)]
        base_url: Option<String>,

        /// Disable the progress bar
        #[arg(long)]
        no_progress: bool,
    },

    /// Serve the submit/progress/download HTTP surface
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value_t = 5000)]
        port: u16,

        /// Maximum concurrent fetches (1-100)
        #[arg(short = 'c', long, default_value_t = 20, value_parser = clap::value_parser!(u8).range(1..=100))]
        workers: u8,

        /// Override the directory endpoint (testing)
        #[arg(long)]
        base_url: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_run_parses_affnos_and_defaults() {
        let cli = Cli::try_parse_from(["affdir", "run", "100,200"]).unwrap();
        match cli.command {
            Command::Run {
                affnos,
                output,
                workers,
                base_url,
                no_progress,
            } => {
                assert_eq!(affnos, "100,200");
                assert_eq!(output, "schools");
                assert_eq!(workers, 20);
                assert!(base_url.is_none());
                assert!(!no_progress);
            }
            Command::Serve { .. } => panic!("expected run subcommand"),
        }
    }

    #[test]
    fn test_cli_run_custom_output_and_workers() {
        let cli =
            Cli::try_parse_from(["affdir", "run", "1", "-o", "out", "-c", "5"]).unwrap();
        match cli.command {
            Command::Run {
                output, workers, ..
            } => {
                assert_eq!(output, "out");
                assert_eq!(workers, 5);
            }
            Command::Serve { .. } => panic!("expected run subcommand"),
        }
    }

    #[test]
    fn test_cli_workers_out_of_range_rejected() {
        let result = Cli::try_parse_from(["affdir", "run", "1", "-c", "0"]);
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().kind(),
            clap::error::ErrorKind::ValueValidation
        );

        let result = Cli::try_parse_from(["affdir", "run", "1", "-c", "101"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_serve_defaults() {
        let cli = Cli::try_parse_from(["affdir", "serve"]).unwrap();
        match cli.command {
            Command::Serve { port, workers, .. } => {
                assert_eq!(port, 5000);
                assert_eq!(workers, 20);
            }
            Command::Run { .. } => panic!("expected serve subcommand"),
        }
    }

    #[test]
    fn test_cli_verbose_flag_is_global() {
        let cli = Cli::try_parse_from(["affdir", "run", "1", "-v"]).unwrap();
        assert_eq!(cli.verbose, 1);

        let cli = Cli::try_parse_from(["affdir", "-vv", "serve"]).unwrap();
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_cli_missing_subcommand_is_error() {
        let result = Cli::try_parse_from(["affdir"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let result = Cli::try_parse_from(["affdir", "--help"]);
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().kind(),
            clap::error::ErrorKind::DisplayHelp
        );
    }
}
