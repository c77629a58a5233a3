//! CLI command definitions and subcommands

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::host::ReadyState;

/// NPS widget - launcher and feedback form
#[derive(Parser)]
#[command(name = "nw", about = "Embeddable NPS feedback widget", version)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the origin trusted for a widget URL (`*` when malformed)
    Origin {
        /// Widget URL; defaults to the configured one
        url: Option<String>,
    },

    /// Show whether the widget was dismissed
    Status,

    /// Clear the dismissed flag so the widget auto-opens again
    Reset,

    /// Send one feedback submission to the API
    Submit {
        /// Star rating (1-5)
        rating: u8,

        /// Feedback text
        #[arg(default_value = "")]
        feedback: String,
    },

    /// Run an interactive session on stdin
    Run {
        /// Document ready state when the widget script runs
        #[arg(long, value_enum, default_value_t = ReadyArg::Complete)]
        ready: ReadyArg,
    },
}

/// Document ready state as a CLI value
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReadyArg {
    Loading,
    Interactive,
    Complete,
}

impl From<ReadyArg> for ReadyState {
    fn from(arg: ReadyArg) -> Self {
        match arg {
            ReadyArg::Loading => ReadyState::Loading,
            ReadyArg::Interactive => ReadyState::Interactive,
            ReadyArg::Complete => ReadyState::Complete,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_submit_defaults_feedback() {
        let cli = Cli::try_parse_from(["nw", "submit", "5"]).unwrap();
        match cli.command {
            Command::Submit { rating, feedback } => {
                assert_eq!(rating, 5);
                assert_eq!(feedback, "");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_run_ready_state() {
        let cli = Cli::try_parse_from(["nw", "-l", "debug", "run", "--ready", "loading"]).unwrap();
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        let Command::Run { ready } = cli.command else {
            panic!("expected run");
        };
        assert_eq!(ReadyState::from(ready), ReadyState::Loading);
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let cli = Cli::try_parse_from(["nw", "status", "--config", "/tmp/nw.yml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/nw.yml")));
    }
}
