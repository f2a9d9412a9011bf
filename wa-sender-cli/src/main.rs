//! wa-sender CLI
//!
//! Sends personalized WhatsApp Web messages to every pending row of a CSV
//! sheet, or a single scheduled message entered interactively.
//!
//! Usage:
//!   wa-sender guests.csv                   # Send to every 'Not Send' row
//!   wa-sender bulk guests.csv --delay 20   # Same, 20 seconds between messages
//!   wa-sender send                         # One message, asked on stdin

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::*;
use tracing::error;

mod commands;
mod logging;

use commands::{BulkCommand, SendCommand};

#[derive(Parser, Debug)]
#[command(name = "wa-sender", version)]
#[command(about = "📨 wa-sender - bulk WhatsApp Web messages from a CSV sheet")]
#[command(args_conflicts_with_subcommands = true)]
#[command(
    after_help = "A sheet named 'bulk' or 'send' is read as a command; pass it as `wa-sender bulk send` or `wa-sender ./send`."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    bulk: BulkCommand,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Send the message to every pending row of a sheet (the default)
    Bulk(BulkCommand),
    /// Send one message to a contact or group at a chosen time
    Send(SendCommand),
}

impl Cli {
    fn run(self) -> Result<()> {
        match self.command {
            Some(Commands::Bulk(bulk)) => bulk.execute(),
            Some(Commands::Send(send)) => send.execute(),
            None => self.bulk.execute(),
        }
    }
}

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    logging::init();

    match cli.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::path::PathBuf;

    #[test]
    fn bare_source_runs_bulk() {
        let cli = Cli::try_parse_from(["wa-sender", "guests.csv"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.bulk.source, Some(PathBuf::from("guests.csv")));
    }

    #[test]
    fn bulk_subcommand_takes_flags() {
        let cli = Cli::try_parse_from([
            "wa-sender",
            "bulk",
            "guests.csv",
            "--delay",
            "2.5",
            "--template",
            "invite.txt",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Bulk(bulk)) => {
                assert_eq!(bulk.source, Some(PathBuf::from("guests.csv")));
                assert_eq!(bulk.delay, Some(2.5));
                assert_eq!(bulk.template, Some(PathBuf::from("invite.txt")));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn send_subcommand_parses() {
        let cli = Cli::try_parse_from(["wa-sender", "send"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Send(_))));
    }

    #[test]
    fn sheet_named_like_a_command_needs_the_bulk_prefix() {
        let cli = Cli::try_parse_from(["wa-sender", "send"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Send(_))));

        let cli = Cli::try_parse_from(["wa-sender", "bulk", "send"]).unwrap();
        match cli.command {
            Some(Commands::Bulk(bulk)) => assert_eq!(bulk.source, Some(PathBuf::from("send"))),
            other => panic!("unexpected command: {other:?}"),
        }

        let cli = Cli::try_parse_from(["wa-sender", "./send"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.bulk.source, Some(PathBuf::from("./send")));

        let help = Cli::command().render_long_help().to_string();
        assert!(help.contains("wa-sender bulk send"));
    }

    #[test]
    fn two_sheets_conflict() {
        assert!(Cli::try_parse_from(["wa-sender", "a.csv", "b.csv"]).is_err());
    }

    #[test]
    fn missing_source_is_reported_at_run_time() {
        let cli = Cli::try_parse_from(["wa-sender"]).unwrap();
        assert!(cli.bulk.source.is_none());
        let err = cli.run().unwrap_err();
        assert!(err.to_string().contains("no recipient sheet given"));
    }

    #[test]
    fn missing_file_fails() {
        let cli = Cli::try_parse_from(["wa-sender", "/nonexistent/guests.csv"]).unwrap();
        let err = cli.run().unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn non_numeric_delay_is_rejected() {
        assert!(Cli::try_parse_from(["wa-sender", "guests.csv", "--delay", "soon"]).is_err());
    }
}
