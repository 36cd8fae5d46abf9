//! Application orchestration and command routing.
//!
//! Handles command-line argument parsing and delegates to appropriate command handlers.

use crate::commands;
use crate::logging;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use std::process;

/// A terminal recording practice tool: read a quote aloud, record it, play it back
#[derive(Parser)]
#[command(name = "earwitness")]
#[command(version)]
#[command(about = "Terminal recording practice: read a quote aloud, record it, play it back")]
#[command(
    long_about = "earwitness shows a ~10-second quote to read aloud, records your voice\nfrom a selectable microphone, and plays the clip back with seek and volume\ncontrol.\n\nDEFAULT COMMAND:\n    If no command is specified, 'record' is used by default.\n\nEXAMPLES:\n    # Start a practice session\n    $ earwitness\n    $ earwitness record\n\n    # Print a quote to read\n    $ earwitness quote\n\n    # See which microphones are available\n    $ earwitness list-devices\n\n    # Edit configuration file\n    $ earwitness config"
)]
#[command(
    after_help = "CONFIGURATION:\n    Config file:        ~/.config/earwitness/earwitness.toml\n    Logs:               ~/.local/state/earwitness/earwitness.log.*\n    Saved clips:        ~/.local/share/earwitness/"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the interactive recording practice session (default)
    ///
    /// Press 'r' to start/stop recording, Space to play/pause the clip,
    /// arrow keys to seek and pick a microphone, 'n' for a new quote,
    /// 's' to save the clip, 'q' to quit.
    #[command(visible_alias = "r")]
    Record,

    /// Print a random practice quote to stdout
    Quote,

    /// List available audio input devices
    ///
    /// Shows device IDs, names, and configurations to help configure
    /// the correct input device in earwitness.toml.
    #[command(name = "list-devices")]
    ListDevices,

    /// Open configuration file in your preferred editor
    ///
    /// Edit audio and playback settings.
    /// Uses $EDITOR environment variable or falls back to nano/vim.
    #[command(visible_alias = "c")]
    Config,

    /// Show recent log entries from the application
    ///
    /// Display the last 50 lines of the most recent log file.
    /// Useful for troubleshooting issues.
    Logs,

    /// Generate shell completion script
    ///
    /// Generate completion script for your shell. Save the output to your
    /// shell's completion directory or source it directly.
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Runs the main application based on command-line arguments.
///
/// # Errors
/// - If logging initialization fails
/// - If command execution fails
pub async fn run() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    // Handle commands that don't need logging setup
    match &cli.command {
        Some(Commands::Completions { shell }) => {
            generate(*shell, &mut Cli::command(), "earwitness", &mut io::stdout());
            return Ok(());
        }
        Some(Commands::Quote) => {
            return commands::handle_quote();
        }
        Some(Commands::ListDevices) => {
            return match commands::handle_list_devices() {
                Ok(()) => Ok(()),
                Err(e) => {
                    eprintln!("Error: {e}");
                    process::exit(1);
                }
            };
        }
        Some(Commands::Logs) => {
            return match commands::handle_logs() {
                Ok(()) => Ok(()),
                Err(e) => {
                    eprintln!("Error: {e}");
                    process::exit(1);
                }
            };
        }
        _ => {}
    }

    // Initialize logging for all other commands
    logging::init_logging()?;

    match cli.command {
        None | Some(Commands::Record) => {
            commands::handle_record().await?;
        }
        Some(Commands::Config) => {
            commands::handle_config()?;
        }
        Some(Commands::Quote)
        | Some(Commands::ListDevices)
        | Some(Commands::Logs)
        | Some(Commands::Completions { .. }) => {
            unreachable!("These commands are handled earlier")
        }
    }

    Ok(())
}
