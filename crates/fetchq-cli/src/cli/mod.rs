//! CLI for the fetchq download queue.

mod commands;
mod control_socket;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use fetchq_core::config;
use std::path::PathBuf;

use commands::{
    run_add, run_clear, run_completions, run_control, run_man, run_queue, run_status,
    ControlCommand,
};

/// Top-level CLI for fetchq.
#[derive(Debug, Parser)]
#[command(name = "fetchq")]
#[command(about = "fetchq: resolve download pages and fetch the files, one link at a time", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Add page links to the queue.
    Add {
        /// Page URLs (http/https). Anything else is ignored.
        urls: Vec<String>,

        /// Read links from a text file (every http/https URL in it).
        #[arg(long, value_name = "PATH")]
        file: Option<PathBuf>,
    },

    /// Process every pending link, in order.
    Run {
        /// Save files here instead of the configured download directory.
        #[arg(long, value_name = "DIR")]
        download_dir: Option<PathBuf>,
    },

    /// Show the queue with each link's status.
    Status,

    /// Remove every link from the queue.
    Clear,

    /// Pause the running queue (`fetchq run` in another terminal).
    Pause,

    /// Resume a paused queue.
    Resume,

    /// Stop the running queue after abandoning the current item.
    Stop,

    /// Print a shell completion script.
    Completions {
        /// Target shell.
        shell: Shell,
    },

    /// Print the man page (roff) to stdout.
    Man,
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();

        match cli.command {
            CliCommand::Add { urls, file } => run_add(&urls, file.as_deref())?,
            CliCommand::Run { download_dir } => {
                let cfg = config::load_or_init()?;
                tracing::debug!("loaded config: {:?}", cfg);
                let dir = download_dir.unwrap_or_else(|| cfg.effective_download_dir());
                run_queue(&cfg, dir).await?;
            }
            CliCommand::Status => run_status()?,
            CliCommand::Clear => run_clear()?,
            CliCommand::Pause => run_control(ControlCommand::Pause).await?,
            CliCommand::Resume => run_control(ControlCommand::Resume).await?,
            CliCommand::Stop => run_control(ControlCommand::Stop).await?,
            CliCommand::Completions { shell } => run_completions(shell, &mut Cli::command()),
            CliCommand::Man => run_man(Cli::command())?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
