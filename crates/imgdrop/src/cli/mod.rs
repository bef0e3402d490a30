//! Command-line interface for imgdrop.
//!
//! This module provides the CLI structure for the `imgdrop` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{ConfigCommand, DownloadCommand, RecentCommand, UploadCommand};

/// imgdrop - Upload images to a compression service
///
/// Sends an image to the server, shows the result with a download link and
/// compression statistics, and lists the most recent processed images.
#[derive(Debug, Parser)]
#[command(name = "imgdrop")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Upload an image and show the result
    Upload(UploadCommand),

    /// List the most recent processed images
    Recent(RecentCommand),

    /// Save a processed image to disk
    Download(DownloadCommand),

    /// Check that the server is reachable
    Ping,

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}
