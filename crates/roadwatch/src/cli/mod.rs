//! Command-line interface for roadwatch.
//!
//! This module provides the CLI structure for the `roadwatch` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    AdvisoryArgs, ConfigCommand, DeleteCommand, ListCommand, ServeCommand, ShowCommand,
    UpdateCommand,
};

/// roadwatch - Speed advisories pinned to map locations
///
/// Stores advisories (accident sites, crowded areas, hospitals, schools) with
/// a speed limit and an optional weekly schedule, and serves them over HTTP.
#[derive(Debug, Parser)]
#[command(name = "roadwatch")]
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
    /// Run the HTTP server
    Serve(ServeCommand),

    /// Add an advisory
    Add(AdvisoryArgs),

    /// List all advisories
    List(ListCommand),

    /// Show one advisory
    Show(ShowCommand),

    /// Replace an advisory
    Update(UpdateCommand),

    /// Delete an advisory
    Delete(DeleteCommand),

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
