//! Command-line interface.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// sabwatch - TV episode feed watcher for SABnzbd
#[derive(Parser)]
#[command(name = "sabwatch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file to use instead of the search path
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check every feed once and print the summary
    #[command(alias = "-c", alias = "--check")]
    Check {
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run as background daemon with scheduler
    #[command(alias = "-d", alias = "--daemon")]
    Daemon,

    /// Show how a release title is parsed
    #[command(alias = "p")]
    Parse {
        /// Raw release title
        #[arg(required = true)]
        title: Vec<String>,

        /// Feed site the title comes from (e.g. newzbin)
        #[arg(long)]
        site: Option<String>,
    },

    /// List the current download queue
    #[command(alias = "q")]
    Queue,

    /// Create default config file
    #[command(alias = "--init")]
    Init,
}

pub use commands::*;
