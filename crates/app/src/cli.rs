//! Command line definitions for the `wikirc` binary

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Announce wiki changes on IRC.
#[derive(Parser)]
#[command(name = "wikirc", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Settings file (defaults to the platform config directory).
    #[arg(long, short = 'c', global = true, env = "WIKIRC_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Wiki database, overriding the settings file.
    #[arg(long, global = true, env = "WIKIRC_DATABASE")]
    pub database: Option<PathBuf>,

    /// Detailed output (-v for debug, -vv for trace). RUST_LOG wins when set.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the bot configuration stored in the wiki.
    Config,

    /// List notification listeners declared in the wiki.
    #[command(alias = "ls")]
    Listeners,

    /// Connect to IRC and announce changes until interrupted.
    Run,
}
