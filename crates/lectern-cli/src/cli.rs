//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser};

use crate::commands::Command;

/// Sign in to a lectern server and call its API.
#[derive(Parser, Debug)]
#[command(name = "lectern")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output logs as JSON
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every command.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// API base URL
    #[arg(
        long,
        global = true,
        env = "LECTERN_BASE_URL",
        default_value = "https://api.lectern.app"
    )]
    pub base_url: String,

    /// Directory holding the stored session
    #[arg(long, global = true, env = "LECTERN_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Seconds to wait for a credential refresh before giving up
    #[arg(long, global = true, default_value_t = 30)]
    pub refresh_timeout: u64,
}
