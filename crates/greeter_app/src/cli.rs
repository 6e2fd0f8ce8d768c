//! Command-line definitions for the `greeter` binary.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "greeter")]
#[command(about = "Walks a job list and sends a generated greeting to each posting")]
#[command(version)]
pub(crate) struct Cli {
    /// RON config file (defaults to ./greeter.ron when present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Base URL of the greeting backend
    #[arg(long, env = "GREETER_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Directory holding the persisted run state and auth token
    #[arg(long, env = "GREETER_STATE_DIR", global = true)]
    pub state_dir: Option<PathBuf>,

    /// Log destination: terminal, file or both
    #[arg(long, env = "GREETER_LOG", global = true)]
    pub log: Option<String>,

    /// Log level: error, warn, info, debug or trace
    #[arg(long, env = "GREETER_LOG_LEVEL", global = true)]
    pub log_level: Option<String>,

    /// RON file overriding the site's locator catalog
    #[arg(long, global = true)]
    pub profile: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Commands {
    /// Store the backend auth token
    Login {
        #[arg(long, env = "GREETER_TOKEN", hide_env_values = true)]
        token: String,
    },

    /// Forget the stored auth token
    Logout,

    /// Show the persisted run, if any
    Status,

    /// Show today's remaining submissions
    Quota,

    /// Delete the persisted run
    Reset,

    /// Start a run on a captured list page
    Start {
        /// Number of jobs to greet
        #[arg(long)]
        count: u32,

        /// Custom category tab, zero-based; -1 keeps the recommended tab
        #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
        tab: i32,

        #[command(flatten)]
        page: PageArgs,

        /// Accept a reduced job count without asking
        #[arg(short, long)]
        yes: bool,
    },

    /// Run one page load against a captured page
    Step {
        #[command(flatten)]
        page: PageArgs,
    },
}

#[derive(clap::Args, Debug)]
pub(crate) struct PageArgs {
    /// URL the page was captured from
    #[arg(long)]
    pub url: String,

    /// Saved HTML of the page
    #[arg(long)]
    pub html: PathBuf,
}
