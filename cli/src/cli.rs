use std::fmt::{self, Formatter};

use clap::{Parser, ValueEnum};

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
pub(crate) enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

#[derive(Parser)]
/// Toggl to Redmine synchronisation utility
///
/// Fetches completed Toggl time entries for the requested period, day by
/// day, and pushes every entry carrying an issue reference like `#1234` in
/// its description to Redmine as a time entry. Successfully pushed entries
/// are tagged with `#synced[<id>]` on the Toggl side so a later run skips
/// them.
///
/// Dates may be given as `2024-01-31`, `2024-01-31T08:00`, `08:00`,
/// `now`, `today`, `yesterday` or `-1 day`. Local timezone is always
/// assumed.
///
/// The connection arguments can be omitted once they have been stored
/// with `--save-config`.
#[command(author, version, about)] // Read from Cargo.toml
pub(crate) struct Opts {
    /// Provide the URL for the redmine installation
    pub redmine_url: Option<String>,
    /// The API key for accessing the redmine API
    pub redmine_api_key: Option<String>,
    /// API token for accessing the toggl API
    pub toggl_api_key: Option<String>,
    /// Workspace ID to get time entries from
    pub toggl_workspace_id: Option<i64>,

    /// From date to get time entries from
    #[arg(long, default_value = "-1 day", allow_hyphen_values = true)]
    pub from_date: String,
    /// To date to get time entries from
    #[arg(long, default_value = "now", allow_hyphen_values = true)]
    pub to_date: String,
    /// Store the supplied connection arguments in the configuration file
    #[arg(long)]
    pub save_config: bool,

    #[arg(short, long)]
    pub verbosity: Option<LogLevel>,
}
