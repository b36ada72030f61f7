//! # The Toggl to Redmine Command Line Utility
//!
//! Pushes completed Toggl time entries to Redmine as time entries, one day
//! window at a time, after a single confirmation per day.
//!
//! ## Usage Examples
//!
//! First run, storing the connection settings:
//! ```bash
//! toggl2redmine https://redmine.example.com REDMINE_KEY TOGGL_TOKEN 123456 --save-config
//! ```
//!
//! Sync the last week using the stored settings:
//! ```bash
//! toggl2redmine --from-date "-7 days"
//! ```
//!
//! Sync an exact period:
//! ```bash
//! toggl2redmine --from-date 2024-01-01 --to-date 2024-01-31T18:00
//! ```
//!
//! A Toggl entry takes part in the sync when its description carries an
//! issue reference, e.g. `Fixed the flaky login test #1234`. After a
//! successful push the description becomes
//! `Fixed the flaky login test #1234 #synced[<redmine-entry-id>]`.
//!
use chrono::{DateTime, Local};
use clap::Parser;
use cli::{LogLevel, Opts};
use console::{ConsolePrompt, ConsoleProgress};
use env_logger::Env;
use log::debug;
use std::env;
use std::fs::File;
use std::process::exit;

use timesync::config::{
    self, AppConfiguration, RedmineConfiguration, TogglConfiguration,
};
use timesync::error::SyncError;
use timesync::operation::sync::Sync;
use timesync::{date, ApplicationRuntime, Operation, OperationResult};

mod cli;
mod console;

#[tokio::main]
async fn main() -> Result<(), SyncError> {
    let opts: Opts = Opts::parse();

    configure_logging(&opts); // Handles the -v option

    let config = resolve_configuration(&opts);

    if opts.save_config {
        match config::save(&config) {
            Ok(()) => println!(
                "Configuration saved to {}",
                config::configuration_file().display()
            ),
            Err(err) => eprintln!("Unable to save the configuration: {err}"),
        }
    }

    let from = parse_date_or_exit(&opts.from_date);
    let to = parse_date_or_exit(&opts.to_date);

    let runtime = get_runtime(config);
    let operation_result = runtime.execute(Operation::Sync(Sync { from, to })).await?;
    match operation_result {
        OperationResult::Synchronised(report) => {
            if report.error_count() > 0 {
                eprintln!(
                    "{} problem(s) reported above, some entries may need manual attention",
                    report.error_count()
                );
            }
        }
    }

    Ok(())
}

/// The four connection arguments either all come from the command line or
/// all from the stored configuration file.
fn resolve_configuration(opts: &Opts) -> AppConfiguration {
    match (
        &opts.redmine_url,
        &opts.redmine_api_key,
        &opts.toggl_api_key,
        opts.toggl_workspace_id,
    ) {
        (Some(redmine_url), Some(redmine_api_key), Some(toggl_api_key), Some(workspace_id)) => {
            AppConfiguration {
                toggl: TogglConfiguration {
                    url: config::default_toggl_url(),
                    api_token: toggl_api_key.clone(),
                    workspace_id,
                },
                redmine: RedmineConfiguration {
                    url: redmine_url.clone(),
                    api_key: redmine_api_key.clone(),
                },
            }
        }
        _ => match config::load() {
            Ok(config) => config,
            Err(SyncError::ApplicationConfig { .. }) => {
                eprintln!("Missing connection arguments and no configuration file found.");
                eprintln!("Run once with all four arguments and --save-config to create it.");
                exit(1);
            }
            Err(err) => {
                eprintln!("Failed to load configuration: '{err}'");
                exit(1);
            }
        },
    }
}

fn parse_date_or_exit(input: &str) -> DateTime<Local> {
    match date::str_to_date_time(input) {
        Ok(date_time) => date_time,
        Err(err) => {
            eprintln!("{err}");
            exit(1);
        }
    }
}

fn get_runtime(config: AppConfiguration) -> ApplicationRuntime {
    match ApplicationRuntime::new(
        config,
        Box::new(ConsolePrompt),
        Box::new(ConsoleProgress::new()),
    ) {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("Failed to create runtime: '{err}'");
            exit(1);
        }
    }
}

fn configure_logging(opts: &Opts) {
    let mut tmp_dir = env::temp_dir();
    tmp_dir.push("toggl2redmine.log");

    if opts.verbosity.is_some() {
        println!("Logging to {}", &tmp_dir.to_string_lossy());
    }

    let target = Box::new(File::create(tmp_dir).expect("Can't create file"));

    // If nothing else was specified in RUST_LOG, use 'warn'
    env_logger::Builder::from_env(Env::default().default_filter_or(opts.verbosity.map_or(
        "warn",
        |lvl| match lvl {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        },
    )))
    .target(env_logger::Target::Pipe(target))
    .init();
    debug!("Logging started");
}
