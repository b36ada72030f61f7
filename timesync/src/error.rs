use std::{io, path::PathBuf};

use crate::date;
use redmine::RedmineError;
use thiserror::Error;
use toggl::TogglError;

#[allow(clippy::module_name_repetitions)]
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Unable to load the application configuration file {path:?}")]
    ApplicationConfig { path: PathBuf, source: io::Error },
    #[error("Unable to parse contents of {path}")]
    TomlParse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Unable to create configuration file {path}")]
    ConfigFileCreation { path: PathBuf },
    #[error("Toggl error {0}")]
    Toggl(String),
    #[error("Redmine error {0}")]
    Redmine(String),
    #[error("Could not make sense of input: {0}")]
    BadInput(String),
    #[error("Directory creation failed")]
    CreateDir(#[from] io::Error),
}

impl From<TogglError> for SyncError {
    fn from(err: TogglError) -> Self {
        SyncError::Toggl(format!("{err}"))
    }
}

impl From<RedmineError> for SyncError {
    fn from(err: RedmineError) -> Self {
        SyncError::Redmine(format!("{err}"))
    }
}

impl From<date::Error> for SyncError {
    fn from(err: date::Error) -> Self {
        SyncError::BadInput(format!("{err}"))
    }
}

impl From<url::ParseError> for SyncError {
    fn from(err: url::ParseError) -> Self {
        SyncError::BadInput(format!("{err}"))
    }
}
