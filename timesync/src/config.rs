use crate::error::SyncError;
use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

/// Application configuration struct
/// Holds the data we need to connect to Toggl and Redmine
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct AppConfiguration {
    pub toggl: TogglConfiguration,
    pub redmine: RedmineConfiguration,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct TogglConfiguration {
    /// This will ensure the url is populated even if the Toml file
    /// predates the configurable endpoint
    #[serde(default = "default_toggl_url")]
    pub url: String,
    pub api_token: String,
    pub workspace_id: i64,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct RedmineConfiguration {
    pub url: String,
    pub api_key: String,
}

#[must_use]
pub fn default_toggl_url() -> String {
    "https://www.toggl.com".to_string()
}

/// Filename holding the application configuration parameters
#[must_use]
pub fn configuration_file() -> PathBuf {
    project_dirs().preference_dir().into()
}

fn project_dirs() -> ProjectDirs {
    ProjectDirs::from("com", "toggl2redmine", "toggl2redmine")
        .expect("Unable to determine the name of the 'project_dirs' directory name")
}

#[allow(clippy::missing_errors_doc)]
pub fn load() -> Result<AppConfiguration, SyncError> {
    read(&configuration_file())
}

#[allow(clippy::missing_errors_doc)]
pub fn save(cfg: &AppConfiguration) -> Result<()> {
    create_configuration_file(cfg, &configuration_file())
}

#[allow(clippy::missing_errors_doc)]
pub fn remove() -> io::Result<()> {
    fs::remove_file(configuration_file().as_path())
}

#[allow(clippy::missing_errors_doc)]
pub fn application_config_to_string(cfg: &AppConfiguration) -> Result<String> {
    Ok(toml::to_string::<AppConfiguration>(cfg)?)
}

/// Reads the `AppConfiguration` struct from the supplied TOML file
fn read(path: &Path) -> Result<AppConfiguration, SyncError> {
    let mut file = File::open(path).map_err(|source| SyncError::ApplicationConfig {
        path: path.into(),
        source,
    })?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .map_err(|source| SyncError::ApplicationConfig {
            path: path.into(),
            source,
        })?;
    toml::from_str::<AppConfiguration>(&contents).map_err(|source| SyncError::TomlParse {
        path: path.into(),
        source,
    })
}

fn create_configuration_file(cfg: &AppConfiguration, path: &PathBuf) -> Result<()> {
    let directory = path.parent().unwrap();
    if !directory.try_exists()? {
        fs::create_dir_all(directory)?;
    }

    let mut file = File::create(path)?;
    let toml = application_config_to_string(cfg)?;
    file.write_all(toml.as_bytes())?;

    Ok(())
}
