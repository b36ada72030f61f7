use crate::error::SyncError;
use config::AppConfiguration;
use operation::sync::{ProgressSink, Prompt, Sync};
use redmine::Redmine;
use report::SyncReport;
use toggl::{Credentials, Toggl};

pub mod config;
pub mod date;
pub mod error;
pub mod extract;
pub mod operation;
pub mod report;
pub mod types;

pub struct ApplicationRuntime {
    config: AppConfiguration,
    toggl: Toggl,
    redmine: Redmine,
    prompt: Box<dyn Prompt>,
    progress: Box<dyn ProgressSink>,
}

pub enum Operation {
    Sync(Sync),
}

pub enum OperationResult {
    Synchronised(SyncReport),
}

impl ApplicationRuntime {
    /// Creates a new instance of `ApplicationRuntime` from an explicit
    /// configuration plus the console collaborators of the caller.
    ///
    /// # Errors
    ///
    /// Returns an error if either client cannot be created from the
    /// configured base urls.
    pub fn new(
        config: AppConfiguration,
        prompt: Box<dyn Prompt>,
        progress: Box<dyn ProgressSink>,
    ) -> Result<Self, SyncError> {
        let toggl = Toggl::new(
            &config.toggl.url,
            Credentials::ApiToken(config.toggl.api_token.clone()),
        )?;
        let redmine = Redmine::new(&config.redmine.url, config.redmine.api_key.clone())?;

        Ok(ApplicationRuntime {
            config,
            toggl,
            redmine,
            prompt,
            progress,
        })
    }

    pub fn toggl_client(&self) -> &Toggl {
        &self.toggl
    }

    pub fn redmine_client(&self) -> &Redmine {
        &self.redmine
    }

    pub fn config(&self) -> &AppConfiguration {
        &self.config
    }

    pub(crate) fn prompt(&self) -> &dyn Prompt {
        self.prompt.as_ref()
    }

    pub(crate) fn progress(&self) -> &dyn ProgressSink {
        self.progress.as_ref()
    }

    /// Executes the specified `Operation` and returns the result.
    ///
    /// # Errors
    ///
    /// Returns a `SyncError` when the operation cannot even start, e.g.
    /// because the current Toggl user cannot be resolved. Per-entry
    /// failures are part of the returned report, not errors.
    pub async fn execute(&self, operation: Operation) -> Result<OperationResult, SyncError> {
        match operation {
            Operation::Sync(sync_cmd) => {
                let report = operation::sync::execute(self, &sync_cmd).await?;
                Ok(OperationResult::Synchronised(report))
            }
        }
    }
}
