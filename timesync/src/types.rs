use toggl::models::TimeEntry;

/// A completed, unsynced time entry paired with the issue id extracted
/// from its description. Lives only for the duration of one batch.
#[derive(Debug, Clone)]
pub struct SyncCandidate {
    pub entry: TimeEntry,
    pub issue_id: i64,
}

/// Outcome for one time entry in one run.
///
/// `SyncFailed` carries a human-readable reason. A failure to tag the
/// Toggl entry after the Redmine record was created uses the distinct
/// reason `"toggl update failed"`, since that case leaves an orphaned
/// record behind that an operator may want to clean up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncResult {
    Synced(i64),
    AlreadySynced,
    NoIssueFound,
    SyncFailed(String),
}
