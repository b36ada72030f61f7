//! Reconciles Toggl time entries against Redmine, one day window at a
//! time: fetch, filter, classify, ask once, then push each queued entry
//! and tag the source entry with the sync marker.

use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate};
use log::debug;

use crate::error::SyncError;
use crate::report::{Severity, SyncReport};
use crate::types::{SyncCandidate, SyncResult};
use crate::{date, extract, ApplicationRuntime};
use redmine::models::CreatedTimeEntry;
use redmine::{Redmine, RedmineError};
use toggl::models::{TimeEntry, User};
use toggl::{Toggl, TogglError};

/// Recorded on updated Toggl entries so their origin can be traced.
const CREATED_WITH: &str = "toggl2redmine";

/// Reason used when the Redmine record was created but tagging the Toggl
/// entry failed. That case leaves an orphaned Redmine record behind; the
/// distinct wording lets an operator spot it.
const TOGGL_UPDATE_FAILED: &str = "toggl update failed";

pub struct Sync {
    pub from: DateTime<Local>,
    pub to: DateTime<Local>,
}

// Trait for the Toggl client operations needed by this module
#[async_trait]
pub trait TimeTracker {
    async fn current_user(&self) -> Result<User, TogglError>;
    async fn time_entries(
        &self,
        start: DateTime<Local>,
        end: DateTime<Local>,
    ) -> Result<Vec<TimeEntry>, TogglError>;
    async fn update_time_entry(&self, entry: &TimeEntry) -> Result<TimeEntry, TogglError>;
}

// Implement the trait for the concrete Toggl client
#[async_trait]
impl TimeTracker for Toggl {
    async fn current_user(&self) -> Result<User, TogglError> {
        self.current_user().await
    }

    async fn time_entries(
        &self,
        start: DateTime<Local>,
        end: DateTime<Local>,
    ) -> Result<Vec<TimeEntry>, TogglError> {
        self.time_entries(start, end).await
    }

    async fn update_time_entry(&self, entry: &TimeEntry) -> Result<TimeEntry, TogglError> {
        self.update_time_entry(entry).await
    }
}

// Trait for the Redmine client operations needed by this module
#[async_trait]
pub trait TimeSink {
    async fn create_time_entry(
        &self,
        issue_id: i64,
        spent_on: NaiveDate,
        hours: f64,
        comments: &str,
    ) -> Result<CreatedTimeEntry, RedmineError>;
}

#[async_trait]
impl TimeSink for Redmine {
    async fn create_time_entry(
        &self,
        issue_id: i64,
        spent_on: NaiveDate,
        hours: f64,
        comments: &str,
    ) -> Result<CreatedTimeEntry, RedmineError> {
        self.create_time_entry(issue_id, spent_on, hours, comments)
            .await
    }
}

/// One yes/no question per day window. Implementations must default to no.
pub trait Prompt {
    fn confirm(&self, message: &str) -> bool;
}

/// Live per-entry output: lifecycle calls bracketing a batch of known
/// size, plus one line per processed entry.
pub trait ProgressSink {
    fn start(&self, len: u64);
    fn advance(&self);
    fn finish(&self);
    fn line(&self, severity: Severity, text: &str);
}

/// Keeps the entries belonging to the given user and workspace that have
/// been completed. Running entries are never touched. Order is preserved.
#[must_use]
pub fn filter_entries(entries: Vec<TimeEntry>, user_id: i64, workspace_id: i64) -> Vec<TimeEntry> {
    entries
        .into_iter()
        .filter(|entry| entry.uid == user_id && entry.is_completed() && entry.wid == workspace_id)
        .collect()
}

/// Converts a duration to decimal hours the way Redmine expects them,
/// rounded to two decimals.
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn hours_from_seconds(seconds: i64) -> f64 {
    (seconds as f64 / 3600.0 * 100.0).round() / 100.0
}

fn emit(report: &mut SyncReport, progress: &dyn ProgressSink, severity: Severity, text: String) {
    progress.line(severity, &text);
    report.push(severity, text);
}

/// Sorts filtered entries into sync candidates and skipped entries.
/// Skipped entries get their report line here; candidates are reported
/// when they are actually processed.
pub(crate) fn classify(
    entries: &[TimeEntry],
    report: &mut SyncReport,
    progress: &dyn ProgressSink,
) -> (Vec<SyncCandidate>, Vec<SyncResult>) {
    let mut candidates = Vec::new();
    let mut skipped = Vec::new();

    for entry in entries {
        let description = entry.description.as_deref().unwrap_or("");
        match extract::extract_issue_id(description) {
            None => {
                emit(
                    report,
                    progress,
                    Severity::Error,
                    format!("{}:\t {description}\t (No issue id found)", entry.id),
                );
                skipped.push(SyncResult::NoIssueFound);
            }
            Some(issue_id) if extract::is_marked_synced(description) => {
                emit(
                    report,
                    progress,
                    Severity::Info,
                    format!("{}:\t {description}\t (Issue #{issue_id} : SYNCED)", entry.id),
                );
                skipped.push(SyncResult::AlreadySynced);
            }
            Some(issue_id) => {
                emit(
                    report,
                    progress,
                    Severity::Comment,
                    format!("{}:\t {description}\t (Issue #{issue_id})", entry.id),
                );
                candidates.push(SyncCandidate {
                    entry: entry.clone(),
                    issue_id,
                });
            }
        }
    }

    (candidates, skipped)
}

/// Asks once for the whole batch, then pushes the candidates one at a
/// time, in input order. A failed candidate never stops the rest of the
/// batch. An empty batch asks nothing.
pub(crate) async fn confirm_and_sync(
    tracker: &dyn TimeTracker,
    sink: &dyn TimeSink,
    prompt: &dyn Prompt,
    progress: &dyn ProgressSink,
    report: &mut SyncReport,
    candidates: Vec<SyncCandidate>,
) -> Vec<SyncResult> {
    if candidates.is_empty() {
        emit(report, progress, Severity::Info, "All entries synced".to_string());
        return Vec::new();
    }

    let question = format!("{} entries not synced. Process now? [y]", candidates.len());
    if !prompt.confirm(&question) {
        emit(report, progress, Severity::Error, "Sync aborted.".to_string());
        return Vec::new();
    }

    let mut results = Vec::with_capacity(candidates.len());
    progress.start(candidates.len() as u64);
    for candidate in &candidates {
        let result = sync_time_entry(tracker, sink, report, progress, candidate).await;
        results.push(result);
        progress.advance();
    }
    progress.finish();
    results
}

/// Pushes a single candidate: create the Redmine record, verify it got an
/// id, then tag the Toggl entry. The Redmine record is not rolled back
/// when the tagging fails.
async fn sync_time_entry(
    tracker: &dyn TimeTracker,
    sink: &dyn TimeSink,
    report: &mut SyncReport,
    progress: &dyn ProgressSink,
    candidate: &SyncCandidate,
) -> SyncResult {
    let entry = &candidate.entry;
    let description = entry.description.clone().unwrap_or_default();
    let hours = hours_from_seconds(entry.duration);
    let spent_on = entry.start.date_naive();

    let created = match sink
        .create_time_entry(candidate.issue_id, spent_on, hours, &description)
        .await
    {
        Ok(created) => created,
        Err(e) => {
            emit(
                report,
                progress,
                Severity::Error,
                format!(
                    "SYNC failed for {}: {description}\t (Issue #{})\t{e}",
                    entry.id, candidate.issue_id
                ),
            );
            return SyncResult::SyncFailed(e.to_string());
        }
    };

    let Some(record_id) = created.id else {
        let reason = "no time entry id returned".to_string();
        emit(
            report,
            progress,
            Severity::Error,
            format!(
                "SYNC failed for {}: {description}\t (Issue #{})\t{reason}",
                entry.id, candidate.issue_id
            ),
        );
        return SyncResult::SyncFailed(reason);
    };

    let mut updated = entry.clone();
    updated.description = Some(format!("{description} {}", extract::synced_marker(record_id)));
    updated.created_with = Some(CREATED_WITH.to_string());

    match tracker.update_time_entry(&updated).await {
        Ok(_) => {
            emit(
                report,
                progress,
                Severity::Info,
                format!(
                    "Synced {} to issue #{} as Redmine entry {record_id}",
                    entry.id, candidate.issue_id
                ),
            );
            SyncResult::Synced(record_id)
        }
        Err(e) => {
            debug!("update of toggl entry {} failed: {e}", entry.id);
            emit(
                report,
                progress,
                Severity::Error,
                format!(
                    "Updating toggl entry {} failed: {}",
                    entry.id,
                    updated.description.as_deref().unwrap_or("")
                ),
            );
            SyncResult::SyncFailed(TOGGL_UPDATE_FAILED.to_string())
        }
    }
}

/// Runs the whole reconciliation: resolves the current user once, then
/// walks the day windows of the requested range.
///
/// # Errors
///
/// Only the initial user lookup is fatal. Everything after that is
/// reported per window or per entry and the run continues.
pub async fn execute(
    runtime: &ApplicationRuntime,
    instructions: &Sync,
) -> Result<SyncReport, SyncError> {
    let tracker: &dyn TimeTracker = runtime.toggl_client();
    let sink: &dyn TimeSink = runtime.redmine_client();
    let prompt = runtime.prompt();
    let progress = runtime.progress();
    let workspace_id = runtime.config().toggl.workspace_id;

    let mut report = SyncReport::new();

    let current_user = tracker.current_user().await?;
    debug!("current toggl user id {}", current_user.id);

    for (day_from, day_to) in date::day_windows(instructions.from, instructions.to) {
        emit(
            &mut report,
            progress,
            Severity::Info,
            format!(
                "Time entries for {} to {}",
                day_from.format("%a %d.%m.%Y %H:%M"),
                day_to.format("%H:%M")
            ),
        );

        let entries = match tracker.time_entries(day_from, day_to).await {
            Ok(entries) => entries,
            Err(e) => {
                emit(
                    &mut report,
                    progress,
                    Severity::Error,
                    format!("Unable to fetch time entries: {e}"),
                );
                continue;
            }
        };
        let entries = filter_entries(entries, current_user.id, workspace_id);

        if entries.is_empty() {
            emit(&mut report, progress, Severity::Comment, "No entries given.".to_string());
            continue;
        }
        emit(
            &mut report,
            progress,
            Severity::Info,
            format!("{} entries given.", entries.len()),
        );

        let (candidates, _skipped) = classify(&entries, &mut report, progress);
        confirm_and_sync(tracker, sink, prompt, progress, &mut report, candidates).await;
    }

    emit(&mut report, progress, Severity::Info, "Finished.".to_string());
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use mockall::mock;

    mock! {
        pub TimeTrackerImpl {}

        #[async_trait]
        impl TimeTracker for TimeTrackerImpl {
            async fn current_user(&self) -> Result<User, TogglError>;
            async fn time_entries(
                &self,
                start: DateTime<Local>,
                end: DateTime<Local>,
            ) -> Result<Vec<TimeEntry>, TogglError>;
            async fn update_time_entry(&self, entry: &TimeEntry) -> Result<TimeEntry, TogglError>;
        }
    }

    mock! {
        pub TimeSinkImpl {}

        #[async_trait]
        impl TimeSink for TimeSinkImpl {
            async fn create_time_entry(
                &self,
                issue_id: i64,
                spent_on: NaiveDate,
                hours: f64,
                comments: &str,
            ) -> Result<CreatedTimeEntry, RedmineError>;
        }
    }

    mock! {
        pub PromptImpl {}

        impl Prompt for PromptImpl {
            fn confirm(&self, message: &str) -> bool;
        }
    }

    struct NoProgress;

    impl ProgressSink for NoProgress {
        fn start(&self, _len: u64) {}
        fn advance(&self) {}
        fn finish(&self) {}
        fn line(&self, _severity: Severity, _text: &str) {}
    }

    fn test_entry(id: i64, description: Option<&str>, duration: i64) -> TimeEntry {
        let start = Local.with_ymd_and_hms(2024, 1, 15, 9, 0, 0).unwrap();
        TimeEntry {
            id,
            description: description.map(String::from),
            duration,
            start,
            stop: Some(start + chrono::Duration::seconds(duration)),
            uid: 7,
            wid: 11,
            created_with: None,
        }
    }

    fn candidate(id: i64, description: &str, duration: i64, issue_id: i64) -> SyncCandidate {
        SyncCandidate {
            entry: test_entry(id, Some(description), duration),
            issue_id,
        }
    }

    fn created(id: Option<i64>) -> CreatedTimeEntry {
        CreatedTimeEntry {
            id,
            hours: None,
            spent_on: None,
            comments: None,
        }
    }

    #[test]
    fn filter_keeps_only_own_completed_workspace_entries() {
        let mut running = test_entry(1, Some("running #1"), -1);
        running.stop = None;
        let mut foreign_user = test_entry(2, Some("other user #2"), 60);
        foreign_user.uid = 99;
        let mut foreign_workspace = test_entry(3, Some("other workspace #3"), 60);
        foreign_workspace.wid = 99;
        let keep_a = test_entry(4, Some("mine #4"), 60);
        let keep_b = test_entry(5, None, 60);

        let filtered = filter_entries(
            vec![
                running,
                keep_a.clone(),
                foreign_user,
                foreign_workspace,
                keep_b.clone(),
            ],
            7,
            11,
        );

        assert_eq!(filtered, vec![keep_a, keep_b]);
    }

    #[test]
    fn classify_routes_entries() {
        let entries = vec![
            test_entry(1, Some("work on #42"), 3600),
            test_entry(2, Some("work on #43 #synced[9]"), 3600),
            test_entry(3, Some("no reference"), 3600),
            test_entry(4, None, 3600),
        ];
        let mut report = SyncReport::new();

        let (candidates, skipped) = classify(&entries, &mut report, &NoProgress);

        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].entry.id, 1);
        assert_eq!(candidates[0].issue_id, 42);
        assert_eq!(
            skipped,
            vec![
                SyncResult::AlreadySynced,
                SyncResult::NoIssueFound,
                SyncResult::NoIssueFound,
            ]
        );
        assert_eq!(report.count(Severity::Comment), 1);
        assert_eq!(report.count(Severity::Info), 1);
        assert_eq!(report.error_count(), 2);
    }

    #[tokio::test]
    async fn empty_batch_never_prompts() {
        let tracker = MockTimeTrackerImpl::new();
        let sink = MockTimeSinkImpl::new();
        // No expectation on the prompt: any call would panic.
        let prompt = MockPromptImpl::new();
        let mut report = SyncReport::new();

        let results =
            confirm_and_sync(&tracker, &sink, &prompt, &NoProgress, &mut report, vec![]).await;

        assert!(results.is_empty());
        assert_eq!(report.lines().last().unwrap().text, "All entries synced");
    }

    #[tokio::test]
    async fn declined_confirmation_mutates_nothing() {
        // Tracker and sink carry no expectations, so any remote call panics.
        let tracker = MockTimeTrackerImpl::new();
        let sink = MockTimeSinkImpl::new();
        let mut prompt = MockPromptImpl::new();
        prompt
            .expect_confirm()
            .withf(|message: &str| message.contains("2 entries"))
            .times(1)
            .returning(|_| false);
        let mut report = SyncReport::new();

        let candidates = vec![
            candidate(1, "work on #42", 3600, 42),
            candidate(2, "work on #43", 1800, 43),
        ];
        let results =
            confirm_and_sync(&tracker, &sink, &prompt, &NoProgress, &mut report, candidates).await;

        assert!(results.is_empty());
        assert_eq!(report.lines().last().unwrap().text, "Sync aborted.");
    }

    #[tokio::test]
    async fn one_failed_entry_does_not_stop_the_batch() {
        let mut tracker = MockTimeTrackerImpl::new();
        tracker
            .expect_update_time_entry()
            .times(2)
            .returning(|entry| Ok(entry.clone()));
        let mut sink = MockTimeSinkImpl::new();
        sink.expect_create_time_entry()
            .times(3)
            .returning(|issue_id, _, _, _| {
                if issue_id == 43 {
                    Err(RedmineError::NotFound("no such issue".to_string()))
                } else {
                    Ok(created(Some(100 + issue_id)))
                }
            });
        let mut prompt = MockPromptImpl::new();
        prompt.expect_confirm().times(1).returning(|_| true);
        let mut report = SyncReport::new();

        let candidates = vec![
            candidate(1, "work on #42", 3600, 42),
            candidate(2, "work on #43", 1800, 43),
            candidate(3, "work on #44", 900, 44),
        ];
        let results =
            confirm_and_sync(&tracker, &sink, &prompt, &NoProgress, &mut report, candidates).await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[0], SyncResult::Synced(142));
        assert!(matches!(results[1], SyncResult::SyncFailed(_)));
        assert_eq!(results[2], SyncResult::Synced(144));
        assert_eq!(report.error_count(), 1);
    }

    #[tokio::test]
    async fn sync_sends_rounded_hours_and_tags_the_source_entry() {
        let mut sink = MockTimeSinkImpl::new();
        sink.expect_create_time_entry()
            .withf(|issue_id, spent_on, hours, comments| {
                *issue_id == 42
                    && *spent_on == NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
                    && (*hours - 1.5).abs() < f64::EPSILON
                    && comments == "worked on #42"
            })
            .times(1)
            .returning(|_, _, _, _| Ok(created(Some(55))));
        let mut tracker = MockTimeTrackerImpl::new();
        tracker
            .expect_update_time_entry()
            .withf(|entry: &TimeEntry| {
                entry.description.as_deref() == Some("worked on #42 #synced[55]")
                    && entry.created_with.as_deref() == Some("toggl2redmine")
            })
            .times(1)
            .returning(|entry| Ok(entry.clone()));
        let mut prompt = MockPromptImpl::new();
        prompt.expect_confirm().times(1).returning(|_| true);
        let mut report = SyncReport::new();

        let results = confirm_and_sync(
            &tracker,
            &sink,
            &prompt,
            &NoProgress,
            &mut report,
            vec![candidate(9, "worked on #42", 5400, 42)],
        )
        .await;

        assert_eq!(results, vec![SyncResult::Synced(55)]);
    }

    #[tokio::test]
    async fn failed_source_tagging_is_reported_distinctly() {
        let mut sink = MockTimeSinkImpl::new();
        sink.expect_create_time_entry()
            .times(1)
            .returning(|_, _, _, _| Ok(created(Some(77))));
        let mut tracker = MockTimeTrackerImpl::new();
        tracker
            .expect_update_time_entry()
            .times(1)
            .returning(|_| Err(TogglError::Forbidden));
        let mut prompt = MockPromptImpl::new();
        prompt.expect_confirm().times(1).returning(|_| true);
        let mut report = SyncReport::new();

        let results = confirm_and_sync(
            &tracker,
            &sink,
            &prompt,
            &NoProgress,
            &mut report,
            vec![candidate(9, "worked on #42", 3600, 42)],
        )
        .await;

        assert_eq!(
            results,
            vec![SyncResult::SyncFailed("toggl update failed".to_string())]
        );
        assert!(report
            .lines()
            .last()
            .unwrap()
            .text
            .starts_with("Updating toggl entry 9 failed"));
    }

    #[tokio::test]
    async fn response_without_record_id_is_a_failure() {
        let mut sink = MockTimeSinkImpl::new();
        sink.expect_create_time_entry()
            .times(1)
            .returning(|_, _, _, _| Ok(created(None)));
        // No update expectation: the entry must not be tagged.
        let tracker = MockTimeTrackerImpl::new();
        let mut prompt = MockPromptImpl::new();
        prompt.expect_confirm().times(1).returning(|_| true);
        let mut report = SyncReport::new();

        let results = confirm_and_sync(
            &tracker,
            &sink,
            &prompt,
            &NoProgress,
            &mut report,
            vec![candidate(9, "worked on #42", 3600, 42)],
        )
        .await;

        assert_eq!(
            results,
            vec![SyncResult::SyncFailed("no time entry id returned".to_string())]
        );
    }

    #[test]
    fn hours_are_rounded_to_two_decimals() {
        assert!((hours_from_seconds(5400) - 1.5).abs() < f64::EPSILON);
        assert!((hours_from_seconds(5000) - 1.39).abs() < f64::EPSILON);
        assert!((hours_from_seconds(0) - 0.0).abs() < f64::EPSILON);
        assert!((hours_from_seconds(27_000) - 7.5).abs() < f64::EPSILON);
    }
}
