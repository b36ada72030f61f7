//! Issue references and the sync marker live in the free-text description
//! of a Toggl entry. The string format is confined to this module; the
//! rest of the crate works with the extracted values.

use lazy_static::lazy_static;
use regex::Regex;

/// Appended to a Toggl description once the entry has been pushed to
/// Redmine. Kept verbatim for compatibility with entries tagged by earlier
/// versions of the tool.
pub const SYNCED_FLAG: &str = "#synced";

/// Returns the issue id of the first `#NNN` reference in the description.
/// Later references are ignored; the first one wins.
#[must_use]
pub fn extract_issue_id(description: &str) -> Option<i64> {
    lazy_static! {
        static ref ISSUE_PATTERN: Regex = Regex::new(r"#(\d+)").unwrap();
    }
    ISSUE_PATTERN
        .captures(description)
        .and_then(|captures| captures[1].parse::<i64>().ok())
}

/// An entry carrying the marker anywhere in its description has already
/// been pushed. Purely textual and advisory; only as reliable as what
/// Toggl stored.
#[must_use]
pub fn is_marked_synced(description: &str) -> bool {
    description.contains(SYNCED_FLAG)
}

/// The marker text recorded on the Toggl side, e.g. `#synced[123]`.
#[must_use]
pub fn synced_marker(record_id: i64) -> String {
    format!("{SYNCED_FLAG}[{record_id}]")
}
