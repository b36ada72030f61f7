use serde::{Deserialize, Serialize};

/// Payload for `POST /time_entries.json`. `spent_on` is the `YYYY-MM-DD`
/// calendar date the hours are booked on.
#[derive(Debug, Serialize)]
pub struct NewTimeEntry {
    pub issue_id: i64,
    pub spent_on: String,
    pub hours: f64,
    pub comments: String,
}

/// The `time_entry` member of a create response. A structurally valid
/// answer may still lack the numeric id.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedTimeEntry {
    pub id: Option<i64>,
    #[serde(default)]
    pub hours: Option<f64>,
    #[serde(default)]
    pub spent_on: Option<String>,
    #[serde(default)]
    pub comments: Option<String>,
}
