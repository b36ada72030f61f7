use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// A single Toggl time entry in the v8 wire format.
///
/// `stop` is absent while the timer is still running; `duration` is then a
/// negative placeholder and must not be trusted. `description` is absent
/// when the user never typed one.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TimeEntry {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub duration: i64,
    pub start: DateTime<Local>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<DateTime<Local>>,
    /// Owning user id.
    pub uid: i64,
    /// Workspace id.
    pub wid: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_with: Option<String>,
}

impl TimeEntry {
    /// A running entry has no stop timestamp yet.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.stop.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_without_optional_fields() {
        let json = r#"{
            "id": 9,
            "duration": -1,
            "start": "2024-01-15T09:00:00+00:00",
            "uid": 7,
            "wid": 11
        }"#;

        let entry: TimeEntry = serde_json::from_str(json).unwrap();
        assert!(entry.description.is_none());
        assert!(!entry.is_completed());
    }

    #[test]
    fn serialize_skips_absent_fields() {
        let json = r#"{
            "id": 9,
            "duration": -1,
            "start": "2024-01-15T09:00:00+00:00",
            "uid": 7,
            "wid": 11
        }"#;

        let entry: TimeEntry = serde_json::from_str(json).unwrap();
        let out = serde_json::to_string(&entry).unwrap();
        assert!(!out.contains("stop"));
        assert!(!out.contains("created_with"));
    }
}
