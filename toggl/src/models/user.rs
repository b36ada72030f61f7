use serde::{Deserialize, Serialize};

/// The authenticated Toggl user as returned by `GET /me`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub fullname: Option<String>,
    pub email: Option<String>,
    pub default_wid: Option<i64>,
}
