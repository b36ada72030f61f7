//!
//! `toggl` is a client for the parts of the Toggl REST API (v8) needed for
//! work log reconciliation: looking up the authenticated user, listing time
//! entries for a period and updating a single time entry.
//!
//! The types have been declared specifically for time entry management and
//! are hence not generic.
use std::{
    error::Error,
    fmt::{self, Formatter},
};

use chrono::{DateTime, Local};
use log::debug;
use models::{TimeEntry, User};
use reqwest::{
    header::{ACCEPT, CONTENT_TYPE},
    Client, Method, RequestBuilder, StatusCode,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use url::{ParseError, Url};

pub mod models;

type Result<T> = std::result::Result<T, TogglError>;

/// The username Toggl expects when a plain API token is used as the
/// basic-auth identity.
const API_TOKEN_PASSWORD: &str = "api_token";

#[derive(Debug)]
pub enum TogglError {
    Unauthorized,
    Forbidden,
    NotFound(String),
    Fault { code: StatusCode, errors: Vec<String> },
    RequestError(reqwest::Error),
    SerializationError(serde_json::error::Error),
    ParseError(ParseError),
}

#[allow(clippy::enum_glob_use)]
impl fmt::Display for TogglError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        use crate::TogglError::*;

        match self {
            Unauthorized => writeln!(f, "Toggl rejected the supplied credentials"),
            Forbidden => writeln!(f, "Toggl denied access to the requested resource"),
            NotFound(url) => writeln!(f, "Not found: '{url}'"),
            Fault { code, errors } => writeln!(f, "Toggl client error ({code}): {errors:?}"),
            RequestError(e) => writeln!(f, "Internal error in reqwest library: {}", e.to_string().as_str()),
            SerializationError(e) => writeln!(f, "Could not serialize/deserialize: {e:?}!"),
            ParseError(e) => writeln!(f, "Could not connect to Toggl: {e:?}!"),
        }
    }
}

impl Error for TogglError {}

impl From<ParseError> for TogglError {
    fn from(error: ParseError) -> TogglError {
        TogglError::ParseError(error)
    }
}

impl From<reqwest::Error> for TogglError {
    fn from(error: reqwest::Error) -> TogglError {
        TogglError::RequestError(error)
    }
}

impl From<serde_json::error::Error> for TogglError {
    fn from(error: serde_json::error::Error) -> TogglError {
        TogglError::SerializationError(error)
    }
}

#[derive(Clone, Debug)]
pub enum Credentials {
    Anonymous,
    Basic(String, String),
    ApiToken(String),
}

impl Credentials {
    fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            Credentials::Anonymous => request,
            Credentials::Basic(ref user, ref pass) => {
                request.basic_auth(user.to_owned(), Some(pass.to_owned()))
            }
            Credentials::ApiToken(ref token) => {
                request.basic_auth(token.to_owned(), Some(API_TOKEN_PASSWORD.to_owned()))
            }
        }
    }
}

/// Most Toggl v8 responses wrap the payload in a `data` member.
#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Debug, Serialize)]
struct TimeEntryBody<'a> {
    time_entry: &'a TimeEntry,
}

#[derive(Clone)]
pub struct Toggl {
    host: Url,
    api: String,
    credentials: Credentials,
    pub client: Client,
}

impl Toggl {
    #[allow(clippy::missing_errors_doc)]
    pub fn new<H>(host: H, credentials: Credentials) -> Result<Toggl>
    where
        H: Into<String>,
    {
        let host = Url::parse(&host.into())?;

        Ok(Toggl {
            host,
            api: "v8".to_string(),
            client: Client::new(),
            credentials,
        })
    }

    async fn request<D>(&self, method: Method, endpoint: &str, body: Option<Vec<u8>>) -> Result<D>
    where
        D: DeserializeOwned,
    {
        let url = self.host.join(&format!("api/{}{endpoint}", self.api))?;

        let mut request = self
            .client
            .request(method, url.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json");

        request = self.credentials.apply(request);

        if let Some(body) = body {
            request = request.body(body);
        }
        debug!("request '{:?}'", request);

        let response = request.send().await?;

        let status = response.status();
        let body = &response.text().await?;
        debug!("status {:?} body '{:?}'", status, body);
        match status {
            StatusCode::UNAUTHORIZED => Err(TogglError::Unauthorized),
            StatusCode::FORBIDDEN => Err(TogglError::Forbidden),
            StatusCode::NOT_FOUND => Err(TogglError::NotFound(url.to_string())),
            client_err if client_err.is_client_error() => Err(TogglError::Fault {
                code: status,
                errors: parse_error_body(body),
            }),
            _ => {
                let data = if body.is_empty() { "null" } else { body };
                Ok(serde_json::from_str::<D>(data)?)
            }
        }
    }

    #[allow(clippy::missing_errors_doc)]
    pub async fn get<D>(&self, endpoint: &str) -> Result<D>
    where
        D: DeserializeOwned,
    {
        self.request::<D>(Method::GET, endpoint, None).await
    }

    async fn put<D, S>(&self, endpoint: &str, body: S) -> Result<D>
    where
        D: DeserializeOwned,
        S: Serialize,
    {
        let data = serde_json::to_string::<S>(&body)?;
        self.request::<D>(Method::PUT, endpoint, Some(data.into_bytes()))
            .await
    }

    /// Looks up the user the supplied credentials belong to.
    #[allow(clippy::missing_errors_doc)]
    pub async fn current_user(&self) -> Result<User> {
        let envelope = self.get::<DataEnvelope<User>>("/me").await?;
        Ok(envelope.data)
    }

    /// Retrieves the time entries that started in the given period,
    /// regardless of owner and workspace.
    #[allow(clippy::missing_errors_doc)]
    pub async fn time_entries(
        &self,
        start: DateTime<Local>,
        end: DateTime<Local>,
    ) -> Result<Vec<TimeEntry>> {
        let resource = Self::compose_time_entries_url(start, end);
        self.get::<Vec<TimeEntry>>(&resource).await
    }

    /// Replaces the time entry with the same id on the Toggl side.
    /// Toggl echoes the stored entry back, which is returned as-is.
    #[allow(clippy::missing_errors_doc)]
    pub async fn update_time_entry(&self, entry: &TimeEntry) -> Result<TimeEntry> {
        let resource = format!("/time_entries/{}", entry.id);
        let envelope = self
            .put::<DataEnvelope<TimeEntry>, TimeEntryBody>(&resource, TimeEntryBody { time_entry: entry })
            .await?;
        Ok(envelope.data)
    }

    // -----------------------
    // Static methods
    fn compose_time_entries_url(start: DateTime<Local>, end: DateTime<Local>) -> String {
        format!(
            "/time_entries?start_date={}&end_date={}",
            urlencoding::encode(&start.to_rfc3339()),
            urlencoding::encode(&end.to_rfc3339()),
        )
    }
}

/// Toggl reports client errors as a JSON array of messages. Anything else
/// is passed through verbatim.
fn parse_error_body(body: &str) -> Vec<String> {
    serde_json::from_str::<Vec<String>>(body).unwrap_or_else(|_| vec![body.trim().to_string()])
}
