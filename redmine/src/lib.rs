//!
//! `redmine` is a client for the one corner of the Redmine REST API this
//! workspace needs: creating time entries against an issue.
use std::{
    error::Error,
    fmt::{self, Formatter},
};

use chrono::NaiveDate;
use log::debug;
use models::{CreatedTimeEntry, NewTimeEntry};
use reqwest::{
    header::{ACCEPT, CONTENT_TYPE},
    Client, Method, RequestBuilder, StatusCode,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use url::{ParseError, Url};

pub mod models;

type Result<T> = std::result::Result<T, RedmineError>;

const API_KEY_HEADER: &str = "X-Redmine-API-Key";

/// Redmine reports validation failures as `{"errors": [..]}`.
#[derive(Serialize, Deserialize, Debug)]
pub struct Errors {
    pub errors: Vec<String>,
}

#[derive(Debug)]
pub enum RedmineError {
    Unauthorized,
    NotFound(String),
    Fault { code: StatusCode, errors: Errors },
    RequestError(reqwest::Error),
    SerializationError(serde_json::error::Error),
    ParseError(ParseError),
}

#[allow(clippy::enum_glob_use)]
impl fmt::Display for RedmineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        use crate::RedmineError::*;

        match self {
            Unauthorized => writeln!(f, "Redmine rejected the supplied API key"),
            NotFound(url) => writeln!(f, "Not found: '{url}'"),
            Fault { code, errors } => writeln!(f, "Redmine client error ({code}): {:?}", errors.errors),
            RequestError(e) => writeln!(f, "Internal error in reqwest library: {}", e.to_string().as_str()),
            SerializationError(e) => writeln!(f, "Could not serialize/deserialize: {e:?}!"),
            ParseError(e) => writeln!(f, "Could not connect to Redmine: {e:?}!"),
        }
    }
}

impl Error for RedmineError {}

impl From<ParseError> for RedmineError {
    fn from(error: ParseError) -> RedmineError {
        RedmineError::ParseError(error)
    }
}

impl From<reqwest::Error> for RedmineError {
    fn from(error: reqwest::Error) -> RedmineError {
        RedmineError::RequestError(error)
    }
}

impl From<serde_json::error::Error> for RedmineError {
    fn from(error: serde_json::error::Error) -> RedmineError {
        RedmineError::SerializationError(error)
    }
}

#[derive(Debug, Serialize)]
struct NewTimeEntryBody {
    time_entry: NewTimeEntry,
}

#[derive(Debug, Deserialize)]
struct CreatedTimeEntryEnvelope {
    time_entry: CreatedTimeEntry,
}

#[derive(Clone)]
pub struct Redmine {
    host: Url,
    api_key: String,
    pub client: Client,
}

impl Redmine {
    /// The host may carry a sub-path (`https://example.com/redmine`);
    /// endpoints are resolved relative to it.
    #[allow(clippy::missing_errors_doc)]
    pub fn new<H, K>(host: H, api_key: K) -> Result<Redmine>
    where
        H: Into<String>,
        K: Into<String>,
    {
        let mut host = host.into();
        if !host.ends_with('/') {
            host.push('/');
        }
        let host = Url::parse(&host)?;

        Ok(Redmine {
            host,
            api_key: api_key.into(),
            client: Client::new(),
        })
    }

    async fn request<D>(&self, method: Method, endpoint: &str, body: Option<Vec<u8>>) -> Result<D>
    where
        D: DeserializeOwned,
    {
        let url = self.host.join(endpoint)?;

        let mut request = self
            .client
            .request(method, url.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .header(API_KEY_HEADER, self.api_key.clone());

        if let Some(body) = body {
            request = request.body(body);
        }
        debug!("request '{:?}'", request);

        let response = request.send().await?;

        let status = response.status();
        let body = &response.text().await?;
        debug!("status {:?} body '{:?}'", status, body);
        match status {
            StatusCode::UNAUTHORIZED => Err(RedmineError::Unauthorized),
            StatusCode::NOT_FOUND => Err(RedmineError::NotFound(url.to_string())),
            client_err if client_err.is_client_error() => Err(RedmineError::Fault {
                code: status,
                errors: serde_json::from_str::<Errors>(body)?,
            }),
            _ => {
                let data = if body.is_empty() { "null" } else { body };
                Ok(serde_json::from_str::<D>(data)?)
            }
        }
    }

    async fn post<D, S>(&self, endpoint: &str, body: S) -> Result<D>
    where
        D: DeserializeOwned,
        S: Serialize,
    {
        let data = serde_json::to_string::<S>(&body)?;
        self.request::<D>(Method::POST, endpoint, Some(data.into_bytes()))
            .await
    }

    /// Logs time against an issue. Note that Redmine may answer with a 2xx
    /// and still not hand back a numeric id; the caller decides what a
    /// missing id means.
    #[allow(clippy::missing_errors_doc)]
    pub async fn create_time_entry(
        &self,
        issue_id: i64,
        spent_on: NaiveDate,
        hours: f64,
        comments: &str,
    ) -> Result<CreatedTimeEntry> {
        let body = NewTimeEntryBody {
            time_entry: NewTimeEntry {
                issue_id,
                spent_on: spent_on.format("%Y-%m-%d").to_string(),
                hours,
                comments: comments.to_string(),
            },
        };
        let envelope = self
            .post::<CreatedTimeEntryEnvelope, NewTimeEntryBody>("time_entries.json", body)
            .await?;
        Ok(envelope.time_entry)
    }
}
