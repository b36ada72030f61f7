use chrono::offset::TimeZone;
use chrono::{DateTime, Days, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};

use lazy_static::lazy_static;
use regex::Regex;
use std::error;
use std::fmt::{Display, Formatter};

#[derive(Debug)]
pub enum Error {
    InvalidInput(String),
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidInput(s) => {
                write!(f, "Invalid input {s}")
            }
        }
    }
}

impl error::Error for Error {}

/// Parses a date, a time, a datetime or a handful of relative expressions
/// into a local timestamp:
///
/// `now` the current instant
/// `today` / `yesterday` midnight of that day
/// `-1 day`, `-3 days` the current instant shifted back
/// `2023-05-26` midnight on that date
/// `08:00` implicitly indicating today's date
/// `2023-05-26T09:00` exact specification
#[allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]
pub fn str_to_date_time(s: &str) -> Result<DateTime<Local>, Error> {
    lazy_static! {
        static ref RELATIVE_EXPR: Regex = Regex::new(r"^-(\d+) days?$").unwrap();
        static ref DATE_EXPR: Regex = Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap();
        static ref TIME_EXPR: Regex = Regex::new(r"^\d{1,2}:\d{2}$").unwrap();
        static ref DATE_TIME_EXPR: Regex =
            Regex::new(r"^\d{4}-\d{2}-\d{2}T\d{1,2}:\d{2}$").unwrap();
    }

    let s = s.trim();
    if s.eq_ignore_ascii_case("now") {
        Ok(Local::now())
    } else if s.eq_ignore_ascii_case("today") {
        let midnight = Local::now().date_naive().and_time(NaiveTime::MIN);
        Ok(Local.from_local_datetime(&midnight).unwrap())
    } else if s.eq_ignore_ascii_case("yesterday") {
        let midnight = Local::now()
            .date_naive()
            .checked_sub_days(Days::new(1))
            .unwrap()
            .and_time(NaiveTime::MIN);
        Ok(Local.from_local_datetime(&midnight).unwrap())
    } else if let Some(captures) = RELATIVE_EXPR.captures(s) {
        let days: u64 = captures[1]
            .parse()
            .map_err(|_| Error::InvalidInput(s.to_string()))?;
        Local::now()
            .checked_sub_days(Days::new(days))
            .ok_or_else(|| Error::InvalidInput(s.to_string()))
    } else if DATE_EXPR.is_match(s) {
        let naive_date = NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|_| Error::InvalidInput(s.to_string()))?;
        let naive_date_time = naive_date.and_time(NaiveTime::MIN);
        Ok(Local.from_local_datetime(&naive_date_time).unwrap())
    } else if TIME_EXPR.is_match(s) {
        let nt = NaiveTime::parse_from_str(s, "%H:%M").unwrap();
        let local_now = Local::now().date_naive().and_time(nt);
        Ok(Local.from_local_datetime(&local_now).unwrap())
    } else if DATE_TIME_EXPR.is_match(s) {
        let dt = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M").unwrap();
        Ok(Local.from_local_datetime(&dt).unwrap())
    } else {
        Err(Error::InvalidInput(s.to_string()))
    }
}

/// Splits `[from, to)` into consecutive closed windows of at most one
/// calendar day. Plain value type; iterating it again from the same inputs
/// reproduces the same windows.
#[must_use]
pub fn day_windows(from: DateTime<Local>, to: DateTime<Local>) -> DayWindows {
    DayWindows {
        next_start: from,
        until: to,
    }
}

#[derive(Clone, Debug)]
pub struct DayWindows {
    next_start: DateTime<Local>,
    until: DateTime<Local>,
}

impl Iterator for DayWindows {
    type Item = (DateTime<Local>, DateTime<Local>);

    fn next(&mut self) -> Option<Self::Item> {
        if self.next_start >= self.until {
            return None;
        }
        let start = self.next_start;

        // End of the start's calendar day, but never past the global end.
        let end_of_day = start
            .date_naive()
            .and_hms_opt(23, 59, 59)
            .unwrap();
        let end_of_day = Local.from_local_datetime(&end_of_day).unwrap();
        let end = std::cmp::min(end_of_day, self.until);

        self.next_start = end + Duration::seconds(1);
        Some((start, end))
    }
}
