use std::fmt::{self, Formatter};

/// Severity of a single report line, mirroring the three console styles
/// the tool has always used for entry status output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Comment,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Comment => write!(f, "comment"),
            Severity::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLine {
    pub severity: Severity,
    pub text: String,
}

/// Accumulates one line per processed entry (plus batch-level notices) over
/// a whole run. Append-only; the driving caller decides how to display it.
#[derive(Debug, Default)]
pub struct SyncReport {
    lines: Vec<ReportLine>,
}

impl SyncReport {
    #[must_use]
    pub fn new() -> Self {
        SyncReport::default()
    }

    pub fn push(&mut self, severity: Severity, text: impl Into<String>) {
        self.lines.push(ReportLine {
            severity,
            text: text.into(),
        });
    }

    #[must_use]
    pub fn lines(&self) -> &[ReportLine] {
        &self.lines
    }

    #[must_use]
    pub fn error_count(&self) -> usize {
        self.count(Severity::Error)
    }

    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.lines
            .iter()
            .filter(|line| line.severity == severity)
            .count()
    }
}
