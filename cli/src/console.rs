//! Console implementations of the engine's prompt and progress seams.

use std::io::{self, BufRead, Write};
use std::sync::Mutex;

use indicatif::ProgressBar;
use timesync::operation::sync::{ProgressSink, Prompt};
use timesync::report::Severity;

/// Reads a single y/n answer from stdin. Anything but an explicit yes
/// counts as no.
pub(crate) struct ConsolePrompt;

impl Prompt for ConsolePrompt {
    fn confirm(&self, message: &str) -> bool {
        print!("{message} ");
        let _ = io::stdout().flush();

        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
    }
}

/// Shows an indicatif bar while a batch is running. Report lines are
/// routed through the bar so they do not tear it apart.
pub(crate) struct ConsoleProgress {
    bar: Mutex<Option<ProgressBar>>,
}

impl ConsoleProgress {
    pub(crate) fn new() -> Self {
        ConsoleProgress {
            bar: Mutex::new(None),
        }
    }
}

impl ProgressSink for ConsoleProgress {
    fn start(&self, len: u64) {
        *self.bar.lock().unwrap() = Some(ProgressBar::new(len));
    }

    fn advance(&self) {
        if let Some(bar) = self.bar.lock().unwrap().as_ref() {
            bar.inc(1);
        }
    }

    fn finish(&self) {
        if let Some(bar) = self.bar.lock().unwrap().take() {
            bar.finish_and_clear();
        }
    }

    fn line(&self, severity: Severity, text: &str) {
        let guard = self.bar.lock().unwrap();
        if let Some(bar) = guard.as_ref() {
            bar.println(text);
        } else {
            match severity {
                Severity::Error => eprintln!("{text}"),
                _ => println!("{text}"),
            }
        }
    }
}
