// ABOUTME: Reporting sink steps narrate progress and failures through.
// ABOUTME: Includes a recording implementation for tests and rehearsals.

use parking_lot::Mutex;

/// Where steps send human-facing narration.
pub trait Reporter: Send + Sync {
    fn say(&self, message: &str);
    fn error(&self, message: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportEvent {
    Say(String),
    Error(String),
}

/// Keeps every reported message in order.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<ReportEvent>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ReportEvent> {
        self.events.lock().clone()
    }

    pub fn errors(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                ReportEvent::Error(message) => Some(message.clone()),
                ReportEvent::Say(_) => None,
            })
            .collect()
    }

    /// True if any message, progress or error, contains `needle`.
    pub fn mentions(&self, needle: &str) -> bool {
        self.events.lock().iter().any(|e| match e {
            ReportEvent::Say(m) | ReportEvent::Error(m) => m.contains(needle),
        })
    }
}

impl Reporter for RecordingReporter {
    fn say(&self, message: &str) {
        self.events.lock().push(ReportEvent::Say(message.to_string()));
    }

    fn error(&self, message: &str) {
        self.events
            .lock()
            .push(ReportEvent::Error(message.to_string()));
    }
}
