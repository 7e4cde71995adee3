/// Shared helpers for unit tests

use std::sync::{Arc, Mutex};

use crate::log::{LogEntry, Logger};

/// Logger that stores every entry in a shared vector
pub struct CaptureLogger {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl CaptureLogger {
    /// Logger plus a handle on the entries it captures
    pub fn new() -> (Self, Arc<Mutex<Vec<LogEntry>>>) {
        let entries = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                entries: Arc::clone(&entries),
            },
            entries,
        )
    }

    /// Captured entries emitted by `source`
    ///
    /// Tests running in parallel may log from other components, so assertions
    /// filter by source instead of counting every entry.
    pub fn from_source(entries: &Arc<Mutex<Vec<LogEntry>>>, source: &str) -> Vec<LogEntry> {
        entries
            .lock()
            .unwrap()
            .iter()
            .filter(|entry| entry.source == source)
            .cloned()
            .collect()
    }
}

impl Logger for CaptureLogger {
    fn log(&self, entry: &LogEntry) {
        self.entries.lock().unwrap().push(entry.clone());
    }
}
