use crate::core::{BatchError, Result, WidgetError};
use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// Outcome of one load pass: the IDs published and the failures recorded.
///
/// A pass never stops at the first failure, so both lists can be non-empty.
#[derive(Debug, Clone)]
pub struct LoadReport {
    pub root: PathBuf,
    pub loaded: Vec<String>,
    pub failures: Vec<WidgetError>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl LoadReport {
    pub(crate) fn start(root: PathBuf) -> Self {
        let now = Utc::now();
        Self {
            root,
            loaded: Vec::new(),
            failures: Vec::new(),
            started_at: now,
            finished_at: now,
        }
    }

    pub(crate) fn finish(mut self) -> Self {
        self.finished_at = Utc::now();
        self
    }

    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }

    /// IDs of the definitions that failed, in failure order.
    pub fn failed_ids(&self) -> Vec<&str> {
        self.failures.iter().filter_map(|e| e.widget_id()).collect()
    }

    pub fn elapsed_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }

    /// Aggregate of every recorded failure, if there was any.
    pub fn error(&self) -> Option<WidgetError> {
        if self.failures.is_empty() {
            None
        } else {
            Some(WidgetError::Batch(BatchError::new(self.failures.clone())))
        }
    }

    pub fn into_result(self) -> Result<Self> {
        match self.error() {
            Some(err) => Err(err),
            None => Ok(self),
        }
    }
}
