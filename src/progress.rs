//! Progress side channel
//!
//! The pipeline reports coarse status updates through a broadcast channel. Any
//! number of subscribers may listen; when nobody does, events are dropped.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Coarse status of an export in progress
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Progress {
    /// Export accepted, resolving step lists
    Preparing,
    /// Content fetching for one run has begun
    FetchingSteps {
        /// 1-based position of the run in the export
        run: usize,
        /// Total number of runs in the export
        total: usize,
    },
    /// All data fetched, writing the spreadsheet
    Building,
    /// Artifact ready
    Complete {
        /// Suggested file name of the artifact
        file_name: String,
    },
    /// Export aborted
    Failed {
        /// User-visible reason
        message: String,
    },
}

impl std::fmt::Display for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Progress::Preparing => f.write_str("Preparing export..."),
            Progress::FetchingSteps { run, total } => {
                write!(f, "Fetching step details... Run {run}/{total}")
            }
            Progress::Building => f.write_str("Building file..."),
            Progress::Complete { file_name } => write!(f, "Export complete: {file_name}"),
            Progress::Failed { message } => write!(f, "Export failed: {message}"),
        }
    }
}

/// Fire-and-forget sender of [`Progress`] events
#[derive(Clone, Debug)]
pub struct ProgressReporter {
    tx: broadcast::Sender<Progress>,
}

impl ProgressReporter {
    /// Create a reporter buffering up to `capacity` events per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Receive all events reported from now on
    pub fn subscribe(&self) -> broadcast::Receiver<Progress> {
        self.tx.subscribe()
    }

    /// Publish an event; never blocks and never fails
    pub fn report(&self, progress: Progress) {
        tracing::debug!(status = %progress, "export progress");
        // No receivers is fine
        self.tx.send(progress).ok();
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(64)
    }
}
