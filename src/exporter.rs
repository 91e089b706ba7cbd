//! Export pipeline entry point
//!
//! [`ReportExporter`] ties the stages together:
//!
//! ```text
//! runs ─▶ resolve steps (cached) ─▶ fetch step content (bounded) ─▶ assemble ─▶ serialize
//! ```
//!
//! Item-level failures become data inside the report. Only global failures
//! (no runs, serialization, I/O) abort an export, after a single
//! [`Progress::Failed`] event.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::broadcast;

use crate::aggregator::ActionAggregator;
use crate::cache::ActionCache;
use crate::config::{ExportConfig, FileCollisionAction};
use crate::error::{Error, Result};
use crate::gateway::FetchGateway;
use crate::progress::{Progress, ProgressReporter};
use crate::report::assemble_report;
use crate::types::Run;
use crate::utils::{resolve_output_path, write_atomically};
use crate::xlsx::{ArtifactSerializer, XlsxSerializer};

/// A finished, fully serialized export
#[derive(Clone, Debug)]
pub struct ExportArtifact {
    /// Suggested file name, e.g. `Invoice_Sync_run_history.xlsx`
    pub file_name: String,
    /// Complete document bytes
    pub bytes: Vec<u8>,
    /// Number of sheets in the document (Summary included)
    pub sheet_count: usize,
}

impl ExportArtifact {
    /// Write the artifact into `dir` under its suggested file name
    ///
    /// Returns the path actually written, which differs from the suggested
    /// name when `action` is [`FileCollisionAction::Rename`] and the name is
    /// taken.
    pub async fn save_to(&self, dir: &Path, action: FileCollisionAction) -> Result<PathBuf> {
        let target = resolve_output_path(&dir.join(&self.file_name), action)?;
        write_atomically(&target, &self.bytes).await?;
        tracing::info!(
            path = %target.display(),
            bytes = self.bytes.len(),
            "saved export"
        );
        Ok(target)
    }
}

/// Runs exports for one session
///
/// The exporter owns the step-list cache, so repeated exports of the same runs
/// through one exporter fetch each run's steps only once.
pub struct ReportExporter {
    aggregator: ActionAggregator,
    serializer: Arc<dyn ArtifactSerializer>,
    progress: ProgressReporter,
    config: ExportConfig,
}

impl ReportExporter {
    /// Create an exporter with a fresh cache
    pub fn new(gateway: Arc<dyn FetchGateway>, config: ExportConfig) -> Result<Self> {
        Self::with_cache(gateway, ActionCache::new(), config)
    }

    /// Create an exporter sharing an existing cache
    pub fn with_cache(
        gateway: Arc<dyn FetchGateway>,
        cache: ActionCache,
        config: ExportConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            aggregator: ActionAggregator::new(gateway, cache, &config),
            serializer: Arc::new(XlsxSerializer::new()),
            progress: ProgressReporter::new(config.progress_capacity),
            config,
        })
    }

    /// Replace the document writer
    pub fn with_serializer(mut self, serializer: Arc<dyn ArtifactSerializer>) -> Self {
        self.serializer = serializer;
        self
    }

    /// Receive progress events of every export started from now on
    pub fn subscribe(&self) -> broadcast::Receiver<Progress> {
        self.progress.subscribe()
    }

    /// The step-list cache shared by all exports of this exporter
    pub fn cache(&self) -> &ActionCache {
        self.aggregator.cache()
    }

    /// Active configuration
    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    /// Export `runs` of the flow called `flow_name`
    pub async fn export(&self, flow_name: &str, runs: &[Run]) -> Result<ExportArtifact> {
        match self.run_export(flow_name, runs).await {
            Ok(artifact) => {
                tracing::info!(
                    flow_name,
                    runs = runs.len(),
                    sheets = artifact.sheet_count,
                    bytes = artifact.bytes.len(),
                    "export complete"
                );
                self.progress.report(Progress::Complete {
                    file_name: artifact.file_name.clone(),
                });
                Ok(artifact)
            }
            Err(e) => {
                tracing::error!(flow_name, error = %e, code = e.error_code(), "export failed");
                self.progress.report(Progress::Failed {
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Export and save into `dir` using the configured collision action
    pub async fn export_to(&self, flow_name: &str, runs: &[Run], dir: &Path) -> Result<PathBuf> {
        let artifact = self.export(flow_name, runs).await?;
        artifact.save_to(dir, self.config.file_collision).await
    }

    async fn run_export(&self, flow_name: &str, runs: &[Run]) -> Result<ExportArtifact> {
        self.progress.report(Progress::Preparing);
        if runs.is_empty() {
            return Err(Error::NoRuns);
        }

        let actions = self.aggregator.resolve_actions(runs).await;
        let contents = self
            .aggregator
            .fetch_contents(runs, &actions, &self.progress)
            .await;

        self.progress.report(Progress::Building);
        let report = assemble_report(flow_name, runs, &actions, &contents, &self.config.report)?;
        let file_name = report.file_name.clone();
        let sheet_count = report.sheets.len();

        // Large workbooks take a while to compress
        let serializer = Arc::clone(&self.serializer);
        let bytes = tokio::task::spawn_blocking(move || serializer.serialize(&report))
            .await
            .map_err(|e| Error::Other(format!("serialization task failed: {e}")))??;

        Ok(ExportArtifact {
            file_name,
            bytes,
            sheet_count,
        })
    }
}
