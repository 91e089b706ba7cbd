//! # flow-run-export
//!
//! Exports the run history of a cloud workflow as a multi-sheet spreadsheet.
//!
//! ## Design Philosophy
//!
//! flow-run-export is designed to be:
//! - **Failure tolerant** - A step or payload that cannot be fetched becomes a marker in
//!   the report, never a failed export
//! - **Bounded** - Payload fetches run under a fixed concurrency budget
//! - **Deterministic** - The same fetched data always produces the same report
//! - **Library-first** - No CLI or UI; the embedding application supplies the token and
//!   decides where the artifact goes
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use flow_run_export::{ExportConfig, GatewayConfig, HttpFetchGateway, ReportExporter};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let gateway = HttpFetchGateway::new(GatewayConfig::new(
//!         "Default-00000000-0000-0000-0000-000000000000",
//!         "11111111-1111-1111-1111-111111111111",
//!         "eyJ0eXAi...",
//!     ))?;
//!     let runs = gateway.fetch_runs().await?;
//!
//!     let exporter = ReportExporter::new(Arc::new(gateway), ExportConfig::default())?;
//!
//!     // Subscribe to progress
//!     let mut progress = exporter.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = progress.recv().await {
//!             println!("{event}");
//!         }
//!     });
//!
//!     let artifact = exporter.export("Invoice Sync", &runs).await?;
//!     let path = artifact
//!         .save_to(std::path::Path::new("."), exporter.config().file_collision)
//!         .await?;
//!     println!("saved {}", path.display());
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Step list and step content aggregation
pub mod aggregator;
/// Session cache of run step lists
pub mod cache;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Export pipeline entry point
pub mod exporter;
/// Access to the workflow service
pub mod gateway;
/// Bounded-concurrency execution of async work
pub mod pool;
/// Progress events
pub mod progress;
/// Report model and assembly
pub mod report;
/// Retry logic with exponential backoff
pub mod retry;
/// Core types
pub mod types;
/// File output helpers
pub mod utils;
/// Spreadsheet serialization
pub mod xlsx;

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

// Re-export commonly used types
pub use aggregator::ActionAggregator;
pub use cache::ActionCache;
pub use config::{ExportConfig, FileCollisionAction, GatewayConfig, ReportConfig, RetryConfig};
pub use error::{Error, GatewayError, Result};
pub use exporter::{ExportArtifact, ReportExporter};
pub use gateway::{FetchGateway, HttpFetchGateway};
pub use pool::run_bounded;
pub use progress::{Progress, ProgressReporter};
pub use report::{Cell, Report, Sheet, assemble_report, format_duration};
pub use types::{
    Action, ActionContent, ContentKey, ContentLink, ContentMap, Run, RunActions, RunStatus,
    ServiceError, ServiceErrorDetail,
};
pub use xlsx::{ArtifactSerializer, XlsxSerializer};
