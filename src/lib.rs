//! # storyboard-export
//!
//! Asset consolidation and batch export for storyboard/video production
//! projects.
//!
//! A project accumulates overlapping references to the same generated media
//! from several independent subsystems: the generation-task tracker, per-scene
//! artifacts, per-shot primary clips, and per-shot history. Before export,
//! this crate resolves them into one deduplicated, priority-ranked set,
//! fetches everything concurrently under a bounded worker pool with retries
//! and a streaming-proxy fallback, and packages the results into a structured
//! ZIP archive — reporting progress throughout and never letting one bad
//! asset abort the whole export.
//!
//! ## Design Philosophy
//!
//! - **Library-first** - no CLI or UI, purely a Rust crate for embedding
//! - **Failure-isolating** - per-asset problems become failure records in the
//!   result; only archive assembly can abort a run
//! - **Deterministic** - archive contents derive from reference metadata, not
//!   from fetch completion order
//! - **Explicit dependencies** - progress reporting and the task tracker are
//!   injected collaborators, never global state
//!
//! ## Quick Start
//!
//! ```no_run
//! use storyboard_export::{
//!     export_assets, noop_sink, ExportConfig, Project, TaskRecord, TaskSource,
//! };
//!
//! struct Tracker;
//!
//! #[async_trait::async_trait]
//! impl TaskSource for Tracker {
//!     async fn list_tasks(&self) -> storyboard_export::Result<Vec<TaskRecord>> {
//!         Ok(Vec::new())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let project = Project {
//!         title: "My Film".to_string(),
//!         ..Default::default()
//!     };
//!
//!     let output =
//!         export_assets(&project, &Tracker, &ExportConfig::default(), noop_sink()).await?;
//!
//!     println!(
//!         "{}: {} assets archived, {} failed",
//!         output.file_name,
//!         output.result.total_count,
//!         output.result.failures.len()
//!     );
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Archive assembly and manifest generation
pub mod archive;
/// Asset collection and deduplication
pub mod collector;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Top-level export orchestration
pub mod exporter;
/// Media fetching with retries, timeout, and proxy fallback
pub mod fetcher;
/// URL normalization for identity comparison
pub mod normalize;
/// Bounded worker pool over one shared backlog
pub mod pool;
/// Phase-tagged progress reporting
pub mod progress;
/// Core types: references, results, project snapshot, task records
pub mod types;

// Re-export commonly used types
pub use archive::archive_file_name;
pub use collector::{AssetCollector, collect_references};
pub use config::{ExportConfig, RetryConfig, TimeoutConfig};
pub use error::{Error, Result};
pub use exporter::export_assets;
pub use fetcher::{FetchFailed, MediaFetcher};
pub use normalize::normalize_url;
pub use progress::{ProgressEvent, ProgressSink, noop_sink};
pub use types::{
    AssetSource, CharacterProfile, ExportOutput, ExportResult, FailureRecord, HistoryEntry,
    LocationProfile, MediaKind, MediaReference, Project, Scene, Shot, TargetFolder, TaskKind,
    TaskRecord, TaskSource, TaskStatus,
};
