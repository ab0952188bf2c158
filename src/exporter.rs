//! Top-level export orchestration
//!
//! Wires the collector, fetcher, worker pool, and archive builder into the
//! single export operation: collect and deduplicate references, fetch them
//! concurrently under the bounded pool, then assemble the archive — reporting
//! phase-tagged progress throughout and isolating per-asset failures from the
//! run as a whole.

use crate::archive::{archive_file_name, build_archive};
use crate::collector::collect_references;
use crate::config::ExportConfig;
use crate::error::Result;
use crate::fetcher::MediaFetcher;
use crate::pool;
use crate::progress::{ProgressEvent, ProgressSink};
use crate::types::{
    ExportOutput, ExportResult, FailureRecord, MediaKind, MediaReference, Project, TaskSource,
};
use bytes::Bytes;
use futures::FutureExt;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// Export every asset of a project snapshot into one compressed archive
///
/// Emits `prepare` → `download` counters → `zip` percentages → `done` on the
/// injected sink. A failing task source degrades to an empty task collection
/// with a warning; individual fetch failures become [`FailureRecord`]s in the
/// result; only archive assembly errors abort the call.
///
/// There is no batch-level cancellation: a caller that stops awaiting simply
/// abandons the run, and each in-flight fetch attempt remains bounded by its
/// own timeout.
pub async fn export_assets(
    project: &Project,
    task_source: &dyn TaskSource,
    config: &ExportConfig,
    sink: ProgressSink,
) -> Result<ExportOutput> {
    config.validate()?;
    sink(ProgressEvent::Prepare);

    let tasks = match task_source.list_tasks().await {
        Ok(tasks) => tasks,
        Err(error) => {
            tracing::warn!(
                error = %error,
                "generation-task records unavailable, exporting without them"
            );
            Vec::new()
        }
    };

    let references = collect_references(project, &tasks);
    tracing::info!(
        project = %project.title,
        assets = references.len(),
        "starting asset export"
    );

    // Arena state for one run: both maps only ever see insert-if-absent
    // traffic on independent keys from concurrent units
    let fetcher = MediaFetcher::new(config);
    let fetched: Mutex<HashMap<usize, Bytes>> = Mutex::new(HashMap::new());
    let failures: Mutex<Vec<FailureRecord>> = Mutex::new(Vec::new());

    let units: Vec<pool::WorkUnit<'_>> = references
        .iter()
        .enumerate()
        .map(|(slot, reference)| {
            let fetcher = &fetcher;
            let fetched = &fetched;
            let failures = &failures;
            async move {
                match fetcher.fetch(&reference.url, reference.kind).await {
                    Ok(bytes) => {
                        fetched.lock().await.insert(slot, bytes);
                    }
                    Err(failed) => {
                        failures.lock().await.push(FailureRecord {
                            asset_type: reference.kind,
                            url: failed.url,
                            reason: failed.reason,
                        });
                    }
                }
            }
            .boxed()
        })
        .collect();

    let download_sink = &sink;
    pool::run(units, config.concurrency, |completed, total| {
        download_sink(ProgressEvent::Download { completed, total });
    })
    .await;

    let mut fetched = fetched.into_inner();
    let mut result = ExportResult {
        failures: failures.into_inner(),
        ..Default::default()
    };

    let mut assets: Vec<(MediaReference, Bytes)> = Vec::with_capacity(fetched.len());
    for (slot, reference) in references.into_iter().enumerate() {
        let Some(bytes) = fetched.remove(&slot) else {
            continue;
        };
        match reference.kind {
            MediaKind::Image => result.image_count += 1,
            MediaKind::Video => result.video_count += 1,
            MediaKind::Audio => result.audio_count += 1,
        }
        result.total_count += 1;
        assets.push((reference, bytes));
    }

    let archive = build_archive(project, &assets, &result, config.compression_level, &sink)?;
    sink(ProgressEvent::Done);

    tracing::info!(
        archived = result.total_count,
        failed = result.failures.len(),
        "export complete"
    );

    Ok(ExportOutput {
        file_name: archive_file_name(&project.title),
        archive,
        result,
    })
}
