//! Archive assembly
//!
//! Places fetched bytes into the fixed folder taxonomy, emits the
//! machine-readable `project.json` summary and the human-readable
//! `storyboard.txt` transcript, and streams the whole tree through deflate
//! compression into one in-memory ZIP. Entry order is derived from reference
//! metadata, never from fetch completion order, so the archive contents are
//! deterministic regardless of which fetch finished first.
//!
//! Failures here are fatal to the export — a partial archive without a
//! consistent manifest is not a meaningful result.

use crate::error::Result;
use crate::normalize::sanitize_component;
use crate::progress::{ProgressEvent, ProgressSink};
use crate::types::{
    AssetSource, ExportResult, FailureRecord, MediaKind, MediaReference, Project,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::io::{Cursor, Write};
use zip::CompressionMethod;
use zip::write::FileOptions;

/// Derive the archive file name from the project title
///
/// Everything outside alphanumerics (native scripts included) collapses to a
/// single `_`; an empty or fully non-alphanumeric title falls back to
/// `project`.
pub fn archive_file_name(title: &str) -> String {
    let stem = sanitize_component(title);
    let stem = if stem.is_empty() { "project" } else { &stem };
    format!("{stem}_assets.zip")
}

/// Machine-readable export summary written to `project.json`
#[derive(Serialize)]
struct Manifest<'a> {
    title: &'a str,
    exported_at: DateTime<Utc>,
    image_count: usize,
    video_count: usize,
    audio_count: usize,
    total_count: usize,
    assets: Vec<ManifestAsset<'a>>,
    failures: &'a [FailureRecord],
}

/// One archived asset's provenance record in the manifest
#[derive(Serialize)]
struct ManifestAsset<'a> {
    path: String,
    url: &'a str,
    source: AssetSource,
    kind: MediaKind,
    assigned: bool,
    shot_ids: &'a BTreeSet<String>,
    task_ids: &'a BTreeSet<String>,
}

/// Assemble the export archive
///
/// `assets` pairs each collected reference with its fetched bytes; references
/// whose fetch failed are simply absent. Produces a valid manifest-only
/// archive when `assets` is empty. Emits a [`ProgressEvent::Zip`] percentage
/// after every entry written.
pub fn build_archive(
    project: &Project,
    assets: &[(MediaReference, Bytes)],
    result: &ExportResult,
    compression_level: u8,
    sink: &ProgressSink,
) -> Result<Vec<u8>> {
    // Metadata-derived ordering keeps the archive deterministic regardless
    // of fetch completion order
    let mut ordered: Vec<&(MediaReference, Bytes)> = assets.iter().collect();
    ordered.sort_by(|a, b| {
        (a.0.folder, a.0.file_name.as_str()).cmp(&(b.0.folder, b.0.file_name.as_str()))
    });

    let total_entries = ordered.len() + 2;
    let mut written = 0usize;
    let emit = |written: usize| {
        let percent = (written * 100 / total_entries) as u8;
        sink(ProgressEvent::Zip { percent });
    };

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(i32::from(compression_level)));

    let mut used_names = HashSet::new();
    let mut manifest_assets = Vec::with_capacity(ordered.len());

    for (reference, bytes) in ordered {
        let entry_path = unique_entry_path(&mut used_names, reference);
        writer.start_file(entry_path.as_str(), options)?;
        writer.write_all(bytes)?;

        manifest_assets.push(ManifestAsset {
            path: entry_path,
            url: &reference.url,
            source: reference.source,
            kind: reference.kind,
            assigned: reference.assigned,
            shot_ids: &reference.shot_ids,
            task_ids: &reference.task_ids,
        });

        written += 1;
        emit(written);
    }

    let manifest = Manifest {
        title: &project.title,
        exported_at: Utc::now(),
        image_count: result.image_count,
        video_count: result.video_count,
        audio_count: result.audio_count,
        total_count: result.total_count,
        assets: manifest_assets,
        failures: &result.failures,
    };
    writer.start_file("project.json", options)?;
    writer.write_all(&serde_json::to_vec_pretty(&manifest)?)?;
    written += 1;
    emit(written);

    writer.start_file("storyboard.txt", options)?;
    writer.write_all(storyboard_transcript(project).as_bytes())?;
    written += 1;
    emit(written);

    let cursor = writer.finish()?;
    let archive = cursor.into_inner();

    tracing::info!(
        entries = total_entries,
        bytes = archive.len(),
        "archive assembled"
    );
    Ok(archive)
}

/// Entry path within the archive, uniqued against earlier entries
///
/// Collisions get a ` (n)` suffix before the extension, mirroring the usual
/// file-manager rename convention.
fn unique_entry_path(used: &mut HashSet<String>, reference: &MediaReference) -> String {
    let base = format!("{}/{}", reference.folder.path(), reference.file_name);
    if used.insert(base.clone()) {
        return base;
    }

    let (stem, ext) = match base.rsplit_once('.') {
        Some((stem, ext)) => (stem.to_string(), Some(ext.to_string())),
        None => (base.clone(), None),
    };
    for n in 1.. {
        let candidate = match &ext {
            Some(ext) => format!("{stem} ({n}).{ext}"),
            None => format!("{stem} ({n})"),
        };
        if used.insert(candidate.clone()) {
            return candidate;
        }
    }
    unreachable!("an unused suffix always exists")
}

/// Human-readable storyboard transcript written to `storyboard.txt`
fn storyboard_transcript(project: &Project) -> String {
    let mut out = String::new();
    out.push_str(&format!("Project: {}\n", project.title));
    out.push('\n');

    for (idx, scene) in project.scenes.iter().enumerate() {
        if scene.title.is_empty() {
            out.push_str(&format!("== Scene {} ==\n", idx + 1));
        } else {
            out.push_str(&format!("== Scene {}: {} ==\n", idx + 1, scene.title));
        }
        for shot in &scene.shots {
            let clip_note = if shot.clip_url.is_some() {
                "clip selected"
            } else {
                "no clip"
            };
            out.push_str(&format!(
                "[{:03}] {} ({clip_note}, {} takes)\n",
                shot.order,
                shot.dialogue,
                shot.history.len()
            ));
        }
        out.push('\n');
    }

    if !project.script.is_empty() {
        out.push_str("-- Script --\n");
        out.push_str(&project.script);
        out.push('\n');
    }

    out
}
