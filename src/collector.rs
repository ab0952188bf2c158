//! Asset collection and deduplication
//!
//! Merges four priority-ranked source collections — generation-task records,
//! per-scene artifacts, per-shot primary clips, per-shot history — into one
//! deduplicated set of [`MediaReference`]s keyed by normalized URL. The merge
//! is commutative: associations and the `assigned` flag accumulate from every
//! contributing source, while naming and placement always come from the
//! highest-authority (numerically lowest priority) source seen so far, so the
//! outcome is independent of processing order.

use crate::normalize::normalize_url;
use crate::types::{
    AssetSource, MediaKind, MediaReference, Project, TargetFolder, TaskKind, TaskRecord,
    TaskStatus,
};
use std::collections::{BTreeSet, HashMap};

/// Accumulates candidate references into a deduplicated arena
///
/// The index maps normalized URLs to arena slots; alias registration points a
/// second key at an existing slot so known mirrors are skipped as duplicates
/// instead of being merged as separate assets.
#[derive(Debug, Default)]
pub struct AssetCollector {
    refs: Vec<MediaReference>,
    index: HashMap<String, usize>,
}

impl AssetCollector {
    /// Create an empty collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one candidate reference into the set
    ///
    /// Absent key: inserted as-is. Present key: shot/task associations are
    /// unioned, `assigned` is OR-ed, and `file_name`/`source`/`folder` are
    /// overwritten only when the candidate outranks the stored entry.
    pub fn merge(&mut self, candidate: MediaReference) {
        match self.index.get(&candidate.normalized_url) {
            Some(&slot) => {
                let existing = &mut self.refs[slot];
                existing.shot_ids.extend(candidate.shot_ids);
                existing.task_ids.extend(candidate.task_ids);
                existing.assigned = existing.assigned || candidate.assigned;
                if candidate.source.priority() < existing.source.priority() {
                    existing.source = candidate.source;
                    existing.file_name = candidate.file_name;
                    existing.folder = candidate.folder;
                }
            }
            None => {
                self.index
                    .insert(candidate.normalized_url.clone(), self.refs.len());
                self.refs.push(candidate);
            }
        }
    }

    /// Register `alias_url` as denoting the same physical object as
    /// `canonical_url`
    ///
    /// Later candidates whose key matches the alias hit the canonical entry's
    /// merge path instead of creating a second reference. A no-op when the
    /// canonical URL has not been collected or both normalize identically.
    pub fn register_alias(&mut self, alias_url: &str, canonical_url: &str) {
        let alias_key = normalize_url(alias_url);
        let canonical_key = normalize_url(canonical_url);
        if alias_key == canonical_key || alias_key.is_empty() {
            return;
        }
        if let Some(&slot) = self.index.get(&canonical_key) {
            self.index.entry(alias_key).or_insert(slot);
        }
    }

    /// Number of distinct references collected
    pub fn len(&self) -> usize {
        self.refs.len()
    }

    /// True when nothing has been collected
    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    /// Consume the collector, yielding the deduplicated reference set
    pub fn into_references(self) -> Vec<MediaReference> {
        self.refs
    }
}

/// Build the deduplicated reference set for a project snapshot plus its
/// generation-task records
///
/// Task records participate only when completed, carrying a non-empty artifact
/// URL, and of a kind other than reference-only. Mirror URLs on task records
/// are registered as aliases of the artifact URL.
pub fn collect_references(project: &Project, tasks: &[TaskRecord]) -> Vec<MediaReference> {
    let shot_orders: HashMap<&str, u32> = project
        .scenes
        .iter()
        .flat_map(|scene| &scene.shots)
        .map(|shot| (shot.id.as_str(), shot.order))
        .collect();

    let mut collector = AssetCollector::new();

    for task in tasks {
        let Some(kind) = task.kind.media_kind() else {
            continue;
        };
        if task.status != TaskStatus::Completed {
            continue;
        }
        let Some(url) = task.artifact_url.as_deref().filter(|u| !u.trim().is_empty()) else {
            continue;
        };

        let orders: Vec<u32> = task
            .shot_ids
            .iter()
            .filter_map(|id| shot_orders.get(id.as_str()).copied())
            .collect();
        let prefix = shot_order_prefix(&orders);
        let folder = match kind {
            MediaKind::Video => {
                if task.assigned {
                    TargetFolder::VideosTaskAssigned
                } else {
                    TargetFolder::VideosTaskUnassigned
                }
            }
            MediaKind::Image => TargetFolder::ImagesSelected,
            MediaKind::Audio => TargetFolder::Audio,
        };
        let file_name = format!(
            "{prefix}_task-{}.{}",
            task.id,
            extension_for(url, kind)
        );

        collector.merge(candidate(
            url,
            AssetSource::TaskRecord,
            kind,
            file_name,
            folder,
            task.shot_ids.iter().cloned(),
            [task.id.clone()],
            task.assigned,
        ));

        if let Some(mirror) = task.mirror_url.as_deref().filter(|u| !u.trim().is_empty()) {
            collector.register_alias(mirror, url);
        }
    }

    for scene in &project.scenes {
        for (idx, url) in scene.artifact_urls.iter().enumerate() {
            let file_name = format!(
                "scene-{}_{idx}.{}",
                scene.id,
                extension_for(url, MediaKind::Image)
            );
            collector.merge(candidate(
                url,
                AssetSource::SceneArtifact,
                MediaKind::Image,
                file_name,
                TargetFolder::ImagesSelected,
                std::iter::empty(),
                std::iter::empty(),
                true,
            ));
        }
    }

    for profile in &project.characters {
        push_profile_images(
            &mut collector,
            &profile.name,
            &profile.reference_image_urls,
            TargetFolder::ImagesCharacters,
        );
    }
    for profile in &project.locations {
        push_profile_images(
            &mut collector,
            &profile.name,
            &profile.reference_image_urls,
            TargetFolder::ImagesLocations,
        );
    }

    for scene in &project.scenes {
        for shot in &scene.shots {
            let prefix = shot_order_prefix(&[shot.order]);

            if let Some(url) = shot.clip_url.as_deref().filter(|u| !u.trim().is_empty()) {
                let file_name =
                    format!("{prefix}_clip.{}", extension_for(url, MediaKind::Video));
                collector.merge(candidate(
                    url,
                    AssetSource::ShotClip,
                    MediaKind::Video,
                    file_name,
                    TargetFolder::VideosSelected,
                    [shot.id.clone()],
                    std::iter::empty(),
                    true,
                ));
            }

            for (idx, entry) in shot.history.iter().enumerate() {
                if entry.url.trim().is_empty() {
                    continue;
                }
                let file_name = format!(
                    "{prefix}_history-{idx}.{}",
                    extension_for(&entry.url, MediaKind::Video)
                );
                collector.merge(candidate(
                    &entry.url,
                    AssetSource::ShotHistory,
                    MediaKind::Video,
                    file_name,
                    TargetFolder::VideosHistory,
                    [shot.id.clone()],
                    std::iter::empty(),
                    false,
                ));
            }
        }
    }

    tracing::debug!(
        references = collector.len(),
        tasks = tasks.len(),
        scenes = project.scenes.len(),
        "collected deduplicated asset references"
    );

    collector.into_references()
}

/// Collect one character/location profile's reference imagery
fn push_profile_images(
    collector: &mut AssetCollector,
    name: &str,
    urls: &[String],
    folder: TargetFolder,
) {
    let stem = crate::normalize::sanitize_component(name);
    let stem = if stem.is_empty() { "profile" } else { stem.as_str() };
    for (idx, url) in urls.iter().enumerate() {
        if url.trim().is_empty() {
            continue;
        }
        let file_name = format!("{stem}_{idx}.{}", extension_for(url, MediaKind::Image));
        collector.merge(candidate(
            url,
            AssetSource::SceneArtifact,
            MediaKind::Image,
            file_name,
            folder,
            std::iter::empty(),
            std::iter::empty(),
            true,
        ));
    }
}

/// Build a candidate reference with its dedup key precomputed
#[allow(clippy::too_many_arguments)]
fn candidate(
    url: &str,
    source: AssetSource,
    kind: MediaKind,
    file_name: String,
    folder: TargetFolder,
    shot_ids: impl IntoIterator<Item = String>,
    task_ids: impl IntoIterator<Item = String>,
    assigned: bool,
) -> MediaReference {
    MediaReference {
        url: url.trim().to_string(),
        normalized_url: normalize_url(url),
        source,
        kind,
        file_name,
        folder,
        shot_ids: shot_ids.into_iter().collect::<BTreeSet<_>>(),
        task_ids: task_ids.into_iter().collect::<BTreeSet<_>>(),
        assigned,
    }
}

/// Render the shot-order portion of a file name
///
/// Orders are sorted and deduplicated, then rendered zero-padded to three
/// digits: a contiguous span becomes `first-last`, a non-contiguous set joins
/// every order with `_` (distinct from the range separator), and no orders at
/// all yields the literal `unassigned` so shot-less assets sort into their own
/// bucket for manual review.
pub fn shot_order_prefix(orders: &[u32]) -> String {
    let mut sorted = orders.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    match sorted.as_slice() {
        [] => "unassigned".to_string(),
        [only] => format!("{only:03}"),
        many => {
            let contiguous = many.windows(2).all(|pair| pair[1] == pair[0] + 1);
            if contiguous {
                format!("{:03}-{:03}", many[0], many[many.len() - 1])
            } else {
                many.iter()
                    .map(|order| format!("{order:03}"))
                    .collect::<Vec<_>>()
                    .join("_")
            }
        }
    }
}

/// File extension taken from the normalized URL path, or the kind's default
/// when the path carries none usable
fn extension_for(url: &str, kind: MediaKind) -> String {
    let key = normalize_url(url);
    let last_segment = key.rsplit('/').next().unwrap_or("");
    match last_segment.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && !ext.is_empty()
                && ext.len() <= 5
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            ext.to_ascii_lowercase()
        }
        _ => kind.default_extension().to_string(),
    }
}
