//! Core types for storyboard-export
//!
//! The project snapshot and generation-task records are read-only inputs taken
//! from collaborators at call time. [`MediaReference`] is the deduplicated,
//! provenance-carrying record the collector produces and everything downstream
//! consumes; [`ExportResult`] is the only output besides the archive bytes.

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Kind of media an asset holds, driving timeouts, caching, and result counters
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// Still image
    Image,
    /// Video clip
    Video,
    /// Audio track
    Audio,
}

impl MediaKind {
    /// Human-readable label used in failure records and manifests
    pub fn label(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
        }
    }

    /// Default file extension when the URL path carries none
    pub fn default_extension(&self) -> &'static str {
        match self {
            MediaKind::Image => "png",
            MediaKind::Video => "mp4",
            MediaKind::Audio => "mp3",
        }
    }
}

/// Which subsystem contributed a media reference
///
/// Each source carries a fixed priority; a numerically lower priority is more
/// authoritative and wins naming/placement when references merge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AssetSource {
    /// Generation-task tracker record
    TaskRecord,
    /// Per-scene artifact (including character/location reference imagery)
    SceneArtifact,
    /// A shot's primary clip
    ShotClip,
    /// A shot's historical generation entry
    ShotHistory,
}

impl AssetSource {
    /// Merge priority; lower is more authoritative
    pub fn priority(&self) -> u8 {
        match self {
            AssetSource::TaskRecord => 1,
            AssetSource::SceneArtifact => 2,
            AssetSource::ShotClip => 3,
            AssetSource::ShotHistory => 4,
        }
    }
}

/// Logical bucket within the output archive
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetFolder {
    /// Selected still images
    ImagesSelected,
    /// Historical still images
    ImagesHistory,
    /// Character reference imagery
    ImagesCharacters,
    /// Location reference imagery
    ImagesLocations,
    /// Shots' primary clips
    VideosSelected,
    /// Historical clip generations
    VideosHistory,
    /// Task-sourced video that was assigned to a shot
    VideosTaskAssigned,
    /// Task-sourced video never assigned to a shot, separated for manual review
    VideosTaskUnassigned,
    /// Audio tracks
    Audio,
}

impl TargetFolder {
    /// Folder path inside the archive
    pub fn path(&self) -> &'static str {
        match self {
            TargetFolder::ImagesSelected => "images/selected",
            TargetFolder::ImagesHistory => "images/history",
            TargetFolder::ImagesCharacters => "images/characters",
            TargetFolder::ImagesLocations => "images/locations",
            TargetFolder::VideosSelected => "videos/selected",
            TargetFolder::VideosHistory => "videos/history",
            TargetFolder::VideosTaskAssigned => "videos/tasks/assigned",
            TargetFolder::VideosTaskUnassigned => "videos/tasks/unassigned",
            TargetFolder::Audio => "audio",
        }
    }
}

/// Deduplicated record describing one fetchable asset plus its provenance and
/// placement metadata
///
/// Exactly one reference exists per normalized URL in the collected set. The
/// `file_name`, `source`, and `folder` fields always reflect the contributing
/// source with the lowest priority seen so far; `shot_ids`/`task_ids` are the
/// union over all contributing sources and `assigned` is their logical OR.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MediaReference {
    /// Original URL, always the one actually fetched
    pub url: String,
    /// Canonical dedup key (fragment and query stripped)
    pub normalized_url: String,
    /// Highest-authority subsystem that contributed this reference
    pub source: AssetSource,
    /// Media kind
    pub kind: MediaKind,
    /// File name within the target folder
    pub file_name: String,
    /// Placement bucket within the archive
    pub folder: TargetFolder,
    /// All shots associated with this asset, across every contributing source
    pub shot_ids: BTreeSet<String>,
    /// All generation tasks associated with this asset
    pub task_ids: BTreeSet<String>,
    /// Whether any contributing source marked this asset as assigned;
    /// once true it never reverts
    pub assigned: bool,
}

/// One asset that could not be fetched; appended, never mutated
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    /// Kind of the asset that failed
    pub asset_type: MediaKind,
    /// Original URL of the failed asset
    pub url: String,
    /// Last failure reason seen (direct or proxy)
    pub reason: String,
}

/// Summary of a completed export: per-kind counts of archived assets plus the
/// failure list for manual follow-up
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportResult {
    /// Number of images placed in the archive
    pub image_count: usize,
    /// Number of videos placed in the archive
    pub video_count: usize,
    /// Number of audio tracks placed in the archive
    pub audio_count: usize,
    /// Total assets placed in the archive
    pub total_count: usize,
    /// Assets that exhausted every fetch path
    pub failures: Vec<FailureRecord>,
}

/// Everything an export call produces
#[derive(Clone, Debug)]
pub struct ExportOutput {
    /// Archive file name, `<sanitized project title>_assets.zip`
    pub file_name: String,
    /// The compressed archive bytes
    pub archive: Vec<u8>,
    /// Counts and failure list
    pub result: ExportResult,
}

// ---------------------------------------------------------------------------
// Project snapshot (read-only collaborator input)
// ---------------------------------------------------------------------------

/// Read-only snapshot of a storyboard project at export time
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Project {
    /// Project title; also the basis of the archive file name
    pub title: String,
    /// Free-text script, included verbatim in the storyboard transcript
    #[serde(default)]
    pub script: String,
    /// Scenes in storyboard order
    #[serde(default)]
    pub scenes: Vec<Scene>,
    /// Character profiles with reference imagery
    #[serde(default)]
    pub characters: Vec<CharacterProfile>,
    /// Location profiles with reference imagery
    #[serde(default)]
    pub locations: Vec<LocationProfile>,
}

/// One scene of the storyboard
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Scene {
    /// Stable scene identifier
    pub id: String,
    /// Scene title shown in the transcript
    #[serde(default)]
    pub title: String,
    /// Per-scene artifact URLs (concept frames, boards)
    #[serde(default)]
    pub artifact_urls: Vec<String>,
    /// Shots in scene order
    #[serde(default)]
    pub shots: Vec<Shot>,
}

/// One shot of a scene
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Shot {
    /// Stable shot identifier
    pub id: String,
    /// Global shot order across the whole project, used for file naming
    pub order: u32,
    /// Dialogue or action line shown in the transcript
    #[serde(default)]
    pub dialogue: String,
    /// The shot's current primary clip, if one has been chosen
    #[serde(default)]
    pub clip_url: Option<String>,
    /// Historical generation entries for this shot
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

/// A historical generation kept on a shot
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// URL of the historical clip
    pub url: String,
    /// When the entry was generated, if known
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A character with reference imagery
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CharacterProfile {
    /// Character name
    pub name: String,
    /// Reference image URLs
    #[serde(default)]
    pub reference_image_urls: Vec<String>,
}

/// A location with reference imagery
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LocationProfile {
    /// Location name
    pub name: String,
    /// Reference image URLs
    #[serde(default)]
    pub reference_image_urls: Vec<String>,
}

// ---------------------------------------------------------------------------
// Generation-task records (read-only collaborator input)
// ---------------------------------------------------------------------------

/// Status of a generation task
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Finished successfully; only these participate in export
    Completed,
    /// Still generating
    Running,
    /// Failed
    Failed,
    /// Cancelled by the user
    Cancelled,
}

/// What a generation task produces
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    /// Video generation
    Video,
    /// Still-image generation
    Image,
    /// Audio generation
    Audio,
    /// Reference-only task producing no exportable media
    Reference,
}

impl TaskKind {
    /// Media kind of the task's artifact, or None for reference-only tasks
    pub fn media_kind(&self) -> Option<MediaKind> {
        match self {
            TaskKind::Video => Some(MediaKind::Video),
            TaskKind::Image => Some(MediaKind::Image),
            TaskKind::Audio => Some(MediaKind::Audio),
            TaskKind::Reference => None,
        }
    }
}

/// One record from the generation-task tracker
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Task identifier
    pub id: String,
    /// Task status
    pub status: TaskStatus,
    /// What the task produced
    pub kind: TaskKind,
    /// Primary artifact URL
    #[serde(default)]
    pub artifact_url: Option<String>,
    /// Known mirror of the artifact (e.g., a CDN copy); denotes the same
    /// physical object and is registered as an alias, never merged separately
    #[serde(default)]
    pub mirror_url: Option<String>,
    /// Shots this task's artifact relates to
    #[serde(default)]
    pub shot_ids: Vec<String>,
    /// Whether the artifact was applied to a shot
    #[serde(default)]
    pub assigned: bool,
}

/// Collaborator that supplies generation-task records
///
/// A failing source degrades the export gracefully — the exporter logs a
/// warning and proceeds with an empty task collection instead of aborting.
#[async_trait]
pub trait TaskSource: Send + Sync {
    /// List all generation-task records for the project being exported
    async fn list_tasks(&self) -> Result<Vec<TaskRecord>>;
}
