//! Conversion domain models.
//!
//! A conversion turns one smali source unit into Java text. The outcome of a
//! pipeline run is always a [`PipelineResult`]; success and failure are told
//! apart by variant, never by inspecting text.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::snapshot::{ContentSnapshot, SourceIdentity};
use crate::domain::errors::ConversionError;

/// Which pipeline stage produced a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Single-unit assemble + decompile.
    RealtimePipeline,
    /// Decompiled from an enclosing DEX/APK found on disk.
    ContainerDecompiled,
    /// Read from an existing Java source tree.
    PrecomputedSourceFound,
}

impl Provenance {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::RealtimePipeline => "realtime_pipeline",
            Self::ContainerDecompiled => "container_decompiled",
            Self::PrecomputedSourceFound => "precomputed_source_found",
        }
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The file a conversion was read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginDetails {
    pub path: PathBuf,
    pub modified: Option<DateTime<Utc>>,
    pub len: u64,
}

impl OriginDetails {
    pub fn from_metadata(path: &Path, metadata: &std::fs::Metadata) -> Self {
        Self {
            path: path.to_path_buf(),
            modified: metadata.modified().ok().map(DateTime::<Utc>::from),
            len: metadata.len(),
        }
    }
}

/// Java text produced by a successful pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertedSource {
    pub text: Arc<str>,
    pub provenance: Provenance,
    pub origin: Option<OriginDetails>,
}

impl ConvertedSource {
    pub fn new(text: impl Into<Arc<str>>, provenance: Provenance) -> Self {
        Self {
            text: text.into(),
            provenance,
            origin: None,
        }
    }

    pub fn with_origin(mut self, origin: OriginDetails) -> Self {
        self.origin = Some(origin);
        self
    }
}

/// A cached conversion and the snapshot it was computed from.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub snapshot: ContentSnapshot,
    pub converted: ConvertedSource,
    pub stored_at: DateTime<Utc>,
}

/// Pipeline stages, in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Realtime,
    FullContainer,
    Precomputed,
}

impl Stage {
    pub const ALL: [Self; 3] = [Self::Realtime, Self::FullContainer, Self::Precomputed];

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Realtime => "realtime",
            Self::FullContainer => "full_container",
            Self::Precomputed => "precomputed",
        }
    }

    pub const fn label(&self) -> &'static str {
        match self {
            Self::Realtime => "single-file assemble + decompile",
            Self::FullContainer => "decompile enclosing DEX/APK",
            Self::Precomputed => "existing Java sources",
        }
    }
}

/// How one stage ended when it did not produce a conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageAttempt {
    pub stage: Stage,
    pub error: ConversionError,
}

/// Why a conversion could not be produced.
///
/// Rendered into the placeholder shown instead of Java text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Explanation {
    pub summary: String,
    pub attempts: Vec<StageAttempt>,
    pub searched: Vec<PathBuf>,
    pub hints: Vec<String>,
}

impl Explanation {
    pub fn new(summary: impl Into<String>) -> Self {
        Self {
            summary: summary.into(),
            ..Default::default()
        }
    }

    /// Placeholder text for the UI.
    pub fn render(&self) -> String {
        let mut out = format!("// {}\n", self.summary);

        if !self.attempts.is_empty() {
            out.push_str("//\n// Tried:\n");
            for attempt in &self.attempts {
                out.push_str(&format!(
                    "//   - {}: {}\n",
                    attempt.stage.label(),
                    attempt.error
                ));
            }
        }

        if !self.searched.is_empty() {
            out.push_str("//\n// Searched:\n");
            for path in &self.searched {
                out.push_str(&format!("//   - {}\n", path.display()));
            }
        }

        if !self.hints.is_empty() {
            out.push_str("//\n// Check:\n");
            for hint in &self.hints {
                out.push_str(&format!("//   - {hint}\n"));
            }
        }

        out
    }
}

impl fmt::Display for Explanation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary)
    }
}

/// Outcome of resolving one conversion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineResult {
    Success(ConvertedSource),
    NotFound(Explanation),
    Failed(Explanation),
    Cancelled,
}

impl PipelineResult {
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    pub const fn converted(&self) -> Option<&ConvertedSource> {
        match self {
            Self::Success(converted) => Some(converted),
            _ => None,
        }
    }

    /// Text to display: Java on success, a placeholder otherwise.
    pub fn display_text(&self) -> String {
        match self {
            Self::Success(converted) => converted.text.to_string(),
            Self::NotFound(explanation) | Self::Failed(explanation) => explanation.render(),
            Self::Cancelled => String::new(),
        }
    }

    pub const fn status(&self) -> &'static str {
        match self {
            Self::Success(_) => "success",
            Self::NotFound(_) => "not_found",
            Self::Failed(_) => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

/// A request handed from the service to the scheduler.
#[derive(Debug, Clone)]
pub struct ConversionRequest {
    pub identity: SourceIdentity,
    pub snapshot: ContentSnapshot,
    /// Generation assigned at submission; results from older generations
    /// are dropped.
    pub generation: u64,
    /// Editor text, when the snapshot was taken from memory.
    pub text: Option<Arc<str>>,
}

/// Per-identity task lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    Idle,
    Running,
    Completed,
    Cancelled,
}

/// Returned to the caller of `request` so it can match later updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTicket {
    pub identity: SourceIdentity,
    pub generation: u64,
}

/// Messages delivered to the UI on the result channel.
#[derive(Debug, Clone)]
pub enum ConversionUpdate {
    /// Work was submitted; show a loading overlay.
    Loading {
        identity: SourceIdentity,
        generation: u64,
    },
    /// Terminal outcome. Never carries `PipelineResult::Cancelled`.
    Finished {
        identity: SourceIdentity,
        generation: u64,
        result: PipelineResult,
    },
    /// The pending request was cancelled; hide any overlay.
    Dismissed { identity: SourceIdentity },
}

impl ConversionUpdate {
    pub const fn identity(&self) -> &SourceIdentity {
        match self {
            Self::Loading { identity, .. }
            | Self::Finished { identity, .. }
            | Self::Dismissed { identity } => identity,
        }
    }

    /// Whether this update answers the given ticket.
    pub fn matches(&self, ticket: &RequestTicket) -> bool {
        match self {
            Self::Loading {
                identity,
                generation,
            }
            | Self::Finished {
                identity,
                generation,
                ..
            } => *identity == ticket.identity && *generation == ticket.generation,
            Self::Dismissed { identity } => *identity == ticket.identity,
        }
    }
}
