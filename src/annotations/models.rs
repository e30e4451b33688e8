//! Annotation Data Models
//!
//! Defines the annotation entity and its closed enumerations.
//!
//! Times are integer milliseconds so that repeated timecode conversion
//! cannot accumulate floating-point drift. Overlay coordinates are
//! normalized percentages (0.0-1.0) for resolution-independent rendering.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{AnnotationError, AnnotationId, MediaId, TimeMs};

// =============================================================================
// Constants
// =============================================================================

/// Visibility window around a point annotation's timestamp, so that a
/// single-instant note stays on screen for a short span during playback.
pub const POINT_WINDOW_MS: TimeMs = 500;

// =============================================================================
// Category and Status
// =============================================================================

/// Annotation categories for filtering and organization
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationCategory {
    #[default]
    General,
    Pacing,
    Pronunciation,
    AudioQuality,
    Timing,
    Content,
    Technical,
}

impl AnnotationCategory {
    /// Returns the wire/storage name of this category
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Pacing => "pacing",
            Self::Pronunciation => "pronunciation",
            Self::AudioQuality => "audio_quality",
            Self::Timing => "timing",
            Self::Content => "content",
            Self::Technical => "technical",
        }
    }
}

impl std::fmt::Display for AnnotationCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnnotationCategory {
    type Err = AnnotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "general" => Ok(Self::General),
            "pacing" => Ok(Self::Pacing),
            "pronunciation" => Ok(Self::Pronunciation),
            "audio_quality" => Ok(Self::AudioQuality),
            "timing" => Ok(Self::Timing),
            "content" => Ok(Self::Content),
            "technical" => Ok(Self::Technical),
            _ => Err(AnnotationError::InvalidCategory(s.to_string())),
        }
    }
}

/// Workflow status of an annotation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationStatus {
    #[default]
    Open,
    InProgress,
    Resolved,
    WontFix,
}

impl AnnotationStatus {
    /// Returns the wire/storage name of this status
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::InProgress => "in_progress",
            Self::Resolved => "resolved",
            Self::WontFix => "wont_fix",
        }
    }
}

impl std::fmt::Display for AnnotationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnnotationStatus {
    type Err = AnnotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(Self::Open),
            "in_progress" => Ok(Self::InProgress),
            "resolved" => Ok(Self::Resolved),
            "wont_fix" => Ok(Self::WontFix),
            _ => Err(AnnotationError::InvalidStatus(s.to_string())),
        }
    }
}

// =============================================================================
// Overlay Shape
// =============================================================================

/// Normalized rectangle for on-frame overlay annotations.
///
/// All coordinates are fractions of the frame dimensions in the range
/// [0.0, 1.0]. The range is a contract with the rendering layer, not
/// enforced here.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OverlayRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl OverlayRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

// =============================================================================
// Annotation Entity
// =============================================================================

fn default_author() -> String {
    "anonymous".to_string()
}

/// A point or range annotation attached to a media file.
///
/// `id` is the only identity-bearing field; everything except `id`,
/// `media_id`, and `created_at` is mutable through the load-mutate-save
/// cycle. Field names are the fixed wire contract consumed by the player
/// shell, so serde uses them verbatim.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// Unique identifier, generated at creation, immutable
    pub id: AnnotationId,
    /// Owning media file
    pub media_id: MediaId,
    /// Start time in integer milliseconds
    pub start_ms: TimeMs,
    /// End time in milliseconds; `None` (or a value not after `start_ms`)
    /// marks a point annotation
    pub end_ms: Option<TimeMs>,
    /// Annotation body
    pub text: String,
    #[serde(default)]
    pub category: AnnotationCategory,
    #[serde(default)]
    pub status: AnnotationStatus,
    #[serde(default = "default_author")]
    pub author: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
    /// Normalized on-frame overlay rectangle; absent for non-visual notes
    #[serde(default)]
    pub shape: Option<OverlayRect>,
    /// Parent annotation for threaded replies. Neither existence nor
    /// acyclicity of the referenced id is validated.
    #[serde(default)]
    pub parent_id: Option<AnnotationId>,
    /// Open extension map
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl Annotation {
    /// Creates a new annotation with a generated id and fresh timestamps.
    ///
    /// Optional fields are filled in through the `with_*` builders.
    pub fn create(media_id: &str, start_ms: TimeMs, text: &str) -> Self {
        let now = Utc::now();
        Self {
            id: ulid::Ulid::new().to_string(),
            media_id: media_id.to_string(),
            start_ms,
            end_ms: None,
            text: text.to_string(),
            category: AnnotationCategory::default(),
            status: AnnotationStatus::default(),
            author: default_author(),
            created_at: now,
            updated_at: now,
            shape: None,
            parent_id: None,
            metadata: HashMap::new(),
        }
    }

    /// Sets the end time, turning this into a range annotation when
    /// `end_ms` is after `start_ms`
    pub fn with_end_ms(mut self, end_ms: TimeMs) -> Self {
        self.end_ms = Some(end_ms);
        self
    }

    /// Sets the category
    pub fn with_category(mut self, category: AnnotationCategory) -> Self {
        self.category = category;
        self
    }

    /// Sets the author attribution
    pub fn with_author(mut self, author: &str) -> Self {
        self.author = author.to_string();
        self
    }

    /// Attaches an on-frame overlay rectangle
    pub fn with_shape(mut self, shape: OverlayRect) -> Self {
        self.shape = Some(shape);
        self
    }

    /// Threads this annotation under a parent annotation
    pub fn with_parent(mut self, parent_id: &str) -> Self {
        self.parent_id = Some(parent_id.to_string());
        self
    }

    /// Returns true if this is a range annotation rather than point-in-time
    pub fn is_range(&self) -> bool {
        self.end_ms.is_some_and(|end_ms| end_ms > self.start_ms)
    }

    /// Returns true if the annotation is visible at the given time.
    ///
    /// Range annotations cover `[start_ms, end_ms]` inclusive; point
    /// annotations match within [`POINT_WINDOW_MS`] of their timestamp.
    pub fn contains_time(&self, time_ms: TimeMs) -> bool {
        match self.end_ms {
            Some(end_ms) if end_ms > self.start_ms => {
                self.start_ms <= time_ms && time_ms <= end_ms
            }
            _ => (time_ms - self.start_ms).abs() <= POINT_WINDOW_MS,
        }
    }

    /// Refreshes the updated timestamp
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

// =============================================================================
// Tests
// =============================================================================
