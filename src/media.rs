//! Media Identity and Frame Timing
//!
//! Derives a stable per-file identifier from observable file attributes and
//! provides frame-boundary helpers for frame-accurate seeking.

use std::fs;
use std::path::Path;
use std::time::SystemTime;

use crate::{AnnotationResult, MediaId, TimeMs};

// =============================================================================
// Media Identity
// =============================================================================

/// Derives a stable media identifier from a file's name, byte size, and
/// modification time.
///
/// The id is `{file_name}_{size}_{mtime}` with mtime in whole Unix seconds.
/// This keeps the annotation store self-contained without a separate media
/// registry; the accepted trade-off is that renaming, resizing, or touching
/// the file yields a different id and orphans its annotations.
pub fn media_id_for_path(path: &Path) -> AnnotationResult<MediaId> {
    let metadata = fs::metadata(path)?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mtime = metadata
        .modified()
        .unwrap_or(SystemTime::UNIX_EPOCH)
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    Ok(format!("{}_{}_{}", file_name, metadata.len(), mtime))
}

// =============================================================================
// Frame Timing
// =============================================================================

/// Duration of a single frame in milliseconds at the given frame rate
pub fn frame_duration_ms(fps: f64) -> f64 {
    1000.0 / fps
}

/// Snaps a time value to the nearest frame boundary
pub fn snap_to_frame(time_ms: TimeMs, fps: f64) -> TimeMs {
    let frame_duration = frame_duration_ms(fps);
    let frame_number = (time_ms as f64 / frame_duration).round();
    (frame_number * frame_duration) as TimeMs
}

// =============================================================================
// Tests
// =============================================================================
