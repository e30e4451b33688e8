//! Annotation System Module
//!
//! Frame-accurate annotation storage and retrieval for media review:
//! - Annotation data model (point and range annotations, categories,
//!   workflow status, threaded replies, on-frame overlay shapes)
//! - SQLite persistent store with per-media queries
//! - Second-bucket index answering per-frame time queries during playback
//! - WebVTT/SRT/JSON export and JSON import
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use reelmark::annotations::{Annotation, AnnotationCategory, AnnotationStore, export_srt};
//!
//! let store = AnnotationStore::open_default()?;
//!
//! let annotation = Annotation::create(&media_id, 5000, "check pacing")
//!     .with_category(AnnotationCategory::Pacing);
//! let annotation = store.save(annotation)?;
//!
//! // Per-frame query during playback
//! let visible = store.get_at_time(&media_id, 5500)?;
//!
//! // Hand the review notes to an NLE
//! let srt = export_srt(&store.get_by_media(&media_id, None, None)?, true);
//! ```

mod bucket;
mod export;
mod models;
mod store;

// Re-export models
pub use models::{
    Annotation, AnnotationCategory, AnnotationStatus, OverlayRect, POINT_WINDOW_MS,
};

// Re-export storage
pub use store::AnnotationStore;

// Re-export codecs
pub use export::{
    export_json, export_json_to_file, export_srt, export_srt_to_file, export_vtt,
    export_vtt_to_file, import_json, import_json_file, ms_to_timecode, ExportEnvelope,
    TimecodeFormat,
};
