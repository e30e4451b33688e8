//! Reelmark Core Engine
//!
//! Frame-accurate annotation engine for media review sessions.
//! Annotations attach to a media file at millisecond-precision timestamps
//! (integers, so repeated timecode conversion cannot drift), persist in a
//! local SQLite database, answer "what is visible at time T" queries at
//! playback rate through a second-bucket index, and round-trip through
//! WebVTT, SRT, and JSON.
//!
//! The HTTP and CLI shells that drive the engine live outside this crate;
//! they resolve a [`MediaId`] via [`media::media_id_for_path`], then issue
//! CRUD calls against [`annotations::AnnotationStore`].

pub mod annotations;
pub mod media;

// Re-export common types
mod types;
pub use types::*;

mod error;
pub use error::*;
