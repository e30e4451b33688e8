//! Reelmark Core Type Definitions
//!
//! Defines fundamental types used throughout the crate.

// =============================================================================
// ID Types
// =============================================================================

/// Annotation unique identifier (ULID)
pub type AnnotationId = String;

/// Media unique identifier, derived from observable file attributes
/// (see [`crate::media::media_id_for_path`])
pub type MediaId = String;

// =============================================================================
// Time Types
// =============================================================================

/// Time in integer milliseconds
pub type TimeMs = i64;
