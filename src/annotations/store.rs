//! Annotation Persistent Store
//!
//! SQLite-backed CRUD for annotations, keyed by id and queryable per media.
//! Time-point queries go through a lazily rebuilt second-bucket index and
//! are re-validated against the database before returning, so a stale index
//! can never surface a deleted or moved annotation.
//!
//! Every method takes `&self` and is safe to call from multiple threads;
//! the connection and the bucket index are guarded independently and never
//! held at the same time.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

use super::bucket::BucketIndex;
use super::models::{Annotation, AnnotationCategory, AnnotationStatus};
use crate::{AnnotationResult, MediaId, TimeMs};

// =============================================================================
// Constants
// =============================================================================

/// Directory under the user's home holding the default database
const DEFAULT_DATA_DIR: &str = ".reelmark";

/// Default database file name
const DB_FILE_NAME: &str = "annotations.db";

/// Column list shared by every row-returning query
const ANNOTATION_COLUMNS: &str = "id, media_id, start_ms, end_ms, text, category, status, \
     author, created_at, updated_at, shape, parent_id, metadata";

// =============================================================================
// Annotation Store
// =============================================================================

/// SQLite-backed local storage for annotations.
///
/// Owns the second-bucket index used by [`AnnotationStore::get_at_time`];
/// the index is derived state and is dropped wholesale for a media on any
/// mutation touching it.
pub struct AnnotationStore {
    conn: Mutex<Connection>,
    buckets: BucketIndex,
}

impl AnnotationStore {
    /// Opens (or creates) an annotation database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> AnnotationResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
            buckets: BucketIndex::new(),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Opens the database at the default per-user location
    /// (`~/.reelmark/annotations.db`)
    pub fn open_default() -> AnnotationResult<Self> {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::open(home.join(DEFAULT_DATA_DIR).join(DB_FILE_NAME))
    }

    /// Creates an in-memory store (for testing)
    pub fn in_memory() -> AnnotationResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
            buckets: BucketIndex::new(),
        };
        store.init_schema()?;
        Ok(store)
    }

    /// Initializes the database schema
    fn init_schema(&self) -> AnnotationResult<()> {
        self.conn.lock().unwrap().execute_batch(
            r#"
            -- Annotations table: one row per annotation
            CREATE TABLE IF NOT EXISTS annotations (
                id TEXT PRIMARY KEY,
                media_id TEXT NOT NULL,
                start_ms INTEGER NOT NULL,
                end_ms INTEGER,
                text TEXT NOT NULL,
                category TEXT NOT NULL DEFAULT 'general',
                status TEXT NOT NULL DEFAULT 'open',
                author TEXT NOT NULL DEFAULT 'anonymous',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                shape TEXT,
                parent_id TEXT,
                metadata TEXT NOT NULL DEFAULT '{}'
            );

            -- Indexes for per-media playback and workflow queries
            CREATE INDEX IF NOT EXISTS idx_annotations_media_time
                ON annotations(media_id, start_ms);
            CREATE INDEX IF NOT EXISTS idx_annotations_media_status
                ON annotations(media_id, status);
            "#,
        )?;
        Ok(())
    }

    /// Saves an annotation, inserting or replacing by id.
    ///
    /// Refreshes `updated_at`, invalidates the media's bucket index entry,
    /// and returns the record as persisted.
    pub fn save(&self, mut annotation: Annotation) -> AnnotationResult<Annotation> {
        annotation.touch();

        let shape_json = annotation
            .shape
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let metadata_json = serde_json::to_string(&annotation.metadata)?;

        {
            let conn = self.conn.lock().unwrap();
            conn.execute(
                "INSERT OR REPLACE INTO annotations
                    (id, media_id, start_ms, end_ms, text, category, status,
                     author, created_at, updated_at, shape, parent_id, metadata)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    annotation.id,
                    annotation.media_id,
                    annotation.start_ms,
                    annotation.end_ms,
                    annotation.text,
                    annotation.category.as_str(),
                    annotation.status.as_str(),
                    annotation.author,
                    annotation.created_at.to_rfc3339(),
                    annotation.updated_at.to_rfc3339(),
                    shape_json,
                    annotation.parent_id,
                    metadata_json,
                ],
            )?;
        }

        self.buckets.invalidate(&annotation.media_id);
        debug!(
            "saved annotation {} at {}ms on {}",
            annotation.id, annotation.start_ms, annotation.media_id
        );

        Ok(annotation)
    }

    /// Gets an annotation by id; absence is `Ok(None)`, not an error
    pub fn get(&self, annotation_id: &str) -> AnnotationResult<Option<Annotation>> {
        let conn = self.conn.lock().unwrap();
        let annotation = conn
            .query_row(
                &format!("SELECT {ANNOTATION_COLUMNS} FROM annotations WHERE id = ?1"),
                params![annotation_id],
                row_to_annotation,
            )
            .optional()?;
        Ok(annotation)
    }

    /// Deletes an annotation by id, reporting whether a row was removed
    pub fn delete(&self, annotation_id: &str) -> AnnotationResult<bool> {
        // Media id is looked up first for cache invalidation
        let media_id: Option<MediaId> = {
            let conn = self.conn.lock().unwrap();
            let media_id = conn
                .query_row(
                    "SELECT media_id FROM annotations WHERE id = ?1",
                    params![annotation_id],
                    |row| row.get(0),
                )
                .optional()?;

            if media_id.is_some() {
                conn.execute(
                    "DELETE FROM annotations WHERE id = ?1",
                    params![annotation_id],
                )?;
            }
            media_id
        };

        match media_id {
            Some(media_id) => {
                self.buckets.invalidate(&media_id);
                debug!("deleted annotation {}", annotation_id);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Gets all annotations for a media file, optionally filtered by exact
    /// status and/or category.
    ///
    /// Results are always ordered ascending by `start_ms`; playback UIs and
    /// the exporters rely on that ordering.
    pub fn get_by_media(
        &self,
        media_id: &str,
        status: Option<AnnotationStatus>,
        category: Option<AnnotationCategory>,
    ) -> AnnotationResult<Vec<Annotation>> {
        let mut sql = format!("SELECT {ANNOTATION_COLUMNS} FROM annotations WHERE media_id = ?");
        let mut filters = vec![media_id.to_string()];

        if let Some(status) = status {
            sql.push_str(" AND status = ?");
            filters.push(status.as_str().to_string());
        }
        if let Some(category) = category {
            sql.push_str(" AND category = ?");
            filters.push(category.as_str().to_string());
        }
        sql.push_str(" ORDER BY start_ms");

        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&sql)?;
        let annotations = stmt
            .query_map(rusqlite::params_from_iter(filters.iter()), row_to_annotation)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(annotations)
    }

    /// Gets the annotations visible at a specific time, ordered ascending
    /// by `start_ms`.
    ///
    /// Served through the second-bucket index (rebuilt lazily after any
    /// invalidation); the bucket is only a coarse pre-filter, so every
    /// candidate is re-fetched and re-tested before being returned.
    pub fn get_at_time(&self, media_id: &str, time_ms: TimeMs) -> AnnotationResult<Vec<Annotation>> {
        if !self.buckets.contains(media_id) {
            let annotations = self.get_by_media(media_id, None, None)?;
            self.buckets.rebuild(media_id, &annotations);
        }

        let mut visible = Vec::new();
        for id in self.buckets.candidates(media_id, time_ms) {
            // A candidate deleted since the index was built simply fails to
            // re-fetch and is dropped.
            if let Some(annotation) = self.get(&id)? {
                if annotation.contains_time(time_ms) {
                    visible.push(annotation);
                }
            }
        }

        visible.sort_by_key(|a| a.start_ms);
        Ok(visible)
    }

    /// Counts the annotations stored for a media file
    pub fn count_by_media(&self, media_id: &str) -> AnnotationResult<usize> {
        let conn = self.conn.lock().unwrap();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM annotations WHERE media_id = ?1",
            params![media_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

// =============================================================================
// Row Mapping
// =============================================================================

/// Converts a stored-value parse failure into a rusqlite conversion error
fn column_error(
    index: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(index, rusqlite::types::Type::Text, Box::new(err))
}

fn parse_timestamp(index: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| column_error(index, e))
}

/// Converts a database row to an Annotation
fn row_to_annotation(row: &Row<'_>) -> rusqlite::Result<Annotation> {
    let category: String = row.get(5)?;
    let status: String = row.get(6)?;
    let created_at: String = row.get(8)?;
    let updated_at: String = row.get(9)?;
    let shape_json: Option<String> = row.get(10)?;
    let metadata_json: Option<String> = row.get(12)?;

    Ok(Annotation {
        id: row.get(0)?,
        media_id: row.get(1)?,
        start_ms: row.get(2)?,
        end_ms: row.get(3)?,
        text: row.get(4)?,
        category: category.parse().map_err(|e| column_error(5, e))?,
        status: status.parse().map_err(|e| column_error(6, e))?,
        author: row.get(7)?,
        created_at: parse_timestamp(8, &created_at)?,
        updated_at: parse_timestamp(9, &updated_at)?,
        shape: shape_json
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(|e| column_error(10, e))?,
        parent_id: row.get(11)?,
        metadata: metadata_json
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(|e| column_error(12, e))?
            .unwrap_or_default(),
    })
}

// =============================================================================
// Tests
// =============================================================================
