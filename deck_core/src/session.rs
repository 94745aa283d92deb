//! # Session Persistence
//!
//! A [`Session`] bundles one optimization graph with the metadata an
//! engineering workflow needs: who owns it, which job it belongs to,
//! and when it was touched. Sessions round-trip through JSON `.ses`
//! files.
//!
//! ## Save semantics
//!
//! - **Atomic saves**: write to `.tmp`, fsync, rename
//! - **Versioned**: files carry the schema version and loading rejects
//!   incompatible ones

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{DeckError, DeckResult};
use crate::model::OptModel;

/// Current file schema version. Bump on breaking format changes.
pub const SCHEMA_VERSION: &str = "0.1.0";

/// Identity and provenance of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMetadata {
    /// Stable id, assigned at creation and kept across saves.
    pub id: Uuid,

    /// Schema version the file was written with.
    pub version: String,

    /// Name of the responsible engineer.
    pub engineer: String,

    /// Job/project number.
    pub job_id: String,

    /// When the session was created.
    pub created: DateTime<Utc>,

    /// When the session was last modified.
    pub modified: DateTime<Utc>,
}

/// Root container serialized to `.ses` files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub meta: SessionMetadata,
    pub model: OptModel,
}

impl Session {
    pub fn new(engineer: impl Into<String>, job_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Session {
            meta: SessionMetadata {
                id: Uuid::new_v4(),
                version: SCHEMA_VERSION.to_string(),
                engineer: engineer.into(),
                job_id: job_id.into(),
                created: now,
                modified: now,
            },
            model: OptModel::new(),
        }
    }

    /// Record a modification time. Callers do this after mutating the
    /// model, right before saving.
    pub fn touch(&mut self) {
        self.meta.modified = Utc::now();
    }
}

/// Save a session with atomic write semantics: serialize, write to a
/// temporary file, fsync, rename over the target.
pub fn save_session(session: &Session, path: &Path) -> DeckResult<()> {
    let json = serde_json::to_string_pretty(session).map_err(|e| DeckError::SerializationError {
        reason: e.to_string(),
    })?;

    let tmp_path = path.with_extension("ses.tmp");

    let mut tmp_file = File::create(&tmp_path).map_err(|e| {
        DeckError::file_error("create temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    tmp_file.write_all(json.as_bytes()).map_err(|e| {
        DeckError::file_error("write temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    tmp_file.sync_all().map_err(|e| {
        DeckError::file_error("sync temp file", tmp_path.display().to_string(), e.to_string())
    })?;

    fs::rename(&tmp_path, path).map_err(|e| {
        // Clean up temp file if rename fails
        let _ = fs::remove_file(&tmp_path);
        DeckError::file_error("rename to final", path.display().to_string(), e.to_string())
    })?;

    Ok(())
}

/// Load a session, rejecting files written under an incompatible
/// schema version.
pub fn load_session(path: &Path) -> DeckResult<Session> {
    let mut file = File::open(path)
        .map_err(|e| DeckError::file_error("open", path.display().to_string(), e.to_string()))?;

    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .map_err(|e| DeckError::file_error("read", path.display().to_string(), e.to_string()))?;

    let session: Session =
        serde_json::from_str(&contents).map_err(|e| DeckError::SerializationError {
            reason: format!("Invalid JSON in {}: {}", path.display(), e),
        })?;

    validate_version(&session.meta.version)?;

    Ok(session)
}

/// Validate that a file version is compatible with the current schema.
fn validate_version(file_version: &str) -> DeckResult<()> {
    let file_parts: Vec<u32> = file_version
        .split('.')
        .filter_map(|p| p.parse().ok())
        .collect();
    let current_parts: Vec<u32> = SCHEMA_VERSION
        .split('.')
        .filter_map(|p| p.parse().ok())
        .collect();

    if file_parts.len() < 2 || current_parts.len() < 2 {
        return Err(DeckError::VersionMismatch {
            file_version: file_version.to_string(),
            expected_version: SCHEMA_VERSION.to_string(),
        });
    }

    // Major version must match
    if file_parts[0] != current_parts[0] {
        return Err(DeckError::VersionMismatch {
            file_version: file_version.to_string(),
            expected_version: SCHEMA_VERSION.to_string(),
        });
    }

    // For 0.x versions, minor version must also match
    if file_parts[0] == 0 && file_parts[1] != current_parts[1] {
        return Err(DeckError::VersionMismatch {
            file_version: file_version.to_string(),
            expected_version: SCHEMA_VERSION.to_string(),
        });
    }

    Ok(())
}
