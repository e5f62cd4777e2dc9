//! # Mood Log — Response DTOs
//!
//! JSON shapes returned to the mobile client. Request bodies live next to
//! their model in `models::mood_entry`.
//!
//! Conventions:
//! - `*Response` → serialized to client JSON
//! - identifiers are rendered as strings

use serde::Serialize;
use uuid::Uuid;

use crate::services::insight::InsightSource;
use crate::services::voice::StoredVoiceNote;

/// POST /mood-log
#[derive(Debug, Serialize)]
pub struct MoodCreatedResponse {
    pub message: String,
    pub id: Uuid,
}

/// DELETE /mood/:id
#[derive(Debug, Serialize)]
pub struct MoodDeletedResponse {
    pub message: String,
    pub id: Uuid,
}

/// GET /mood/:id/insight
#[derive(Debug, Serialize)]
pub struct InsightResponse {
    pub mood_id: Uuid,
    pub insight: String,
    pub source: InsightSource,
}

/// POST /upload-voice
#[derive(Debug, Serialize)]
pub struct VoiceUploadResponse {
    pub message: String,
    pub filename: String,
    pub url: String,
}

impl From<StoredVoiceNote> for VoiceUploadResponse {
    fn from(note: StoredVoiceNote) -> Self {
        Self {
            message: "Voice note uploaded successfully".into(),
            filename: note.filename,
            url: note.url,
        }
    }
}
