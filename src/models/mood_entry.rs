use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};

/// A stored mood log entry. `id` goes over the wire as `_id`, which is
/// what the mobile client keys its list on.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MoodEntry {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub mood: String,
    pub date: DateTime<Utc>,
    pub text_note: String,
    pub voice_note_filename: String,
    pub voice_note_url: String,
    pub insight: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// POST /mood-log
#[derive(Debug, Default, Deserialize, Validate)]
pub struct CreateMoodEntryRequest {
    #[validate(
        required(message = "mood is required"),
        length(min = 1, message = "mood is required")
    )]
    pub mood: Option<String>,
    #[validate(required(message = "date is required"))]
    pub date: Option<String>,
    pub text_note: Option<String>,
    pub voice_note_filename: Option<String>,
}

/// A validated entry ready for insertion. The store assigns the id.
#[derive(Debug, Clone)]
pub struct NewMoodEntry {
    pub mood: String,
    pub date: DateTime<Utc>,
    pub text_note: String,
    pub voice_note_filename: String,
    pub voice_note_url: String,
    pub insight: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<CreateMoodEntryRequest> for NewMoodEntry {
    type Error = AppError;

    fn try_from(req: CreateMoodEntryRequest) -> AppResult<Self> {
        req.validate()?;

        let mood = req.mood.unwrap_or_default();
        if mood.is_empty() {
            return Err(AppError::Validation("mood is required".into()));
        }

        let raw_date = req.date.unwrap_or_default();
        let date = parse_entry_date(&raw_date).ok_or_else(|| {
            AppError::Validation(format!("date '{}' is not a valid ISO-8601 timestamp", raw_date))
        })?;

        let voice_note_filename = req.voice_note_filename.unwrap_or_default();
        if voice_note_filename.contains(['/', '\\']) || voice_note_filename.contains("..") {
            return Err(AppError::Validation("voice_note_filename is invalid".into()));
        }

        Ok(Self {
            mood,
            date,
            text_note: req.text_note.unwrap_or_default(),
            voice_note_url: voice_note_url(&voice_note_filename),
            voice_note_filename,
            insight: None,
            created_at: Utc::now(),
        })
    }
}

/// Public path of an uploaded voice note, empty when there is none.
pub fn voice_note_url(filename: &str) -> String {
    if filename.is_empty() {
        String::new()
    } else {
        format!("/voice/{}", filename)
    }
}

/// Parses the ISO-8601 shapes clients send. Timestamps without an offset
/// are taken as UTC; a bare date means midnight UTC.
pub fn parse_entry_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M%:z", "%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M%:z"] {
        if let Ok(dt) = DateTime::parse_from_str(raw, fmt) {
            return Some(dt.with_timezone(&Utc));
        }
    }
    for fmt in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%MZ",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    // Hour-only, e.g. `2024-01-01T10`
    if let Some((day, hour)) = raw.split_once('T') {
        if hour.len() == 2 && hour.bytes().all(|b| b.is_ascii_digit()) {
            return NaiveDateTime::parse_from_str(&format!("{}T{}:00", day, hour), "%Y-%m-%dT%H:%M")
                .ok()
                .map(|naive| naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Parses a path identifier. A malformed token is a client error, not a
/// missing entry.
pub fn parse_entry_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw)
        .map_err(|_| AppError::Validation(format!("'{}' is not a valid mood entry id", raw)))
}
