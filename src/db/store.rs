use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::mood_entry::{MoodEntry, NewMoodEntry};

/// Persistence seam for mood entries.
///
/// Every method performs at most one store mutation; there are no
/// multi-step transactions.
#[async_trait]
pub trait MoodStore: Send + Sync {
    /// Stores a new entry and returns the identifier the store assigned.
    async fn insert(&self, entry: NewMoodEntry) -> AppResult<Uuid>;

    /// All entries, newest `date` first.
    async fn list(&self) -> AppResult<Vec<MoodEntry>>;

    async fn find(&self, id: Uuid) -> AppResult<Option<MoodEntry>>;

    /// Returns `false` when nothing had that id.
    async fn delete(&self, id: Uuid) -> AppResult<bool>;

    /// Stores the insight only if the entry has none yet. Returns `false`
    /// when nothing had that id or another insight got there first.
    ///
    /// Only API-generated text is ever passed here; fallback text is never
    /// stored, so a stored insight is always a generated one.
    async fn set_insight(&self, id: Uuid, insight: &str) -> AppResult<bool>;

    /// Cheap round-trip used by the readiness probe.
    async fn ping(&self) -> AppResult<()>;
}

pub struct PgMoodStore {
    db: PgPool,
}

impl PgMoodStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MoodStore for PgMoodStore {
    async fn insert(&self, entry: NewMoodEntry) -> AppResult<Uuid> {
        let id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO mood_entries (mood, date, text_note, voice_note_filename, voice_note_url, insight, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(&entry.mood)
        .bind(entry.date)
        .bind(&entry.text_note)
        .bind(&entry.voice_note_filename)
        .bind(&entry.voice_note_url)
        .bind(&entry.insight)
        .bind(entry.created_at)
        .fetch_one(&self.db)
        .await?;

        Ok(id)
    }

    async fn list(&self) -> AppResult<Vec<MoodEntry>> {
        let entries = sqlx::query_as::<_, MoodEntry>(
            "SELECT * FROM mood_entries ORDER BY date DESC, created_at DESC",
        )
        .fetch_all(&self.db)
        .await?;

        Ok(entries)
    }

    async fn find(&self, id: Uuid) -> AppResult<Option<MoodEntry>> {
        let entry = sqlx::query_as::<_, MoodEntry>("SELECT * FROM mood_entries WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.db)
            .await?;

        Ok(entry)
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM mood_entries WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn set_insight(&self, id: Uuid, insight: &str) -> AppResult<bool> {
        let result = sqlx::query("UPDATE mood_entries SET insight = $2 WHERE id = $1 AND insight IS NULL")
            .bind(id)
            .bind(insight)
            .execute(&self.db)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.db)
            .await?;
        Ok(())
    }
}
