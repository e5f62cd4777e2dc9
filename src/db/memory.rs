use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::db::store::MoodStore;
use crate::error::AppResult;
use crate::models::mood_entry::{MoodEntry, NewMoodEntry};

/// In-process store used when no `DATABASE_URL` is configured.
/// Contents are lost on restart.
#[derive(Clone, Default)]
pub struct MemoryMoodStore {
    entries: Arc<RwLock<HashMap<Uuid, MoodEntry>>>,
}

impl MemoryMoodStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MoodStore for MemoryMoodStore {
    async fn insert(&self, entry: NewMoodEntry) -> AppResult<Uuid> {
        let mut entries = self.entries.write().await;
        let mut id = Uuid::new_v4();
        while entries.contains_key(&id) {
            id = Uuid::new_v4();
        }

        entries.insert(
            id,
            MoodEntry {
                id,
                mood: entry.mood,
                date: entry.date,
                text_note: entry.text_note,
                voice_note_filename: entry.voice_note_filename,
                voice_note_url: entry.voice_note_url,
                insight: entry.insight,
                created_at: entry.created_at,
            },
        );
        Ok(id)
    }

    async fn list(&self) -> AppResult<Vec<MoodEntry>> {
        let entries = self.entries.read().await;
        let mut all: Vec<MoodEntry> = entries.values().cloned().collect();
        all.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(all)
    }

    async fn find(&self, id: Uuid) -> AppResult<Option<MoodEntry>> {
        Ok(self.entries.read().await.get(&id).cloned())
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.entries.write().await.remove(&id).is_some())
    }

    async fn set_insight(&self, id: Uuid, insight: &str) -> AppResult<bool> {
        let mut entries = self.entries.write().await;
        match entries.get_mut(&id) {
            Some(entry) if entry.insight.is_none() => {
                entry.insight = Some(insight.to_string());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn new_entry(mood: &str, day: u32) -> NewMoodEntry {
        NewMoodEntry {
            mood: mood.into(),
            date: Utc.with_ymd_and_hms(2024, 1, day, 9, 0, 0).unwrap(),
            text_note: String::new(),
            voice_note_filename: String::new(),
            voice_note_url: String::new(),
            insight: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_fresh_ids() {
        let store = MemoryMoodStore::new();
        let a = store.insert(new_entry("Happy", 1)).await.unwrap();
        let b = store.insert(new_entry("Happy", 1)).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(store.find(a).await.unwrap().unwrap().id, a);
    }

    #[tokio::test]
    async fn test_list_orders_by_date_descending() {
        let store = MemoryMoodStore::new();
        for (mood, day) in [("Sad", 3), ("Happy", 10), ("Calm", 1), ("Tired", 7)] {
            store.insert(new_entry(mood, day)).await.unwrap();
        }

        let listed = store.list().await.unwrap();
        let moods: Vec<&str> = listed.iter().map(|e| e.mood.as_str()).collect();
        assert_eq!(moods, vec!["Happy", "Tired", "Sad", "Calm"]);
        assert!(listed.windows(2).all(|w| w[0].date >= w[1].date));
    }

    #[tokio::test]
    async fn test_same_date_breaks_tie_on_created_at() {
        let store = MemoryMoodStore::new();
        let mut older = new_entry("First", 5);
        older.created_at = Utc::now() - Duration::minutes(5);
        store.insert(older).await.unwrap();
        store.insert(new_entry("Second", 5)).await.unwrap();

        let listed = store.list().await.unwrap();
        assert_eq!(listed[0].mood, "Second");
    }

    #[tokio::test]
    async fn test_delete_removes_exactly_one() {
        let store = MemoryMoodStore::new();
        let keep = store.insert(new_entry("Happy", 1)).await.unwrap();
        let gone = store.insert(new_entry("Sad", 2)).await.unwrap();

        assert!(store.delete(gone).await.unwrap());
        assert!(!store.delete(gone).await.unwrap());
        assert!(store.find(gone).await.unwrap().is_none());
        assert!(store.find(keep).await.unwrap().is_some());
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_unknown_id() {
        let store = MemoryMoodStore::new();
        assert!(!store.delete(Uuid::new_v4()).await.unwrap());
    }

    #[tokio::test]
    async fn test_set_insight() {
        let store = MemoryMoodStore::new();
        let id = store.insert(new_entry("Happy", 1)).await.unwrap();

        assert!(store.set_insight(id, "1. Analysis").await.unwrap());
        assert_eq!(
            store.find(id).await.unwrap().unwrap().insight.as_deref(),
            Some("1. Analysis")
        );
        assert!(!store.set_insight(Uuid::new_v4(), "x").await.unwrap());
    }

    #[tokio::test]
    async fn test_set_insight_keeps_first_value() {
        let store = MemoryMoodStore::new();
        let id = store.insert(new_entry("Happy", 1)).await.unwrap();

        assert!(store.set_insight(id, "first").await.unwrap());
        assert!(!store.set_insight(id, "second").await.unwrap());
        assert_eq!(
            store.find(id).await.unwrap().unwrap().insight.as_deref(),
            Some("first")
        );
    }
}
