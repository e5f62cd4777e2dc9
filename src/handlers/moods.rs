use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};

use crate::dto::{InsightResponse, MoodCreatedResponse, MoodDeletedResponse};
use crate::error::{AppError, AppResult};
use crate::models::mood_entry::{parse_entry_id, CreateMoodEntryRequest, MoodEntry, NewMoodEntry};
use crate::services::insight::{InsightSource, InsightSubject};
use crate::AppState;

pub async fn create_mood_entry(
    State(state): State<AppState>,
    payload: Result<Json<CreateMoodEntryRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<MoodCreatedResponse>)> {
    let Json(body) = payload?;
    let mut entry = NewMoodEntry::try_from(body)?;

    // Insight is generated once, here, when there is a note to analyze.
    if !entry.text_note.trim().is_empty() {
        let insight = state.insights.generate(InsightSubject::from(&entry)).await;
        if insight.is_generated() {
            entry.insight = Some(insight.text);
        }
    }

    let id = state.store.insert(entry).await?;
    tracing::info!(mood_id = %id, "Mood logged");

    Ok((
        StatusCode::CREATED,
        Json(MoodCreatedResponse {
            message: "Mood logged successfully".into(),
            id,
        }),
    ))
}

pub async fn list_mood_history(State(state): State<AppState>) -> AppResult<Json<Vec<MoodEntry>>> {
    let entries = state.store.list().await?;
    Ok(Json(entries))
}

pub async fn delete_mood_entry(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> AppResult<Json<MoodDeletedResponse>> {
    let id = parse_entry_id(&raw_id)?;

    if !state.store.delete(id).await? {
        return Err(AppError::NotFound("Mood entry not found".into()));
    }
    tracing::info!(mood_id = %id, "Mood deleted");

    Ok(Json(MoodDeletedResponse {
        message: "Mood deleted successfully".into(),
        id,
    }))
}

/// Returns the stored insight, or generates one for entries that have none
/// yet. A generated insight is persisted and never regenerated afterwards.
pub async fn get_mood_insight(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> AppResult<Json<InsightResponse>> {
    let id = parse_entry_id(&raw_id)?;

    let entry = state
        .store
        .find(id)
        .await?
        .ok_or(AppError::NotFound("Mood entry not found".into()))?;

    if let Some(stored) = entry.insight.as_deref().filter(|s| !s.trim().is_empty()) {
        return Ok(Json(InsightResponse {
            mood_id: id,
            insight: stored.to_string(),
            source: InsightSource::Llm,
        }));
    }

    let insight = state.insights.generate(InsightSubject::from(&entry)).await;
    if insight.is_generated() && !state.store.set_insight(id, &insight.text).await? {
        // A concurrent request stored its insight first; hand out that one.
        let stored = state
            .store
            .find(id)
            .await?
            .ok_or(AppError::NotFound("Mood entry not found".into()))?
            .insight
            .ok_or_else(|| AppError::Upstream("Insight was not stored".into()))?;
        tracing::debug!(mood_id = %id, "Insight already stored by another request");

        return Ok(Json(InsightResponse {
            mood_id: id,
            insight: stored,
            source: InsightSource::Llm,
        }));
    }

    Ok(Json(InsightResponse {
        mood_id: id,
        insight: insight.text,
        source: insight.source,
    }))
}
