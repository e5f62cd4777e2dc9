use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, Path, State,
    },
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};

use crate::dto::VoiceUploadResponse;
use crate::error::{AppError, AppResult};
use crate::services::voice::content_type_for;
use crate::AppState;

/// Multipart field the mobile client sends the recording under.
const VOICE_FIELD: &str = "voice_note";

pub async fn upload_voice(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<(StatusCode, Json<VoiceUploadResponse>)> {
    let mut multipart = multipart.map_err(|e| AppError::Validation(e.body_text()))?;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(VOICE_FIELD) {
            continue;
        }

        let original_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.map_err(multipart_error)?;
        let stored = state.voice.save(&original_name, &bytes).await?;

        return Ok((StatusCode::CREATED, Json(stored.into())));
    }

    Err(AppError::Validation("No voice file provided".into()))
}

pub async fn serve_voice(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> AppResult<impl IntoResponse> {
    let bytes = state.voice.read(&filename).await?;
    Ok(([(header::CONTENT_TYPE, content_type_for(&filename))], bytes))
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.body_text())
    } else {
        AppError::Validation(e.body_text())
    }
}
