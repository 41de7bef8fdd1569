//! Axum route handlers for the interview API.

use axum::{
    extract::{Multipart, Path, Query, State},
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::engine::{self, combined_answer, AnswerInput};
use crate::interview::models::{AppliedTurn, InterviewContext, InterviewSession};
use crate::interview::store::SessionSummary;
use crate::interview::InterviewError;
use crate::media::MediaKind;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct StartInterviewRequest {
    pub user_id: Uuid,
    /// Flattened context; the `mode` field selects the variant.
    #[serde(flatten)]
    pub context: InterviewContext,
}

#[derive(Debug, Serialize)]
pub struct StartInterviewResponse {
    pub session_id: Uuid,
    pub question: Option<String>,
    pub category: Option<u8>,
    pub completed: bool,
}

#[derive(Debug, Serialize)]
pub struct TurnResponse {
    pub question: Option<String>,
    pub category: Option<u8>,
    pub score: u8,
    pub overall_score: u8,
    pub ai_summary: String,
    pub current_analysis: String,
    pub completed: bool,
}

impl From<AppliedTurn> for TurnResponse {
    fn from(applied: AppliedTurn) -> Self {
        Self {
            question: applied.question,
            category: applied.category.map(|c| c.id()),
            score: applied.score,
            overall_score: applied.overall_score,
            ai_summary: applied.ai_summary,
            current_analysis: applied.current_analysis,
            completed: applied.completed,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UserIdQuery {
    pub user_id: Uuid,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/interviews/start
///
/// Creates a session and returns the opening question.
pub async fn handle_start(
    State(state): State<AppState>,
    Json(request): Json<StartInterviewRequest>,
) -> Result<Json<StartInterviewResponse>, AppError> {
    let started = engine::start_interview(
        state.store.as_ref(),
        state.model.as_ref(),
        request.user_id,
        request.context,
    )
    .await?;

    Ok(Json(StartInterviewResponse {
        session_id: started.session_id,
        question: started.question,
        category: started.category,
        completed: started.completed,
    }))
}

/// POST /api/v1/interviews/:id/answer
///
/// Multipart form: text parts `answer` (transcript) and `written`, optional
/// blob parts `audio` and `video`. Blobs are archived and analyzed
/// best-effort; the answer text drives the turn.
pub async fn handle_answer(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<Json<TurnResponse>, AppError> {
    let mut transcript = String::new();
    let mut written = String::new();
    let mut audio: Option<Bytes> = None;
    let mut video: Option<Bytes> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("malformed multipart body: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "answer" => {
                transcript = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("unreadable `answer` field: {e}")))?;
            }
            "written" => {
                written = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("unreadable `written` field: {e}")))?;
            }
            "audio" => {
                audio = Some(field.bytes().await.map_err(|e| {
                    AppError::Validation(format!("unreadable `audio` field: {e}"))
                })?);
            }
            "video" => {
                video = Some(field.bytes().await.map_err(|e| {
                    AppError::Validation(format!("unreadable `video` field: {e}"))
                })?);
            }
            _ => {} // unknown parts are ignored
        }
    }

    // Reject empty answers before touching object storage.
    if combined_answer(&transcript, &written).is_none() {
        return Err(InterviewError::EmptyAnswer.into());
    }

    let mut audio_key = None;
    if let Some(bytes) = audio {
        match state.media.archive(session_id, MediaKind::Audio, bytes).await {
            Ok(key) => audio_key = Some(key),
            Err(e) => warn!("audio archival failed for session {session_id}: {e:#}"),
        }
    }

    let mut video_key = None;
    let mut facial_analysis = None;
    if let Some(bytes) = video {
        facial_analysis = match state.analyzer.analyze(&bytes).await {
            Ok(analysis) => analysis,
            Err(e) => {
                warn!("facial analysis failed for session {session_id}: {e:#}");
                None
            }
        };
        match state.media.archive(session_id, MediaKind::Video, bytes).await {
            Ok(key) => video_key = Some(key),
            Err(e) => warn!("video archival failed for session {session_id}: {e:#}"),
        }
    }

    let applied = engine::submit_answer(
        state.store.as_ref(),
        state.model.as_ref(),
        &state.inflight,
        session_id,
        AnswerInput {
            transcript,
            written,
            facial_analysis,
            audio_key,
            video_key,
        },
    )
    .await?;

    Ok(Json(applied.into()))
}

/// GET /api/v1/interviews/:id
///
/// Returns the full session document.
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<InterviewSession>, AppError> {
    let session = state
        .store
        .fetch(session_id)
        .await
        .map_err(AppError::Internal)?
        .ok_or_else(|| AppError::NotFound(format!("Interview session {session_id} not found")))?;

    Ok(Json(session))
}

/// GET /api/v1/interviews?user_id=
///
/// Returns session summaries for a user, newest first.
pub async fn handle_list_sessions(
    State(state): State<AppState>,
    Query(params): Query<UserIdQuery>,
) -> Result<Json<Vec<SessionSummary>>, AppError> {
    let sessions = state
        .store
        .list_for_user(params.user_id)
        .await
        .map_err(AppError::Internal)?;

    Ok(Json(sessions))
}
