//! Interview engine: drives one request/response cycle of the turn-taking
//! protocol.
//!
//! Flow: claim session → load document → attach answer → build prompt →
//! model exchange (with one corrective retry on content errors) → fold the
//! validated result into the session → persist the whole document.
//!
//! The engine mutates only its own copy of the session and persists after the
//! fold succeeds, so any failure leaves the stored session unchanged and the
//! client can safely retry the same submission.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::interview::extractor::extract_turn_result;
use crate::interview::inflight::InflightSessions;
use crate::interview::models::{
    AppliedTurn, FacialAnalysis, InterviewContext, InterviewSession, ModelTurnResult,
    SessionStatus,
};
use crate::interview::prompts::{build_start_prompt, build_turn_prompt};
use crate::interview::session::SessionStateError;
use crate::interview::store::SessionStore;
use crate::interview::{InterviewError, ModelExchangeError};
use crate::llm_client::prompts::{INTERVIEWER_SYSTEM, STRICT_JSON_REMINDER};
use crate::llm_client::ModelClient;

/// Everything the client submitted for one turn, after the multipart layer
/// has archived media and run facial analysis.
#[derive(Debug, Default)]
pub struct AnswerInput {
    /// Speech-to-text transcript.
    pub transcript: String,
    /// Typed text, appended after the transcript when both are present.
    pub written: String,
    pub facial_analysis: Option<FacialAnalysis>,
    pub audio_key: Option<String>,
    pub video_key: Option<String>,
}

/// Result of starting a session. `question` is absent in the (rare) case the
/// model completes the interview on the opening call.
#[derive(Debug)]
pub struct StartedInterview {
    pub session_id: Uuid,
    pub question: Option<String>,
    pub category: Option<u8>,
    pub completed: bool,
}

/// Concatenates transcript and typed text; `None` when both are blank.
pub fn combined_answer(transcript: &str, written: &str) -> Option<String> {
    let transcript = transcript.trim();
    let written = written.trim();
    match (transcript.is_empty(), written.is_empty()) {
        (true, true) => None,
        (false, true) => Some(transcript.to_string()),
        (true, false) => Some(written.to_string()),
        (false, false) => Some(format!("{transcript}\n{written}")),
    }
}

/// Creates a session, asks the model for the opening question, persists the
/// new document.
pub async fn start_interview(
    store: &dyn SessionStore,
    model: &dyn ModelClient,
    user_id: Uuid,
    context: InterviewContext,
) -> Result<StartedInterview, InterviewError> {
    let mut session = InterviewSession::new(user_id, context);
    info!(
        session_id = %session.id,
        mode = session.context.mode(),
        "starting interview session"
    );

    let prompt = build_start_prompt(&session);
    let result = exchange(model, &prompt)
        .await
        .map_err(InterviewError::StartFailed)?;

    let applied = session.apply_turn_result(result);
    store
        .insert(&session)
        .await
        .map_err(InterviewError::Storage)?;

    Ok(StartedInterview {
        session_id: session.id,
        question: applied.question,
        category: applied.category.map(|c| c.id()),
        completed: applied.completed,
    })
}

/// Processes one answered turn. Exactly one exchange may be in flight per
/// session; a concurrent call gets `SessionBusy`.
pub async fn submit_answer(
    store: &dyn SessionStore,
    model: &dyn ModelClient,
    inflight: &Arc<InflightSessions>,
    session_id: Uuid,
    input: AnswerInput,
) -> Result<AppliedTurn, InterviewError> {
    let answer = combined_answer(&input.transcript, &input.written)
        .ok_or(InterviewError::EmptyAnswer)?;

    let _claim = inflight
        .try_claim(session_id)
        .ok_or(InterviewError::SessionBusy(session_id))?;

    let mut session = store
        .fetch(session_id)
        .await
        .map_err(InterviewError::Storage)?
        .ok_or(InterviewError::NotFound(session_id))?;

    if session.status == SessionStatus::Completed {
        return Err(InterviewError::AlreadyCompleted(session_id));
    }

    session
        .record_answer(
            answer,
            input.facial_analysis,
            input.audio_key,
            input.video_key,
        )
        .map_err(|e| match e {
            SessionStateError::Completed => InterviewError::AlreadyCompleted(session_id),
            SessionStateError::NoOpenTurn => InterviewError::Corrupt(session_id),
        })?;

    let prompt = build_turn_prompt(&session);
    let result = exchange(model, &prompt)
        .await
        .map_err(InterviewError::TurnFailed)?;

    let applied = session.apply_turn_result(result);
    store
        .update(&session)
        .await
        .map_err(InterviewError::Storage)?;

    info!(
        session_id = %session_id,
        turns = session.turns.len(),
        overall_score = applied.overall_score,
        completed = applied.completed,
        forced = applied.forced_completion,
        "interview turn processed"
    );

    Ok(applied)
}

/// One model exchange. Content errors (no fence, bad JSON, schema drift) get
/// a single corrective retry with a stricter follow-up appended; transient
/// transport errors are already retried inside the adapter.
async fn exchange(
    model: &dyn ModelClient,
    prompt: &str,
) -> Result<ModelTurnResult, ModelExchangeError> {
    let raw = model.generate(prompt, INTERVIEWER_SYSTEM).await?;

    match extract_turn_result(&raw) {
        Ok(result) => Ok(result),
        Err(first) => {
            warn!("model reply failed extraction ({first}); retrying once with strict reminder");
            let follow_up = format!("{prompt}\n\n{STRICT_JSON_REMINDER}");
            let raw = model.generate(&follow_up, INTERVIEWER_SYSTEM).await?;
            Ok(extract_turn_result(&raw)?)
        }
    }
}
