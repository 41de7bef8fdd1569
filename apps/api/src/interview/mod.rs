//! The interview turn-taking protocol: prompt building, model invocation,
//! response extraction, and the session state machine.

pub mod engine;
pub mod extractor;
pub mod handlers;
pub mod inflight;
pub mod models;
pub mod prompts;
pub mod session;
pub mod store;

use thiserror::Error;
use uuid::Uuid;

use crate::interview::extractor::ExtractError;
use crate::llm_client::LlmError;

/// One failed model exchange: either the call itself or the extraction of a
/// usable turn result from the reply.
#[derive(Debug, Error)]
pub enum ModelExchangeError {
    #[error(transparent)]
    Model(#[from] LlmError),

    #[error(transparent)]
    Extract(#[from] ExtractError),
}

/// Engine-level errors surfaced to the HTTP layer. Model and extraction
/// failures are wrapped with the phase they occurred in so the client can
/// distinguish "could not start" from "this turn failed, retry it".
#[derive(Debug, Error)]
pub enum InterviewError {
    #[error("answer is empty")]
    EmptyAnswer,

    #[error("interview session {0} not found")]
    NotFound(Uuid),

    #[error("a submission is already in flight for session {0}")]
    SessionBusy(Uuid),

    #[error("interview session {0} is already completed")]
    AlreadyCompleted(Uuid),

    #[error("session {0} is in an inconsistent state: no turn awaiting an answer")]
    Corrupt(Uuid),

    #[error("failed to start interview session: {0}")]
    StartFailed(#[source] ModelExchangeError),

    #[error("failed to process interview turn: {0}")]
    TurnFailed(#[source] ModelExchangeError),

    #[error("session storage failure: {0}")]
    Storage(#[source] anyhow::Error),
}
