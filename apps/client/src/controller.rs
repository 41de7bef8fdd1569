//! Client Turn Controller.
//!
//! An explicit finite-state machine sequencing the capture-device lifecycle
//! with the request/response protocol:
//!
//! `idle → recording → submitting → awaiting_next → recording → ... → completed`
//!
//! Invariants:
//! - empty answers are rejected locally, before any network call;
//! - devices stop before a submission and restart only when the next
//!   question arrives;
//! - a failed submission keeps the unsent answer for retry;
//! - every terminal transition (and drop) releases the devices.

use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::api::{AnswerPayload, ApiError, InterviewApi, InterviewSetup, TurnOutcome};
use crate::capture::CaptureSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Recording,
    Submitting,
    AwaitingNext,
    Completed,
}

#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("answer is empty")]
    EmptyAnswer,

    #[error("no interview in progress")]
    NoSession,

    #[error("interview already completed")]
    Completed,

    #[error("cannot {action} while {phase:?}")]
    InvalidPhase { action: &'static str, phase: Phase },

    #[error(transparent)]
    Api(#[from] ApiError),
}

pub struct TurnController<A: InterviewApi> {
    api: A,
    devices: CaptureSet,
    user_id: Uuid,
    phase: Phase,
    session_id: Option<Uuid>,
    current_question: Option<String>,
    current_category: Option<u8>,
    /// Unsent answer preserved across a failed submission.
    pending: Option<AnswerPayload>,
    last_outcome: Option<TurnOutcome>,
}

impl<A: InterviewApi> TurnController<A> {
    pub fn new(api: A, devices: CaptureSet, user_id: Uuid) -> Self {
        Self {
            api,
            devices,
            user_id,
            phase: Phase::Idle,
            session_id: None,
            current_question: None,
            current_category: None,
            pending: None,
            last_outcome: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn session_id(&self) -> Option<Uuid> {
        self.session_id
    }

    pub fn current_question(&self) -> Option<&str> {
        self.current_question.as_deref()
    }

    pub fn current_category(&self) -> Option<u8> {
        self.current_category
    }

    pub fn last_outcome(&self) -> Option<&TurnOutcome> {
        self.last_outcome.as_ref()
    }

    /// True when a failed submission is waiting for `retry`.
    pub fn has_pending_answer(&self) -> bool {
        self.pending.is_some()
    }

    /// Starts the interview and begins recording the first answer.
    pub async fn begin(&mut self, setup: InterviewSetup) -> Result<(), ControllerError> {
        if self.phase != Phase::Idle {
            return Err(ControllerError::InvalidPhase {
                action: "begin",
                phase: self.phase,
            });
        }

        let started = self.api.start(self.user_id, &setup).await?;
        self.session_id = Some(started.session_id);

        if started.completed {
            // The model can end the interview on the opening call.
            self.phase = Phase::Completed;
            return Ok(());
        }

        self.current_question = started.question;
        self.current_category = started.category;
        self.start_recording();
        Ok(())
    }

    /// Submits one answer and advances to the next question (or completion).
    /// On a network failure the answer is kept and `retry` resubmits it.
    pub async fn submit(&mut self, answer: AnswerPayload) -> Result<TurnOutcome, ControllerError> {
        match self.phase {
            Phase::Recording => {}
            Phase::Completed => return Err(ControllerError::Completed),
            Phase::Idle => return Err(ControllerError::NoSession),
            phase => {
                return Err(ControllerError::InvalidPhase {
                    action: "submit",
                    phase,
                })
            }
        }

        // Local validation first: no network call for an empty answer, and
        // the devices keep recording.
        if answer.is_empty() {
            return Err(ControllerError::EmptyAnswer);
        }

        self.devices.stop_all();
        self.phase = Phase::Submitting;
        self.send(answer).await
    }

    /// Resubmits the answer kept from a failed submission.
    pub async fn retry(&mut self) -> Result<TurnOutcome, ControllerError> {
        let answer = self.pending.take().ok_or(ControllerError::InvalidPhase {
            action: "retry",
            phase: self.phase,
        })?;
        self.send(answer).await
    }

    /// Ends the session locally, releasing the devices. Any in-flight server
    /// work completes on its own; its result is discarded.
    pub fn finish(&mut self) {
        self.devices.stop_all();
        self.phase = Phase::Completed;
    }

    async fn send(&mut self, answer: AnswerPayload) -> Result<TurnOutcome, ControllerError> {
        let session_id = self.session_id.ok_or(ControllerError::NoSession)?;

        match self.api.submit(session_id, &answer).await {
            Err(e) => {
                // Keep the unsent answer; the caller may retry the same
                // submission without data loss.
                self.pending = Some(answer);
                Err(e.into())
            }
            Ok(outcome) => {
                self.pending = None;
                self.phase = Phase::AwaitingNext;
                self.apply_outcome(&outcome);
                self.last_outcome = Some(outcome.clone());
                Ok(outcome)
            }
        }
    }

    fn apply_outcome(&mut self, outcome: &TurnOutcome) {
        if outcome.completed || outcome.question.is_none() {
            // No next question is a valid terminal reply.
            self.current_question = None;
            self.current_category = None;
            self.devices.stop_all();
            self.phase = Phase::Completed;
            return;
        }

        self.current_question = outcome.question.clone();
        self.current_category = outcome.category;
        self.start_recording();
    }

    fn start_recording(&mut self) {
        // A capture failure degrades to a text-only turn instead of killing
        // the session.
        if let Err(e) = self.devices.start_all() {
            warn!("capture devices unavailable, continuing text-only: {e}");
        }
        self.phase = Phase::Recording;
    }
}
