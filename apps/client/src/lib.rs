//! Parley interview client.
//!
//! Drives the user-facing turn loop of an interview session: display the
//! question, capture the answer, submit it, show feedback, repeat until the
//! server reports completion. Media capture hardware and speech-to-text live
//! behind the `CaptureDevice` seam; the HTTP protocol lives behind
//! `InterviewApi`, with `HttpInterviewApi` as the production transport.

pub mod api;
pub mod capture;
pub mod controller;

pub use api::{
    AnswerPayload, ApiError, HttpInterviewApi, InterviewApi, InterviewSetup, StartedSession,
    TurnOutcome,
};
pub use capture::{CaptureDevice, CaptureError, CaptureSet};
pub use controller::{ControllerError, Phase, TurnController};
