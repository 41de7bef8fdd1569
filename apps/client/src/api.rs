//! Typed transport for the two-endpoint interview protocol.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server rejected the request ({status}): [{code}] {message}")]
    Server {
        status: u16,
        code: String,
        message: String,
    },
}

/// What the interview is about. Serializes to the server's flattened
/// `mode`-tagged context object.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum InterviewSetup {
    Job {
        role: String,
        company: String,
        industry: String,
        experience: String,
    },
    Mock {
        position: String,
        company_type: String,
        focus: String,
        intensity: String,
        experience: String,
        feedback_style: String,
    },
}

/// One answer ready to submit: the transcript, optional typed text, and
/// optional recorded media.
#[derive(Debug, Clone, Default)]
pub struct AnswerPayload {
    pub transcript: String,
    pub written: String,
    pub audio: Option<Vec<u8>>,
    pub video: Option<Vec<u8>>,
}

impl AnswerPayload {
    /// True when there is nothing to evaluate: transcript and typed text both
    /// blank. Media alone is not an answer.
    pub fn is_empty(&self) -> bool {
        self.transcript.trim().is_empty() && self.written.trim().is_empty()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StartedSession {
    pub session_id: Uuid,
    pub question: Option<String>,
    pub category: Option<u8>,
    pub completed: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TurnOutcome {
    pub question: Option<String>,
    pub category: Option<u8>,
    pub score: u8,
    pub overall_score: u8,
    pub ai_summary: String,
    pub current_analysis: String,
    pub completed: bool,
}

/// The protocol seam. `TurnController` is generic over this so its turn
/// sequencing is testable without a server.
#[async_trait]
pub trait InterviewApi: Send + Sync {
    async fn start(&self, user_id: Uuid, setup: &InterviewSetup)
        -> Result<StartedSession, ApiError>;

    async fn submit(
        &self,
        session_id: Uuid,
        answer: &AnswerPayload,
    ) -> Result<TurnOutcome, ApiError>;
}

/// Production transport over the Parley HTTP API.
pub struct HttpInterviewApi {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct StartRequestBody<'a> {
    user_id: Uuid,
    #[serde(flatten)]
    setup: &'a InterviewSetup,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    code: String,
    message: String,
}

impl HttpInterviewApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl InterviewApi for HttpInterviewApi {
    async fn start(
        &self,
        user_id: Uuid,
        setup: &InterviewSetup,
    ) -> Result<StartedSession, ApiError> {
        let response = self
            .client
            .post(format!("{}/api/v1/interviews/start", self.base_url))
            .json(&StartRequestBody { user_id, setup })
            .send()
            .await?;

        read_response(response).await
    }

    async fn submit(
        &self,
        session_id: Uuid,
        answer: &AnswerPayload,
    ) -> Result<TurnOutcome, ApiError> {
        let mut form = Form::new()
            .text("answer", answer.transcript.clone())
            .text("written", answer.written.clone());

        if let Some(audio) = &answer.audio {
            form = form.part(
                "audio",
                Part::bytes(audio.clone())
                    .file_name("audio.webm")
                    .mime_str("audio/webm")?,
            );
        }
        if let Some(video) = &answer.video {
            form = form.part(
                "video",
                Part::bytes(video.clone())
                    .file_name("video.webm")
                    .mime_str("video/webm")?,
            );
        }

        let response = self
            .client
            .post(format!(
                "{}/api/v1/interviews/{session_id}/answer",
                self.base_url
            ))
            .multipart(form)
            .send()
            .await?;

        read_response(response).await
    }
}

/// Decodes a success body, or the server's error envelope into `ApiError`.
async fn read_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let body = response.text().await.unwrap_or_default();
    let (code, message) = serde_json::from_str::<ErrorEnvelope>(&body)
        .map(|e| (e.error.code, e.error.message))
        .unwrap_or_else(|_| ("UNKNOWN".to_string(), body));

    Err(ApiError::Server {
        status: status.as_u16(),
        code,
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_payload_empty_rules() {
        assert!(AnswerPayload::default().is_empty());
        assert!(AnswerPayload {
            transcript: "  ".to_string(),
            written: "\t".to_string(),
            ..Default::default()
        }
        .is_empty());
        // Media alone is not an answer.
        assert!(AnswerPayload {
            audio: Some(vec![1, 2, 3]),
            ..Default::default()
        }
        .is_empty());
        assert!(!AnswerPayload {
            written: "typed".to_string(),
            ..Default::default()
        }
        .is_empty());
    }

    #[test]
    fn test_start_body_flattens_setup_with_mode_tag() {
        let body = StartRequestBody {
            user_id: Uuid::new_v4(),
            setup: &InterviewSetup::Job {
                role: "Backend Engineer".to_string(),
                company: "Initech".to_string(),
                industry: "fintech".to_string(),
                experience: "4 years".to_string(),
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["mode"], "job");
        assert_eq!(json["role"], "Backend Engineer");
        assert!(json["user_id"].is_string());
    }

    #[test]
    fn test_turn_outcome_deserializes_terminal_reply() {
        let json = serde_json::json!({
            "question": null,
            "category": null,
            "score": 8,
            "overall_score": 83,
            "ai_summary": "<p>done</p>",
            "current_analysis": "strong finish",
            "completed": true
        });
        let outcome: TurnOutcome = serde_json::from_value(json).unwrap();
        assert!(outcome.completed);
        assert!(outcome.question.is_none());
        assert_eq!(outcome.overall_score, 83);
    }
}
