//! Data model for interview sessions, turns, and the model turn contract.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The nine fixed interview-question topic buckets. The model refers to them
/// by numeric id on the wire; internally they are a closed enum.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    GeneralPersonal,
    Technical,
    Behavioral,
    ProblemSolving,
    Situational,
    WorkExperience,
    CompanyIndustry,
    CulturalFit,
    CandidateQuestions,
}

impl Category {
    pub const ALL: [Category; 9] = [
        Category::GeneralPersonal,
        Category::Technical,
        Category::Behavioral,
        Category::ProblemSolving,
        Category::Situational,
        Category::WorkExperience,
        Category::CompanyIndustry,
        Category::CulturalFit,
        Category::CandidateQuestions,
    ];

    pub fn id(self) -> u8 {
        match self {
            Category::GeneralPersonal => 1,
            Category::Technical => 2,
            Category::Behavioral => 3,
            Category::ProblemSolving => 4,
            Category::Situational => 5,
            Category::WorkExperience => 6,
            Category::CompanyIndustry => 7,
            Category::CulturalFit => 8,
            Category::CandidateQuestions => 9,
        }
    }

    pub fn from_id(id: u8) -> Option<Category> {
        Category::ALL.into_iter().find(|c| c.id() == id)
    }

    pub fn label(self) -> &'static str {
        match self {
            Category::GeneralPersonal => "general / personal background",
            Category::Technical => "technical",
            Category::Behavioral => "behavioral",
            Category::ProblemSolving => "problem-solving",
            Category::Situational => "situational",
            Category::WorkExperience => "work experience",
            Category::CompanyIndustry => "company / industry",
            Category::CulturalFit => "cultural fit",
            Category::CandidateQuestions => "candidate questions for the interviewer",
        }
    }
}

/// Immutable snapshot of what the interview is about, captured at session
/// start. The variant doubles as the session mode on the wire (`"job"` /
/// `"mock"`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum InterviewContext {
    Job(JobContext),
    Mock(MockContext),
}

impl InterviewContext {
    pub fn mode(&self) -> &'static str {
        match self {
            InterviewContext::Job(_) => "job",
            InterviewContext::Mock(_) => "mock",
        }
    }
}

/// Job mode: the candidate is preparing for a specific opening.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobContext {
    pub role: String,
    pub company: String,
    pub industry: String,
    pub experience: String,
}

/// Mock mode: a configurable practice interview.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MockContext {
    pub position: String,
    pub company_type: String,
    pub focus: String,
    pub intensity: String,
    pub experience: String,
    pub feedback_style: String,
}

/// One emotion reading from the facial-analysis collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmotionReading {
    pub emotion: String,
    pub intensity: f32,
}

/// Structured summary supplied by the external video-analysis collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacialAnalysis {
    pub emotions: Vec<EmotionReading>,
    pub expression_analysis: String,
}

/// One question/answer/score unit within a session. Append-only; the score
/// for turn n is assigned during the n+1th model call, once the answer exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub question: String,
    pub category: Category,
    pub answer: Option<String>,
    pub facial_analysis: Option<FacialAnalysis>,
    /// 0-10, assigned retroactively when the answer is evaluated.
    pub score: Option<u8>,
    /// Model critique of this turn's answer.
    pub analysis: Option<String>,
    /// Model-generated plausible answer preview for this question.
    pub hypothetical_response: Option<String>,
    /// S3 keys of the archived answer media, when the client sent any.
    pub audio_key: Option<String>,
    pub video_key: Option<String>,
}

impl Turn {
    pub fn new(question: String, category: Category, hypothetical_response: Option<String>) -> Self {
        Self {
            question,
            category,
            answer: None,
            facial_analysis: None,
            score: None,
            analysis: None,
            hypothetical_response,
            audio_key: None,
            video_key: None,
        }
    }

    pub fn is_answered(&self) -> bool {
        self.answer.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    InProgress,
    Completed,
}

/// An interview session document. Persisted and loaded as a whole; the
/// state machine in `session.rs` owns every mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterviewSession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub context: InterviewContext,
    pub turns: Vec<Turn>,
    /// 0-100, recomputed by the model after each answered turn.
    pub overall_score: u8,
    /// Questions asked per category; caps repeats at the prompt level.
    pub category_counts: BTreeMap<Category, u8>,
    /// Latest running summary from the model, HTML.
    pub summary: Option<String>,
    pub weaknesses: Option<String>,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The validated, coerced form of the model's per-turn JSON reply. All wire
/// values arrive string-encoded; the response extractor produces this.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelTurnResult {
    pub ai_summary: String,
    pub current_analysis: String,
    pub generated_question: String,
    pub question_category: Category,
    pub hypothetical_response: String,
    /// 0-10 score for the just-answered turn.
    pub score: u8,
    /// 0-100 running score for the session.
    pub overall_score: u8,
    pub weaknesses: String,
    pub completed: bool,
}

/// Outcome of folding one validated model reply into a session. `question`
/// and `category` are absent on the terminal turn.
#[derive(Debug, Clone)]
pub struct AppliedTurn {
    pub question: Option<String>,
    pub category: Option<Category>,
    pub score: u8,
    pub overall_score: u8,
    pub ai_summary: String,
    pub current_analysis: String,
    pub completed: bool,
    /// True when the local hard cap terminated the session despite the model
    /// asking to continue.
    pub forced_completion: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_ids_cover_1_through_9() {
        let ids: Vec<u8> = Category::ALL.iter().map(|c| c.id()).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6, 7, 8, 9]);
    }

    #[test]
    fn test_category_from_id_roundtrip() {
        for category in Category::ALL {
            assert_eq!(Category::from_id(category.id()), Some(category));
        }
        assert_eq!(Category::from_id(0), None);
        assert_eq!(Category::from_id(10), None);
    }

    #[test]
    fn test_context_serializes_with_mode_tag() {
        let context = InterviewContext::Job(JobContext {
            role: "Backend Engineer".to_string(),
            company: "Initech".to_string(),
            industry: "fintech".to_string(),
            experience: "4 years".to_string(),
        });
        let json = serde_json::to_value(&context).unwrap();
        assert_eq!(json["mode"], "job");
        assert_eq!(json["role"], "Backend Engineer");

        let recovered: InterviewContext = serde_json::from_value(json).unwrap();
        assert_eq!(recovered.mode(), "job");
    }

    #[test]
    fn test_mock_context_deserializes_from_flat_object() {
        let json = serde_json::json!({
            "mode": "mock",
            "position": "Data Analyst",
            "company_type": "startup",
            "focus": "SQL and statistics",
            "intensity": "relaxed",
            "experience": "junior",
            "feedback_style": "encouraging"
        });
        let context: InterviewContext = serde_json::from_value(json).unwrap();
        assert_eq!(context.mode(), "mock");
    }

    #[test]
    fn test_new_turn_is_unanswered() {
        let turn = Turn::new(
            "Tell me about yourself".to_string(),
            Category::GeneralPersonal,
            None,
        );
        assert!(!turn.is_answered());
        assert!(turn.score.is_none());
    }

    #[test]
    fn test_category_counts_serialize_as_string_keys() {
        let mut counts = BTreeMap::new();
        counts.insert(Category::Technical, 2u8);
        let json = serde_json::to_value(&counts).unwrap();
        assert_eq!(json["technical"], 2);
    }
}
