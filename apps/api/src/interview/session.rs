//! Interview Session State Machine.
//!
//! `in_progress → completed`, never back. All mutation goes through the
//! methods here; the engine works on an owned copy and persists only after a
//! successful fold, so a failed turn leaves the stored session untouched.

use std::collections::BTreeMap;

use chrono::Utc;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::interview::models::{
    AppliedTurn, Category, FacialAnalysis, InterviewContext, InterviewSession, ModelTurnResult,
    SessionStatus, Turn,
};

/// Absolute maximum number of turns, enforced locally. The prompt asks the
/// model to finish within `QUESTION_BUDGET`; a model that never sets
/// `completed` is cut off here.
pub const HARD_TURN_CAP: usize = 15;

/// Question budget communicated to the model.
pub const QUESTION_BUDGET: &str = "9 to 12";

/// At most this many questions per category before the prompt excludes it.
pub const CATEGORY_REPEAT_CAP: u8 = 3;

#[derive(Debug, Error)]
pub enum SessionStateError {
    #[error("session is already completed")]
    Completed,

    #[error("no unanswered turn to attach the answer to")]
    NoOpenTurn,
}

impl InterviewSession {
    pub fn new(user_id: Uuid, context: InterviewContext) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            context,
            turns: Vec::new(),
            overall_score: 0,
            category_counts: BTreeMap::new(),
            summary: None,
            weaknesses: None,
            status: SessionStatus::InProgress,
            created_at: now,
            updated_at: now,
        }
    }

    /// The most recent turn, if it has not been answered yet.
    pub fn open_turn(&self) -> Option<&Turn> {
        self.turns.last().filter(|t| !t.is_answered())
    }

    /// Categories at the repeat cap; the prompt tells the model to avoid them.
    pub fn exhausted_categories(&self) -> Vec<Category> {
        self.category_counts
            .iter()
            .filter(|(_, &count)| count >= CATEGORY_REPEAT_CAP)
            .map(|(&category, _)| category)
            .collect()
    }

    pub fn remaining_turns(&self) -> usize {
        HARD_TURN_CAP.saturating_sub(self.turns.len())
    }

    /// Attaches the candidate's answer to the open turn. The session is left
    /// untouched on error.
    pub fn record_answer(
        &mut self,
        answer: String,
        facial_analysis: Option<FacialAnalysis>,
        audio_key: Option<String>,
        video_key: Option<String>,
    ) -> Result<(), SessionStateError> {
        if self.status == SessionStatus::Completed {
            return Err(SessionStateError::Completed);
        }
        let turn = self
            .turns
            .last_mut()
            .filter(|t| !t.is_answered())
            .ok_or(SessionStateError::NoOpenTurn)?;

        turn.answer = Some(answer);
        turn.facial_analysis = facial_analysis;
        turn.audio_key = audio_key;
        turn.video_key = video_key;
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Folds one validated model reply into the session: scores the
    /// just-answered turn, updates the running score and summary, then either
    /// appends the next question or completes the session. The hard cap
    /// completes the session locally even when the model asks to continue.
    pub fn apply_turn_result(&mut self, result: ModelTurnResult) -> AppliedTurn {
        if let Some(last) = self.turns.last_mut() {
            if last.is_answered() && last.score.is_none() {
                last.score = Some(result.score);
                last.analysis = Some(result.current_analysis.clone());
            }
        }

        self.overall_score = result.overall_score;
        self.summary = Some(result.ai_summary.clone());
        self.weaknesses = Some(result.weaknesses.clone());
        self.updated_at = Utc::now();

        let at_cap = self.turns.len() >= HARD_TURN_CAP;
        let forced_completion = at_cap && !result.completed;

        if result.completed || at_cap {
            if forced_completion {
                warn!(
                    session_id = %self.id,
                    turns = self.turns.len(),
                    "model did not complete within the hard cap; terminating locally"
                );
            }
            self.status = SessionStatus::Completed;
            return AppliedTurn {
                question: None,
                category: None,
                score: result.score,
                overall_score: result.overall_score,
                ai_summary: result.ai_summary,
                current_analysis: result.current_analysis,
                completed: true,
                forced_completion,
            };
        }

        let category = result.question_category;
        let count = self.category_counts.entry(category).or_insert(0);
        *count += 1;
        if *count > CATEGORY_REPEAT_CAP {
            warn!(
                session_id = %self.id,
                category = category.label(),
                count = *count,
                "model exceeded the per-category repeat cap"
            );
        }

        self.turns.push(Turn::new(
            result.generated_question.clone(),
            category,
            Some(result.hypothetical_response),
        ));

        AppliedTurn {
            question: Some(result.generated_question),
            category: Some(category),
            score: result.score,
            overall_score: result.overall_score,
            ai_summary: result.ai_summary,
            current_analysis: result.current_analysis,
            completed: false,
            forced_completion: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    use crate::interview::models::JobContext;

    fn job_session() -> InterviewSession {
        InterviewSession::new(
            Uuid::new_v4(),
            InterviewContext::Job(JobContext {
                role: "Backend Engineer".to_string(),
                company: "Initech".to_string(),
                industry: "fintech".to_string(),
                experience: "4 years".to_string(),
            }),
        )
    }

    fn turn_result(category: Category, completed: bool, overall: u8) -> ModelTurnResult {
        ModelTurnResult {
            ai_summary: "<p>summary</p>".to_string(),
            current_analysis: "analysis".to_string(),
            generated_question: "Next question?".to_string(),
            question_category: category,
            hypothetical_response: "A plausible answer.".to_string(),
            score: 7,
            overall_score: overall,
            weaknesses: "pacing".to_string(),
            completed,
        }
    }

    /// Drives one full answered turn through the session.
    fn answer_and_fold(session: &mut InterviewSession, result: ModelTurnResult) -> AppliedTurn {
        session
            .record_answer("my answer".to_string(), None, None, None)
            .unwrap();
        session.apply_turn_result(result)
    }

    #[test]
    fn test_first_fold_creates_single_unanswered_turn() {
        // Scenario A: zero turns, model returns the opening question.
        let mut session = job_session();
        let applied = session.apply_turn_result(turn_result(Category::GeneralPersonal, false, 0));

        assert_eq!(session.turns.len(), 1);
        assert_eq!(session.status, SessionStatus::InProgress);
        assert_eq!(applied.question.as_deref(), Some("Next question?"));
        assert_eq!(applied.category, Some(Category::GeneralPersonal));
        assert!(session.open_turn().is_some());
        assert_eq!(session.category_counts[&Category::GeneralPersonal], 1);
    }

    #[test]
    fn test_completion_on_first_fold_is_terminal_with_no_question() {
        let mut session = job_session();
        let applied = session.apply_turn_result(turn_result(Category::GeneralPersonal, true, 0));

        assert_eq!(session.status, SessionStatus::Completed);
        assert!(session.turns.is_empty());
        assert!(applied.question.is_none());
        assert!(applied.completed);
        assert!(!applied.forced_completion);
    }

    #[test]
    fn test_completion_fold_scores_final_turn_and_appends_nothing() {
        // Scenario B: several answered turns, then the model completes.
        let mut session = job_session();
        session.apply_turn_result(turn_result(Category::GeneralPersonal, false, 0));
        for _ in 0..7 {
            answer_and_fold(&mut session, turn_result(Category::Technical, false, 55));
        }
        assert_eq!(session.turns.len(), 8);

        let applied = answer_and_fold(&mut session, turn_result(Category::Behavioral, true, 81));

        assert_eq!(session.status, SessionStatus::Completed);
        assert_eq!(session.turns.len(), 8, "no ninth question stored");
        assert_eq!(session.overall_score, 81);
        assert_eq!(session.turns.last().unwrap().score, Some(7));
        assert!(applied.completed);
        assert!(applied.question.is_none());
    }

    #[test]
    fn test_fold_scores_previous_turn_and_updates_summary() {
        let mut session = job_session();
        session.apply_turn_result(turn_result(Category::GeneralPersonal, false, 0));
        answer_and_fold(&mut session, turn_result(Category::Technical, false, 62));

        let first = &session.turns[0];
        assert_eq!(first.score, Some(7));
        assert_eq!(first.analysis.as_deref(), Some("analysis"));
        assert_eq!(session.overall_score, 62);
        assert_eq!(session.summary.as_deref(), Some("<p>summary</p>"));
        assert_eq!(session.weaknesses.as_deref(), Some("pacing"));
        assert_eq!(
            session.turns[1].hypothetical_response.as_deref(),
            Some("A plausible answer.")
        );
    }

    #[test]
    fn test_hard_cap_forces_completion_when_model_never_stops() {
        let mut session = job_session();
        session.apply_turn_result(turn_result(Category::GeneralPersonal, false, 0));

        // The model never sets completed. The cap must cut it off.
        let mut last = None;
        for _ in 0..HARD_TURN_CAP + 3 {
            if session.status == SessionStatus::Completed {
                break;
            }
            last = Some(answer_and_fold(
                &mut session,
                turn_result(Category::Technical, false, 50),
            ));
        }

        assert_eq!(session.status, SessionStatus::Completed);
        assert!(session.turns.len() <= HARD_TURN_CAP);
        let last = last.unwrap();
        assert!(last.completed);
        assert!(last.forced_completion);
    }

    #[test]
    fn test_record_answer_after_completion_fails() {
        let mut session = job_session();
        session.apply_turn_result(turn_result(Category::GeneralPersonal, true, 0));
        assert_matches!(
            session.record_answer("late".to_string(), None, None, None),
            Err(SessionStateError::Completed)
        );
    }

    #[test]
    fn test_record_answer_twice_without_fold_fails() {
        let mut session = job_session();
        session.apply_turn_result(turn_result(Category::GeneralPersonal, false, 0));
        session
            .record_answer("first".to_string(), None, None, None)
            .unwrap();
        assert_matches!(
            session.record_answer("second".to_string(), None, None, None),
            Err(SessionStateError::NoOpenTurn)
        );
    }

    #[test]
    fn test_exhausted_categories_after_repeat_cap() {
        let mut session = job_session();
        session.apply_turn_result(turn_result(Category::Technical, false, 0));
        for _ in 0..2 {
            answer_and_fold(&mut session, turn_result(Category::Technical, false, 50));
        }
        assert_eq!(session.exhausted_categories(), vec![Category::Technical]);
        assert!(session
            .exhausted_categories()
            .iter()
            .all(|c| session.category_counts[c] >= CATEGORY_REPEAT_CAP));
    }

    #[test]
    fn test_category_counts_match_turn_history() {
        let mut session = job_session();
        session.apply_turn_result(turn_result(Category::GeneralPersonal, false, 0));
        answer_and_fold(&mut session, turn_result(Category::Technical, false, 40));
        answer_and_fold(&mut session, turn_result(Category::Technical, false, 45));

        for category in Category::ALL {
            let derived = session
                .turns
                .iter()
                .filter(|t| t.category == category)
                .count() as u8;
            let stored = session.category_counts.get(&category).copied().unwrap_or(0);
            assert_eq!(stored, derived, "count drift for {category:?}");
        }
    }
}
