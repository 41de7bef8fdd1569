//! Prompt Builder: deterministically renders an `InterviewSession` into the
//! prompt for the next model call.
//!
//! The prompt shape is fixed: optional data (answers, facial signals) renders
//! as an explicit "N/A" placeholder instead of being omitted, so the model
//! always sees the same structure. Category and budget rules ride along as
//! natural-language constraints; the state machine enforces the hard versions
//! server-side.

use crate::interview::models::{InterviewContext, InterviewSession, Turn};
use crate::interview::session::{CATEGORY_REPEAT_CAP, HARD_TURN_CAP, QUESTION_BUDGET};

/// The output contract embedded in every prompt. Matches the wire format the
/// response extractor expects: one ```json fence, all values strings.
const OUTPUT_CONTRACT: &str = r#"Respond with EXACTLY one fenced code block and nothing else. The fence must start with ```json and end with ```. Inside it, return a single JSON object with ALL of these fields, every value encoded as a string:

```json
{
  "aiSummary": "<p>Running HTML summary of the whole interview so far.</p>",
  "currentAnalysis": "Critique of the answer just given (or \"N/A\" for the opening question).",
  "generated_question": "The next question to ask the candidate.",
  "question_category": "2",
  "hypothetical_response": "A strong example answer to the NEXT question.",
  "score": "7",
  "overallScore": "62",
  "weaknesses": "The candidate's main weaknesses so far.",
  "completed": "false"
}
```

Rules for the fields:
- "score": integer 0-10 as a string, grading the answer just given. Use "0" for the opening question.
- "overallScore": integer 0-100 as a string, the running score for the whole interview. Use "0" for the opening question.
- "question_category": the category id "1" through "9" of the generated question.
- "completed": "true" only when the interview should end. When "true", still fill "score" and "overallScore" for the final answer; "generated_question" and "hypothetical_response" may be empty strings.
- No prose outside the JSON. No extra fields. Every value is a string."#;

/// Opening prompt: empty history, asks for the first question.
const START_PROMPT_TEMPLATE: &str = r#"You are conducting a live interview. Here is the engagement:

{context}

{categories}

{budget}

Keep your tone conversational and concise, and mirror the candidate's phrasing where natural.

This is the opening of the interview: there is no answer to evaluate yet. Generate the first question (category 1, general / personal background, is the usual opener), set "score" and "overallScore" to "0", and set "currentAnalysis" to "N/A".

{contract}"#;

/// Per-turn prompt: full history plus the newly submitted answer.
const TURN_PROMPT_TEMPLATE: &str = r#"You are conducting a live interview. Here is the engagement:

{context}

INTERVIEW SO FAR (chronological; the final turn holds the answer you must now evaluate):

{history}

Running overall score before this answer: {overall_score}/100.

{categories}

{budget}

Keep your tone conversational and concise, and mirror the candidate's phrasing where natural.

Evaluate the most recent answer (fill "score" and "currentAnalysis"), update "overallScore", "aiSummary" and "weaknesses" for the whole interview, and either generate the next question or end the interview with "completed": "true".

{contract}"#;

pub fn build_start_prompt(session: &InterviewSession) -> String {
    START_PROMPT_TEMPLATE
        .replace("{context}", &render_context(&session.context))
        .replace("{categories}", &render_categories(session))
        .replace("{budget}", &render_budget(session))
        .replace("{contract}", OUTPUT_CONTRACT)
}

pub fn build_turn_prompt(session: &InterviewSession) -> String {
    TURN_PROMPT_TEMPLATE
        .replace("{context}", &render_context(&session.context))
        .replace("{history}", &render_history(&session.turns))
        .replace("{overall_score}", &session.overall_score.to_string())
        .replace("{categories}", &render_categories(session))
        .replace("{budget}", &render_budget(session))
        .replace("{contract}", OUTPUT_CONTRACT)
}

fn render_context(context: &InterviewContext) -> String {
    match context {
        InterviewContext::Job(job) => format!(
            "Interview type: real job opening.\n\
             Role: {}\n\
             Company: {}\n\
             Industry: {}\n\
             Candidate experience: {}",
            job.role, job.company, job.industry, job.experience
        ),
        InterviewContext::Mock(mock) => format!(
            "Interview type: practice interview.\n\
             Position: {}\n\
             Company type: {}\n\
             Focus area: {}\n\
             Intensity: {}\n\
             Candidate experience: {}\n\
             Feedback style: {}",
            mock.position,
            mock.company_type,
            mock.focus,
            mock.intensity,
            mock.experience,
            mock.feedback_style
        ),
    }
}

/// Renders every turn with a fixed block shape. Missing answers and facial
/// data appear as explicit placeholders.
fn render_history(turns: &[Turn]) -> String {
    if turns.is_empty() {
        return "No questions asked yet.".to_string();
    }

    turns
        .iter()
        .enumerate()
        .map(|(i, turn)| {
            let answer = turn.answer.as_deref().unwrap_or("N/A (not answered yet)");
            let score = turn
                .score
                .map(|s| format!("{s}/10"))
                .unwrap_or_else(|| "N/A (not scored yet)".to_string());
            let facial = turn
                .facial_analysis
                .as_ref()
                .map(|f| {
                    let emotions = f
                        .emotions
                        .iter()
                        .map(|e| format!("{} ({:.2})", e.emotion, e.intensity))
                        .collect::<Vec<_>>()
                        .join(", ");
                    format!("{} | {}", emotions, f.expression_analysis)
                })
                .unwrap_or_else(|| "N/A (no facial data)".to_string());

            format!(
                "Turn {n} [category {cat}: {label}]\n\
                 Question: {question}\n\
                 Answer: {answer}\n\
                 Score: {score}\n\
                 Facial signals: {facial}",
                n = i + 1,
                cat = turn.category.id(),
                label = turn.category.label(),
                question = turn.question,
                answer = answer,
                score = score,
                facial = facial,
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn render_categories(session: &InterviewSession) -> String {
    let mut lines = vec![format!(
        "Question categories (never ask more than {CATEGORY_REPEAT_CAP} questions from one category; prefer unexplored categories):"
    )];
    for category in crate::interview::models::Category::ALL {
        let count = session
            .category_counts
            .get(&category)
            .copied()
            .unwrap_or(0);
        lines.push(format!(
            "  {}. {} (asked {} so far)",
            category.id(),
            category.label(),
            count
        ));
    }

    let exhausted = session.exhausted_categories();
    if exhausted.is_empty() {
        lines.push("Exhausted categories: none yet.".to_string());
    } else {
        lines.push(format!(
            "Exhausted categories, do NOT use them again: {}",
            exhausted
                .iter()
                .map(|c| c.id().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ));
    }
    lines.join("\n")
}

fn render_budget(session: &InterviewSession) -> String {
    let asked = session.turns.len();
    let remaining = session.remaining_turns();
    let mut text = format!(
        "Plan the interview around {QUESTION_BUDGET} questions in total; you have asked {asked}. \
         Hard limit: never more than {HARD_TURN_CAP} questions."
    );
    if remaining <= 1 {
        text.push_str(
            " You have reached the limit: do NOT generate another question, set \"completed\" to \"true\".",
        );
    } else if remaining <= 3 {
        text.push_str(&format!(
            " Only {remaining} more questions are possible; start wrapping up."
        ));
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    use crate::interview::models::{
        Category, EmotionReading, FacialAnalysis, InterviewContext, InterviewSession, JobContext,
        MockContext, ModelTurnResult,
    };

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

    fn turn_result(category: Category, completed: bool) -> ModelTurnResult {
        ModelTurnResult {
            ai_summary: "<p>summary</p>".to_string(),
            current_analysis: "analysis".to_string(),
            generated_question: "Why backend work?".to_string(),
            question_category: category,
            hypothetical_response: "Because...".to_string(),
            score: 6,
            overall_score: 50,
            weaknesses: "pacing".to_string(),
            completed,
        }
    }

    #[test]
    fn test_start_prompt_fills_every_placeholder() {
        let prompt = build_start_prompt(&job_session());
        for placeholder in ["{context}", "{categories}", "{budget}", "{contract}"] {
            assert!(!prompt.contains(placeholder), "unfilled {placeholder}");
        }
        assert!(prompt.contains("Backend Engineer"));
        assert!(prompt.contains("```json"));
        assert!(prompt.contains("No prose outside the JSON"));
    }

    #[test]
    fn test_turn_prompt_fills_every_placeholder() {
        let mut session = job_session();
        session.apply_turn_result(turn_result(Category::GeneralPersonal, false));
        session
            .record_answer("I like systems".to_string(), None, None, None)
            .unwrap();

        let prompt = build_turn_prompt(&session);
        for placeholder in [
            "{context}",
            "{history}",
            "{overall_score}",
            "{categories}",
            "{budget}",
            "{contract}",
        ] {
            assert!(!prompt.contains(placeholder), "unfilled {placeholder}");
        }
        assert!(prompt.contains("I like systems"));
    }

    #[test]
    fn test_history_renders_placeholders_for_missing_data() {
        let mut session = job_session();
        session.apply_turn_result(turn_result(Category::Technical, false));

        let history = render_history(&session.turns);
        assert!(history.contains("Answer: N/A (not answered yet)"));
        assert!(history.contains("Score: N/A (not scored yet)"));
        assert!(history.contains("Facial signals: N/A (no facial data)"));
    }

    #[test]
    fn test_history_renders_facial_summary_when_present() {
        let mut session = job_session();
        session.apply_turn_result(turn_result(Category::Technical, false));
        session
            .record_answer(
                "answer".to_string(),
                Some(FacialAnalysis {
                    emotions: vec![EmotionReading {
                        emotion: "calm".to_string(),
                        intensity: 0.8,
                    }],
                    expression_analysis: "steady eye contact".to_string(),
                }),
                None,
                None,
            )
            .unwrap();

        let history = render_history(&session.turns);
        assert!(history.contains("calm (0.80)"));
        assert!(history.contains("steady eye contact"));
    }

    #[test]
    fn test_categories_list_marks_exhausted() {
        let mut session = job_session();
        session.apply_turn_result(turn_result(Category::Technical, false));
        for _ in 0..2 {
            session
                .record_answer("a".to_string(), None, None, None)
                .unwrap();
            session.apply_turn_result(turn_result(Category::Technical, false));
        }

        let categories = render_categories(&session);
        assert!(categories.contains("do NOT use them again: 2"));
    }

    #[test]
    fn test_budget_demands_completion_at_hard_cap() {
        let mut session = job_session();
        session.apply_turn_result(turn_result(Category::GeneralPersonal, false));
        while session.turns.len() < crate::interview::session::HARD_TURN_CAP {
            session
                .record_answer("a".to_string(), None, None, None)
                .unwrap();
            session.apply_turn_result(turn_result(Category::Behavioral, false));
        }

        let budget = render_budget(&session);
        assert!(budget.contains("do NOT generate another question"));
    }

    #[test]
    fn test_mock_context_renders_feedback_style() {
        let session = InterviewSession::new(
            Uuid::new_v4(),
            InterviewContext::Mock(MockContext {
                position: "Data Analyst".to_string(),
                company_type: "startup".to_string(),
                focus: "SQL".to_string(),
                intensity: "relaxed".to_string(),
                experience: "junior".to_string(),
                feedback_style: "encouraging".to_string(),
            }),
        );
        let prompt = build_start_prompt(&session);
        assert!(prompt.contains("Feedback style: encouraging"));
        assert!(prompt.contains("practice interview"));
    }
}
