//! Session persistence. Sessions are document-shaped: the whole
//! `InterviewSession` is serialized into one JSONB column and read back in
//! one piece. A few columns are denormalized for the listing endpoint.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::interview::models::{InterviewSession, SessionStatus};

/// Lightweight per-user listing row.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SessionSummary {
    pub id: Uuid,
    pub user_id: Uuid,
    pub mode: String,
    pub status: String,
    pub overall_score: i16,
    pub turn_count: i16,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Storage seam for interview sessions. The engine depends on this trait so
/// its tests can run against an in-memory store.
///
/// Carried in `AppState` as `Arc<dyn SessionStore>`.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert(&self, session: &InterviewSession) -> Result<()>;
    async fn update(&self, session: &InterviewSession) -> Result<()>;
    async fn fetch(&self, id: Uuid) -> Result<Option<InterviewSession>>;
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<SessionSummary>>;
}

pub struct PgSessionStore {
    pool: PgPool,
}

impl PgSessionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn status_str(status: SessionStatus) -> &'static str {
    match status {
        SessionStatus::InProgress => "in_progress",
        SessionStatus::Completed => "completed",
    }
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn insert(&self, session: &InterviewSession) -> Result<()> {
        let doc = serde_json::to_value(session).context("failed to serialize session document")?;

        sqlx::query(
            r#"
            INSERT INTO interview_sessions
                (id, user_id, mode, status, overall_score, turn_count, doc, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(session.id)
        .bind(session.user_id)
        .bind(session.context.mode())
        .bind(status_str(session.status))
        .bind(session.overall_score as i16)
        .bind(session.turns.len() as i16)
        .bind(&doc)
        .bind(session.created_at)
        .bind(session.updated_at)
        .execute(&self.pool)
        .await
        .context("failed to insert session")?;

        Ok(())
    }

    async fn update(&self, session: &InterviewSession) -> Result<()> {
        let doc = serde_json::to_value(session).context("failed to serialize session document")?;

        sqlx::query(
            r#"
            UPDATE interview_sessions
            SET status = $2, overall_score = $3, turn_count = $4, doc = $5, updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(session.id)
        .bind(status_str(session.status))
        .bind(session.overall_score as i16)
        .bind(session.turns.len() as i16)
        .bind(&doc)
        .bind(session.updated_at)
        .execute(&self.pool)
        .await
        .context("failed to update session")?;

        Ok(())
    }

    async fn fetch(&self, id: Uuid) -> Result<Option<InterviewSession>> {
        let doc: Option<(serde_json::Value,)> =
            sqlx::query_as("SELECT doc FROM interview_sessions WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .context("failed to fetch session")?;

        doc.map(|(value,)| {
            serde_json::from_value(value).context("stored session document is undecodable")
        })
        .transpose()
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<SessionSummary>> {
        let rows = sqlx::query_as::<_, SessionSummary>(
            r#"
            SELECT id, user_id, mode, status, overall_score, turn_count, created_at, updated_at
            FROM interview_sessions
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("failed to list sessions")?;

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::interview::models::{InterviewContext, JobContext};

    #[test]
    fn test_session_document_round_trips_through_json() {
        let session = InterviewSession::new(
            Uuid::new_v4(),
            InterviewContext::Job(JobContext {
                role: "SRE".to_string(),
                company: "Initech".to_string(),
                industry: "fintech".to_string(),
                experience: "6 years".to_string(),
            }),
        );

        let doc = serde_json::to_value(&session).unwrap();
        let recovered: InterviewSession = serde_json::from_value(doc).unwrap();

        assert_eq!(recovered.id, session.id);
        assert_eq!(recovered.user_id, session.user_id);
        assert_eq!(recovered.status, session.status);
        assert_eq!(recovered.turns.len(), 0);
    }

    #[test]
    fn test_status_strings_match_wire_values() {
        assert_eq!(status_str(SessionStatus::InProgress), "in_progress");
        assert_eq!(status_str(SessionStatus::Completed), "completed");
    }
}
