//! Session operations and the active-session rules

use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::llm::AnswerGenerator;

use super::{
    database::Database,
    errors::{ServiceError, ServiceResult},
    session::{Session, SessionDetail},
};

/// Per-client pointer to the session that new interactions are recorded into.
///
/// The service reads and updates it; the caller is responsible for carrying
/// it between requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActiveSession {
    session_id: Option<i64>,
}

impl ActiveSession {
    pub fn new(session_id: Option<i64>) -> Self {
        Self { session_id }
    }

    pub fn get(&self) -> Option<i64> {
        self.session_id
    }

    pub fn set(&mut self, session_id: i64) {
        self.session_id = Some(session_id);
    }

    pub fn clear(&mut self) {
        self.session_id = None;
    }
}

/// Result of submitting a question
#[derive(Debug, Clone)]
pub struct AnsweredQuestion {
    pub question: String,
    pub answer: String,
    pub session_id: Option<i64>,
}

/// Orchestrates answer generation and session persistence
#[derive(Clone)]
pub struct SessionService {
    db: Arc<Database>,
    generator: AnswerGenerator,
}

impl SessionService {
    pub fn new(db: Arc<Database>, generator: AnswerGenerator) -> Self {
        Self { db, generator }
    }

    /// Generate an answer and, if a session is active, record the pair in it.
    ///
    /// Failing to record is logged and otherwise ignored: the caller still
    /// receives the answer.
    pub async fn submit_question(&self, ctx: &ActiveSession, question: &str) -> ServiceResult<AnsweredQuestion> {
        let question = required_text(question, "Question cannot be empty")?;

        let answer = self.generator.generate_answer(question).await?;

        if let Some(session_id) = ctx.get() {
            if let Err(e) = self.record_interaction(session_id, question, &answer).await {
                warn!("Failed to save interaction to session {}: {}", session_id, e);
            }
        }

        Ok(AnsweredQuestion {
            question: question.to_string(),
            answer,
            session_id: ctx.get(),
        })
    }

    async fn record_interaction(&self, session_id: i64, question: &str, answer: &str) -> ServiceResult<()> {
        let now = Utc::now();
        self.db
            .unit_of_work(|q| -> ServiceResult<()> {
                match q.get_session(session_id)? {
                    Some(session) if session.is_active => {}
                    _ => {
                        debug!("Session {} is gone or inactive, interaction not recorded", session_id);
                        return Ok(());
                    }
                }

                let interaction_order = q.count_interactions(session_id)? + 1;
                q.insert_interaction(session_id, question, answer, interaction_order, &now)?;
                q.touch(session_id, &now)?;
                Ok(())
            })
            .await
    }

    /// All sessions, most recently updated first
    pub async fn list_sessions(&self) -> ServiceResult<Vec<Session>> {
        Ok(self.db.unit_of_work(|q| q.list_sessions()).await?)
    }

    /// Start a new active session, ending the one currently active.
    pub async fn create_session(&self, ctx: &mut ActiveSession, title: Option<&str>) -> ServiceResult<Session> {
        let title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .unwrap_or_else(Session::default_title);
        let previous = ctx.get();
        let now = Utc::now();

        let session = self
            .db
            .unit_of_work(|q| -> ServiceResult<Session> {
                if let Some(previous) = previous {
                    q.set_active(previous, false)?;
                }
                let id = q.insert_session(&title, true, &now)?;
                q.get_session(id)?.ok_or(ServiceError::NotFound(id))
            })
            .await?;

        ctx.set(session.id);
        info!("Created session {} ({})", session.id, session.title);
        Ok(session)
    }

    /// A session with its interactions in order
    pub async fn get_session_detail(&self, id: i64) -> ServiceResult<SessionDetail> {
        self.db
            .unit_of_work(|q| -> ServiceResult<SessionDetail> {
                let session = q.get_session(id)?.ok_or(ServiceError::NotFound(id))?;
                let interactions = q.list_interactions(id)?;
                Ok(SessionDetail { session, interactions })
            })
            .await
    }

    /// Make `id` the active session, ending the one currently active.
    pub async fn activate_session(&self, ctx: &mut ActiveSession, id: i64) -> ServiceResult<Session> {
        let previous = ctx.get();
        let now = Utc::now();

        let session = self
            .db
            .unit_of_work(|q| -> ServiceResult<Session> {
                if let Some(previous) = previous {
                    q.set_active(previous, false)?;
                }
                if q.activate(id, &now)? == 0 {
                    return Err(ServiceError::NotFound(id));
                }
                q.get_session(id)?.ok_or(ServiceError::NotFound(id))
            })
            .await?;

        ctx.set(id);
        info!("Activated session {}", id);
        Ok(session)
    }

    /// Delete a session and its interactions
    pub async fn delete_session(&self, ctx: &mut ActiveSession, id: i64) -> ServiceResult<()> {
        self.db
            .unit_of_work(|q| -> ServiceResult<()> {
                match q.delete_session(id)? {
                    0 => Err(ServiceError::NotFound(id)),
                    _ => Ok(()),
                }
            })
            .await?;

        if ctx.get() == Some(id) {
            ctx.clear();
        }
        info!("Deleted session {}", id);
        Ok(())
    }

    pub async fn rename_session(&self, id: i64, title: &str) -> ServiceResult<Session> {
        let title = required_text(title, "Title cannot be empty")?;
        let now = Utc::now();

        self.db
            .unit_of_work(|q| -> ServiceResult<Session> {
                if q.rename(id, title, &now)? == 0 {
                    return Err(ServiceError::NotFound(id));
                }
                q.get_session(id)?.ok_or(ServiceError::NotFound(id))
            })
            .await
    }

    /// The session the pointer refers to, if it still exists and is active.
    /// A stale pointer is cleared.
    pub async fn current_session(&self, ctx: &mut ActiveSession) -> ServiceResult<Option<Session>> {
        let Some(id) = ctx.get() else {
            return Ok(None);
        };

        let session = self.db.unit_of_work(|q| q.get_session(id)).await?;
        match session {
            Some(session) if session.is_active => Ok(Some(session)),
            _ => {
                debug!("Clearing stale active session pointer {}", id);
                ctx.clear();
                Ok(None)
            }
        }
    }

    /// Up to three follow-up questions on a topic; empty if the backend fails.
    pub async fn follow_up_questions(&self, topic: &str) -> ServiceResult<Vec<String>> {
        let topic = required_text(topic, "Topic cannot be empty")?;
        Ok(self.generator.generate_follow_up_questions(topic).await)
    }

    pub async fn improve_answer(&self, question: &str, answer: &str) -> ServiceResult<String> {
        let question = required_text(question, "Question cannot be empty")?;
        let answer = required_text(answer, "Answer cannot be empty")?;
        Ok(self.generator.improve_answer(question, answer).await?)
    }
}

fn required_text<'a>(text: &'a str, message: &str) -> ServiceResult<&'a str> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ServiceError::Validation(message.to_string()));
    }
    Ok(text)
}
