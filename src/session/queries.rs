//! Typed SQL access for sessions and interactions
//!
//! Every query borrows a connection (usually an open transaction), so a
//! sequence of calls shares one unit of work.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::session::{to_db_timestamp, Interaction, Session};

const SESSION_COLUMNS: &str = "s.id, s.title, s.created_at, s.updated_at, s.is_active,
    (SELECT COUNT(*) FROM session_interactions i WHERE i.session_id = s.id)";

/// Queries against `interview_sessions` and `session_interactions`
pub struct SessionQueries<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SessionQueries<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Insert a session and return its id
    pub fn insert_session(&self, title: &str, is_active: bool, now: &DateTime<Utc>) -> rusqlite::Result<i64> {
        let now = to_db_timestamp(now);
        self.conn.execute(
            "INSERT INTO interview_sessions (title, created_at, updated_at, is_active)
             VALUES (?1, ?2, ?2, ?3)",
            params![title, now, is_active],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn get_session(&self, id: i64) -> rusqlite::Result<Option<Session>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM interview_sessions s WHERE s.id = ?1", SESSION_COLUMNS),
                [id],
                Session::from_row,
            )
            .optional()
    }

    /// All sessions, most recently updated first
    pub fn list_sessions(&self) -> rusqlite::Result<Vec<Session>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM interview_sessions s ORDER BY s.updated_at DESC, s.id DESC",
            SESSION_COLUMNS
        ))?;
        let rows = stmt.query_map([], Session::from_row)?;
        rows.collect()
    }

    /// Set the active flag without touching `updated_at`. Returns affected rows.
    pub fn set_active(&self, id: i64, is_active: bool) -> rusqlite::Result<usize> {
        self.conn.execute(
            "UPDATE interview_sessions SET is_active = ?1 WHERE id = ?2",
            params![is_active, id],
        )
    }

    /// Mark a session active and refresh `updated_at`. Returns affected rows.
    pub fn activate(&self, id: i64, now: &DateTime<Utc>) -> rusqlite::Result<usize> {
        self.conn.execute(
            "UPDATE interview_sessions SET is_active = 1, updated_at = ?1 WHERE id = ?2",
            params![to_db_timestamp(now), id],
        )
    }

    pub fn touch(&self, id: i64, now: &DateTime<Utc>) -> rusqlite::Result<usize> {
        self.conn.execute(
            "UPDATE interview_sessions SET updated_at = ?1 WHERE id = ?2",
            params![to_db_timestamp(now), id],
        )
    }

    pub fn rename(&self, id: i64, title: &str, now: &DateTime<Utc>) -> rusqlite::Result<usize> {
        self.conn.execute(
            "UPDATE interview_sessions SET title = ?1, updated_at = ?2 WHERE id = ?3",
            params![title, to_db_timestamp(now), id],
        )
    }

    /// Delete a session; its interactions go with it through the foreign key cascade.
    pub fn delete_session(&self, id: i64) -> rusqlite::Result<usize> {
        self.conn.execute("DELETE FROM interview_sessions WHERE id = ?1", [id])
    }

    pub fn count_interactions(&self, session_id: i64) -> rusqlite::Result<u32> {
        self.conn.query_row(
            "SELECT COUNT(*) FROM session_interactions WHERE session_id = ?1",
            [session_id],
            |row| row.get(0),
        )
    }

    pub fn insert_interaction(
        &self,
        session_id: i64,
        question: &str,
        answer: &str,
        interaction_order: u32,
        now: &DateTime<Utc>,
    ) -> rusqlite::Result<i64> {
        self.conn.execute(
            "INSERT INTO session_interactions
                (session_id, question, answer, created_at, interaction_order)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![session_id, question, answer, to_db_timestamp(now), interaction_order],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Interactions of a session in ascending order
    pub fn list_interactions(&self, session_id: i64) -> rusqlite::Result<Vec<Interaction>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, session_id, question, answer, created_at, interaction_order
             FROM session_interactions
             WHERE session_id = ?1
             ORDER BY interaction_order ASC",
        )?;
        let rows = stmt.query_map([session_id], Interaction::from_row)?;
        rows.collect()
    }
}
