//! Persisted session and interaction records

use chrono::{DateTime, Local, SecondsFormat, Utc};
use rusqlite::{types::Type, Row};
use serde::{Deserialize, Serialize};

/// A named container of question/answer interactions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: i64,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_active: bool,
    pub interaction_count: u32,
}

impl Session {
    /// Title used when a session is created without one
    pub fn default_title() -> String {
        format!("Session {}", Local::now().format("%Y-%m-%d %H:%M"))
    }

    pub(crate) fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            created_at: parse_timestamp(row, 2)?,
            updated_at: parse_timestamp(row, 3)?,
            is_active: row.get(4)?,
            interaction_count: row.get(5)?,
        })
    }
}

/// One recorded question/answer pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub id: i64,
    #[serde(skip)]
    pub session_id: i64,
    pub question: String,
    pub answer: String,
    pub created_at: DateTime<Utc>,
    pub interaction_order: u32,
}

impl Interaction {
    pub(crate) fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            session_id: row.get(1)?,
            question: row.get(2)?,
            answer: row.get(3)?,
            created_at: parse_timestamp(row, 4)?,
            interaction_order: row.get(5)?,
        })
    }
}

/// A session together with its interactions in display order
#[derive(Debug, Clone, Serialize)]
pub struct SessionDetail {
    pub session: Session,
    pub interactions: Vec<Interaction>,
}

/// Fixed-width text form so that column ordering matches time ordering.
pub(crate) fn to_db_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
