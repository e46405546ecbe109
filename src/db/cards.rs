//! Card CRUD queries, always scoped to one user

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Result};

use crate::domain::{Card, CardId, CardState};

/// Register a user if this is the first time we see them
pub fn ensure_user(conn: &Connection, user_id: &str, now: DateTime<Utc>) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO users (user_id, created_at) VALUES (?1, ?2)",
        params![user_id, now.to_rfc3339()],
    )?;
    Ok(())
}

pub fn user_exists(conn: &Connection, user_id: &str) -> Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE user_id = ?1)",
        params![user_id],
        |row| row.get(0),
    )
}

pub fn insert_card(conn: &Connection, user_id: &str, card: &Card) -> Result<CardId> {
    conn.execute(
        r#"
    INSERT INTO cards (user_id, word, translation, context, state, due, stability, difficulty,
                       elapsed_days, scheduled_days, reps, lapses, created, last_reviewed)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
    "#,
        params![
            user_id,
            card.word,
            card.translation,
            card.context,
            card.state.as_str(),
            card.due.to_rfc3339(),
            card.stability,
            card.difficulty,
            card.elapsed_days,
            card.scheduled_days,
            card.reps,
            card.lapses,
            card.created.to_rfc3339(),
            card.last_reviewed.map(|t| t.to_rfc3339()),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_card(conn: &Connection, user_id: &str, id: CardId) -> Result<Option<Card>> {
    let mut stmt = conn.prepare(
        r#"
    SELECT id, word, translation, context, state, due, stability, difficulty,
           elapsed_days, scheduled_days, reps, lapses, created, last_reviewed
    FROM cards WHERE user_id = ?1 AND id = ?2
    "#,
    )?;

    let mut rows = stmt.query(params![user_id, id])?;
    if let Some(row) = rows.next()? {
        Ok(Some(row_to_card(row)?))
    } else {
        Ok(None)
    }
}

pub fn get_user_cards(conn: &Connection, user_id: &str) -> Result<Vec<Card>> {
    let mut stmt = conn.prepare(
        r#"
    SELECT id, word, translation, context, state, due, stability, difficulty,
           elapsed_days, scheduled_days, reps, lapses, created, last_reviewed
    FROM cards WHERE user_id = ?1
    ORDER BY id ASC
    "#,
    )?;

    let cards = stmt
        .query_map(params![user_id], row_to_card)?
        .collect::<Result<Vec<_>>>()?;
    Ok(cards)
}

/// Write back the scheduling fields. Returns the number of rows touched.
pub fn update_card_schedule(conn: &Connection, user_id: &str, card: &Card) -> Result<usize> {
    conn.execute(
        r#"
    UPDATE cards
    SET state = ?1, due = ?2, stability = ?3, difficulty = ?4, elapsed_days = ?5,
        scheduled_days = ?6, reps = ?7, lapses = ?8, last_reviewed = ?9
    WHERE user_id = ?10 AND id = ?11
    "#,
        params![
            card.state.as_str(),
            card.due.to_rfc3339(),
            card.stability,
            card.difficulty,
            card.elapsed_days,
            card.scheduled_days,
            card.reps,
            card.lapses,
            card.last_reviewed.map(|t| t.to_rfc3339()),
            user_id,
            card.id,
        ],
    )
}

pub fn delete_card(conn: &Connection, user_id: &str, id: CardId) -> Result<bool> {
    let deleted = conn.execute(
        "DELETE FROM cards WHERE user_id = ?1 AND id = ?2",
        params![user_id, id],
    )?;
    Ok(deleted > 0)
}

pub(crate) fn parse_timestamp(idx: usize, value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

pub(crate) fn parse_state(idx: usize, value: &str) -> Result<CardState> {
    CardState::from_str(value).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            format!("unknown card state '{}'", value).into(),
        )
    })
}

fn row_to_card(row: &rusqlite::Row) -> Result<Card> {
    let state_str: String = row.get(4)?;
    let due_str: String = row.get(5)?;
    let created_str: String = row.get(12)?;
    let last_reviewed_str: Option<String> = row.get(13)?;

    Ok(Card {
        id: row.get(0)?,
        word: row.get(1)?,
        translation: row.get(2)?,
        context: row.get(3)?,
        state: parse_state(4, &state_str)?,
        due: parse_timestamp(5, &due_str)?,
        stability: row.get(6)?,
        difficulty: row.get(7)?,
        elapsed_days: row.get(8)?,
        scheduled_days: row.get(9)?,
        reps: row.get(10)?,
        lapses: row.get(11)?,
        created: parse_timestamp(12, &created_str)?,
        last_reviewed: last_reviewed_str
            .map(|s| parse_timestamp(13, &s))
            .transpose()?,
    })
}
