//! Review history queries

use rusqlite::{params, Connection, Result};

use super::cards::{parse_state, parse_timestamp};
use crate::domain::{CardId, Rating, ReviewLog};

pub fn insert_review_log(conn: &Connection, user_id: &str, log: &ReviewLog) -> Result<i64> {
    conn.execute(
        r#"
    INSERT INTO review_logs (card_id, user_id, rating, reviewed_at, state_before, state_after,
                             elapsed_days, scheduled_days)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
    "#,
        params![
            log.card_id,
            user_id,
            log.rating.value(),
            log.reviewed_at.to_rfc3339(),
            log.state_before.as_str(),
            log.state_after.as_str(),
            log.elapsed_days,
            log.scheduled_days,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_review_logs(conn: &Connection, user_id: &str, card_id: CardId) -> Result<Vec<ReviewLog>> {
    let mut stmt = conn.prepare(
        r#"
    SELECT id, card_id, rating, reviewed_at, state_before, state_after, elapsed_days, scheduled_days
    FROM review_logs
    WHERE user_id = ?1 AND card_id = ?2
    ORDER BY id ASC
    "#,
    )?;

    let logs = stmt
        .query_map(params![user_id, card_id], row_to_review_log)?
        .collect::<Result<Vec<_>>>()?;
    Ok(logs)
}

pub fn delete_review_logs(conn: &Connection, user_id: &str, card_id: CardId) -> Result<usize> {
    conn.execute(
        "DELETE FROM review_logs WHERE user_id = ?1 AND card_id = ?2",
        params![user_id, card_id],
    )
}

fn row_to_review_log(row: &rusqlite::Row) -> Result<ReviewLog> {
    let rating_value: i64 = row.get(2)?;
    let reviewed_at_str: String = row.get(3)?;
    let before_str: String = row.get(4)?;
    let after_str: String = row.get(5)?;

    let rating = Rating::from_value(rating_value).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Integer,
            format!("rating {} out of range", rating_value).into(),
        )
    })?;

    Ok(ReviewLog {
        id: row.get(0)?,
        card_id: row.get(1)?,
        rating,
        reviewed_at: parse_timestamp(3, &reviewed_at_str)?,
        state_before: parse_state(4, &before_str)?,
        state_after: parse_state(5, &after_str)?,
        elapsed_days: row.get(6)?,
        scheduled_days: row.get(7)?,
    })
}
