//! SQLite-backed card store.

use std::path::Path;

use super::CardStore;
use crate::db::{self, try_lock, DbPool};
use crate::domain::{Card, CardId, ReviewLog};
use crate::error::StoreResult;

/// Card store over a single shared SQLite connection.
///
/// The connection mutex serializes every call, and multi-statement writes
/// run inside a transaction.
#[derive(Clone)]
pub struct SqliteCardStore {
  pool: DbPool,
}

impl SqliteCardStore {
  pub fn new(pool: DbPool) -> Self {
    Self { pool }
  }

  /// Open (or create) the database at `path` and apply migrations.
  pub fn open(path: &Path) -> StoreResult<Self> {
    Ok(Self::new(db::init_db(path)?))
  }

  pub fn in_memory() -> StoreResult<Self> {
    Ok(Self::new(db::init_memory_db()?))
  }
}

impl CardStore for SqliteCardStore {
  fn has_user(&self, user_id: &str) -> StoreResult<bool> {
    let conn = try_lock(&self.pool)?;
    Ok(db::user_exists(&conn, user_id)?)
  }

  fn get_card(&self, user_id: &str, card_id: CardId) -> StoreResult<Option<Card>> {
    let conn = try_lock(&self.pool)?;
    Ok(db::get_card(&conn, user_id, card_id)?)
  }

  fn list_cards(&self, user_id: &str) -> StoreResult<Vec<Card>> {
    let conn = try_lock(&self.pool)?;
    Ok(db::get_user_cards(&conn, user_id)?)
  }

  fn insert_card(&self, user_id: &str, mut card: Card) -> StoreResult<Card> {
    let mut conn = try_lock(&self.pool)?;
    let tx = conn.transaction()?;
    db::ensure_user(&tx, user_id, card.created)?;
    card.id = db::insert_card(&tx, user_id, &card)?;
    tx.commit()?;
    Ok(card)
  }

  fn record_answer(
    &self,
    user_id: &str,
    card: &Card,
    log: &ReviewLog,
  ) -> StoreResult<Option<ReviewLog>> {
    let mut conn = try_lock(&self.pool)?;
    let tx = conn.transaction()?;
    if db::update_card_schedule(&tx, user_id, card)? == 0 {
      return Ok(None);
    }
    let id = db::insert_review_log(&tx, user_id, log)?;
    tx.commit()?;
    Ok(Some(ReviewLog { id, ..log.clone() }))
  }

  fn delete_card(&self, user_id: &str, card_id: CardId) -> StoreResult<bool> {
    let mut conn = try_lock(&self.pool)?;
    let tx = conn.transaction()?;
    let existed = db::delete_card(&tx, user_id, card_id)?;
    if existed {
      db::delete_review_logs(&tx, user_id, card_id)?;
    }
    tx.commit()?;
    Ok(existed)
  }

  fn review_history(&self, user_id: &str, card_id: CardId) -> StoreResult<Vec<ReviewLog>> {
    let conn = try_lock(&self.pool)?;
    Ok(db::get_review_logs(&conn, user_id, card_id)?)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::{CardState, Rating};
  use crate::srs::transition;
  use crate::testing::{t0, TestEnv};
  use chrono::Duration;

  fn card(word: &str) -> Card {
    Card::new(word.to_string(), "x".to_string(), None, t0())
  }

  #[test]
  fn test_insert_registers_user() {
    let store = SqliteCardStore::in_memory().unwrap();
    assert!(!store.has_user("alice").unwrap());
    let stored = store.insert_card("alice", card("uno")).unwrap();
    assert_ne!(stored.id, 0);
    assert!(store.has_user("alice").unwrap());
    assert_eq!(store.list_cards("alice").unwrap(), vec![stored]);
  }

  #[test]
  fn test_record_answer_commits_card_and_log_together() {
    let store = SqliteCardStore::in_memory().unwrap();
    let stored = store.insert_card("alice", card("uno")).unwrap();
    let answered = transition(&stored, Rating::Good, t0());
    let log = ReviewLog::from_transition(&stored, &answered, Rating::Good, t0());

    let saved = store.record_answer("alice", &answered, &log).unwrap().unwrap();
    assert_ne!(saved.id, 0);
    assert_eq!(store.get_card("alice", stored.id).unwrap().unwrap(), answered);
    assert_eq!(store.review_history("alice", stored.id).unwrap(), vec![saved]);
  }

  #[test]
  fn test_record_answer_missing_card_rolls_back() {
    let store = SqliteCardStore::in_memory().unwrap();
    store.insert_card("alice", card("uno")).unwrap();
    let mut ghost = card("nada");
    ghost.id = 404;
    let log = ReviewLog::from_transition(&ghost, &ghost, Rating::Again, t0());

    assert!(store.record_answer("alice", &ghost, &log).unwrap().is_none());
    assert!(store.review_history("alice", 404).unwrap().is_empty());
  }

  #[test]
  fn test_delete_removes_history() {
    let store = SqliteCardStore::in_memory().unwrap();
    let stored = store.insert_card("alice", card("uno")).unwrap();
    let answered = transition(&stored, Rating::Again, t0());
    let log = ReviewLog::from_transition(&stored, &answered, Rating::Again, t0());
    store.record_answer("alice", &answered, &log).unwrap();

    assert!(store.delete_card("alice", stored.id).unwrap());
    assert!(!store.delete_card("alice", stored.id).unwrap());
    assert!(store.review_history("alice", stored.id).unwrap().is_empty());
    assert!(store.has_user("alice").unwrap());
  }

  #[test]
  fn test_cards_survive_reopen() {
    let env = TestEnv::new().unwrap();
    let path = env.db_path();
    let id = {
      let store = SqliteCardStore::open(&path).unwrap();
      let stored = store.insert_card("alice", card("uno")).unwrap();
      let mut answered = transition(&stored, Rating::Good, t0());
      answered.due = t0() + Duration::days(1);
      let log = ReviewLog::from_transition(&stored, &answered, Rating::Good, t0());
      store.record_answer("alice", &answered, &log).unwrap();
      stored.id
    };

    let reopened = SqliteCardStore::open(&path).unwrap();
    let card = reopened.get_card("alice", id).unwrap().unwrap();
    assert_eq!(card.state, CardState::Review);
    assert_eq!(card.due, t0() + Duration::days(1));
  }
}
