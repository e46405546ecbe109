//! Card operations for one user at a time.
//!
//! Writes to a user's collection are serialized through a per-user lock so
//! two answers to the same card can never read the same prior state.
//! Reads take a single store snapshot and do not wait on the lock.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::domain::{Card, CardId, Rating, ReviewLog};
use crate::error::{SrsError, SrsResult, StoreError};
use crate::srs::{self, CardStats};
use crate::store::CardStore;

#[derive(Default)]
struct UserLocks {
  locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl UserLocks {
  fn for_user(&self, user_id: &str) -> SrsResult<Arc<Mutex<()>>> {
    let mut locks = self.locks.lock().map_err(|_| StoreError::Lock)?;
    Ok(locks.entry(user_id.to_string()).or_default().clone())
  }

  /// Drop the user's entry once nobody but the map holds it.
  fn release(&self, user_id: &str, lock: Arc<Mutex<()>>) {
    if let Ok(mut locks) = self.locks.lock() {
      if Arc::strong_count(&lock) == 2 {
        locks.remove(user_id);
      }
    }
  }
}

/// The external entry points of the scheduler
pub struct ReviewService {
  store: Arc<dyn CardStore>,
  writers: UserLocks,
}

impl ReviewService {
  pub fn new(store: Arc<dyn CardStore>) -> Self {
    Self {
      store,
      writers: UserLocks::default(),
    }
  }

  /// Run `f` while holding the user's writer lock.
  fn with_writer<T>(&self, user_id: &str, f: impl FnOnce() -> SrsResult<T>) -> SrsResult<T> {
    let lock = self.writers.for_user(user_id)?;
    let result = match lock.lock() {
      Ok(_guard) => f(),
      Err(_) => Err(StoreError::Lock.into()),
    };
    self.writers.release(user_id, lock);
    result
  }

  pub fn create_card(
    &self,
    user_id: &str,
    word: &str,
    translation: &str,
    context: Option<&str>,
    now: DateTime<Utc>,
  ) -> SrsResult<Card> {
    let word = word.trim();
    let translation = translation.trim();
    if word.is_empty() {
      return Err(SrsError::InvalidCard("word"));
    }
    if translation.is_empty() {
      return Err(SrsError::InvalidCard("translation"));
    }
    let context = context.map(str::trim).filter(|c| !c.is_empty()).map(str::to_string);

    let card = Card::new(word.to_string(), translation.to_string(), context, now);
    let card = self.with_writer(user_id, || Ok(self.store.insert_card(user_id, card)?))?;
    tracing::info!("Created card {} for user '{}'", card.id, user_id);
    Ok(card)
  }

  pub fn get_due_cards(&self, user_id: &str, now: DateTime<Utc>) -> SrsResult<Vec<Card>> {
    let cards = self.store.list_cards(user_id)?;
    Ok(srs::due_cards(&cards, now))
  }

  pub fn get_stats(&self, user_id: &str, now: DateTime<Utc>) -> SrsResult<CardStats> {
    let cards = self.store.list_cards(user_id)?;
    Ok(srs::card_stats(&cards, now))
  }

  /// Earliest upcoming due time for a user with nothing due right now
  pub fn next_due(&self, user_id: &str, now: DateTime<Utc>) -> SrsResult<Option<DateTime<Utc>>> {
    let cards = self.store.list_cards(user_id)?;
    Ok(srs::next_due(&cards, now))
  }

  /// Statistics plus, when nothing is due, the next due time. Both come
  /// from the same snapshot.
  pub fn get_overview(
    &self,
    user_id: &str,
    now: DateTime<Utc>,
  ) -> SrsResult<(CardStats, Option<DateTime<Utc>>)> {
    let cards = self.store.list_cards(user_id)?;
    let stats = srs::card_stats(&cards, now);
    let next_due = if stats.due == 0 {
      srs::next_due(&cards, now)
    } else {
      None
    };
    Ok((stats, next_due))
  }

  /// Apply a raw 1-5 rating to a card and persist the result.
  pub fn answer_card(
    &self,
    user_id: &str,
    card_id: CardId,
    rating: i64,
    now: DateTime<Utc>,
  ) -> SrsResult<Card> {
    let rating = Rating::from_value(rating).ok_or(SrsError::InvalidRating(rating))?;

    self.with_writer(user_id, || {
      let card = self.lookup(user_id, card_id)?;
      let answered = srs::transition(&card, rating, now);
      let log = ReviewLog::from_transition(&card, &answered, rating, now);

      self
        .store
        .record_answer(user_id, &answered, &log)?
        .ok_or(SrsError::UnknownCard(card_id))?;

      tracing::debug!(
        "User '{}' rated card {} {:?}: {} -> {}, stability {:.2} -> {:.2}, due {}",
        user_id,
        card_id,
        rating,
        card.state.as_str(),
        answered.state.as_str(),
        card.stability,
        answered.stability,
        answered.due.to_rfc3339()
      );
      Ok(answered)
    })
  }

  pub fn delete_card(&self, user_id: &str, card_id: CardId) -> SrsResult<()> {
    self.with_writer(user_id, || {
      if !self.store.has_user(user_id)? {
        return Err(SrsError::UnknownUser(user_id.to_string()));
      }
      if !self.store.delete_card(user_id, card_id)? {
        return Err(SrsError::UnknownCard(card_id));
      }
      tracing::info!("Deleted card {} for user '{}'", card_id, user_id);
      Ok(())
    })
  }

  pub fn review_history(&self, user_id: &str, card_id: CardId) -> SrsResult<Vec<ReviewLog>> {
    self.lookup(user_id, card_id)?;
    Ok(self.store.review_history(user_id, card_id)?)
  }

  /// Fetch a card, telling an unknown user apart from an unknown card.
  fn lookup(&self, user_id: &str, card_id: CardId) -> SrsResult<Card> {
    if let Some(card) = self.store.get_card(user_id, card_id)? {
      return Ok(card);
    }
    if self.store.has_user(user_id)? {
      Err(SrsError::UnknownCard(card_id))
    } else {
      Err(SrsError::UnknownUser(user_id.to_string()))
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::CardState;
  use crate::store::{MemoryCardStore, SqliteCardStore};
  use crate::testing::t0;
  use chrono::Duration;

  fn service() -> ReviewService {
    ReviewService::new(Arc::new(MemoryCardStore::new()))
  }

  fn add(svc: &ReviewService, user: &str, word: &str) -> Card {
    svc.create_card(user, word, "translation", None, t0()).unwrap()
  }

  #[test]
  fn test_create_card_initial_state() {
    let svc = service();
    let card = svc
      .create_card("alice", "  el perro ", "dog", Some(" El perro ladra. "), t0())
      .unwrap();

    assert_ne!(card.id, 0);
    assert_eq!(card.word, "el perro");
    assert_eq!(card.context.as_deref(), Some("El perro ladra."));
    assert_eq!(card.state, CardState::Learning);
    assert_eq!(card.due, t0());
    assert_eq!(card.stability, 0.0);
    assert_eq!(card.difficulty, 0.0);
    assert_eq!(card.reps, 0);
    assert_eq!(card.lapses, 0);
  }

  #[test]
  fn test_create_card_rejects_blank_fields() {
    let svc = service();
    assert!(matches!(
      svc.create_card("alice", "  ", "dog", None, t0()),
      Err(SrsError::InvalidCard("word"))
    ));
    assert!(matches!(
      svc.create_card("alice", "perro", "", None, t0()),
      Err(SrsError::InvalidCard("translation"))
    ));
    assert!(svc.get_stats("alice", t0()).unwrap().total == 0);
  }

  #[test]
  fn test_blank_context_stored_as_none() {
    let svc = service();
    let card = svc.create_card("alice", "gato", "cat", Some("   "), t0()).unwrap();
    assert!(card.context.is_none());
  }

  #[test]
  fn test_unknown_user_reads_are_empty() {
    let svc = service();
    assert!(svc.get_due_cards("nobody", t0()).unwrap().is_empty());
    assert_eq!(svc.get_stats("nobody", t0()).unwrap(), CardStats::default());
    assert!(svc.next_due("nobody", t0()).unwrap().is_none());
  }

  #[test]
  fn test_unknown_user_writes_fail() {
    let svc = service();
    assert!(matches!(
      svc.answer_card("nobody", 1, 3, t0()),
      Err(SrsError::UnknownUser(_))
    ));
    assert!(matches!(svc.delete_card("nobody", 1), Err(SrsError::UnknownUser(_))));
    assert!(matches!(svc.review_history("nobody", 1), Err(SrsError::UnknownUser(_))));
  }

  #[test]
  fn test_unknown_card() {
    let svc = service();
    add(&svc, "alice", "uno");
    assert!(matches!(
      svc.answer_card("alice", 999, 3, t0()),
      Err(SrsError::UnknownCard(999))
    ));
    assert!(matches!(svc.delete_card("alice", 999), Err(SrsError::UnknownCard(999))));
  }

  #[test]
  fn test_other_users_card_is_unknown() {
    let svc = service();
    let card = add(&svc, "alice", "uno");
    add(&svc, "bob", "dos");
    assert!(matches!(
      svc.answer_card("bob", card.id, 3, t0()),
      Err(SrsError::UnknownCard(_))
    ));
  }

  #[test]
  fn test_invalid_rating_leaves_card_untouched() {
    let svc = service();
    let card = add(&svc, "alice", "uno");
    for bad in [0, 6, -1, 300] {
      assert!(matches!(
        svc.answer_card("alice", card.id, bad, t0()),
        Err(SrsError::InvalidRating(r)) if r == bad
      ));
    }
    let due = svc.get_due_cards("alice", t0()).unwrap();
    assert_eq!(due, vec![card.clone()]);
    assert!(svc.review_history("alice", card.id).unwrap().is_empty());
  }

  #[test]
  fn test_answer_persists_and_logs() {
    let svc = service();
    let card = add(&svc, "alice", "uno");

    let failed = svc.answer_card("alice", card.id, 1, t0()).unwrap();
    assert_eq!(failed.due, t0() + Duration::minutes(5));
    assert_eq!((failed.reps, failed.lapses), (1, 1));

    let promoted = svc.answer_card("alice", card.id, 3, t0()).unwrap();
    assert_eq!(promoted.state, CardState::Review);
    assert_eq!(promoted.stability, 1.5);
    assert_eq!(promoted.due, t0() + Duration::days(1));
    assert_eq!((promoted.reps, promoted.lapses), (2, 1));

    let history = svc.review_history("alice", card.id).unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].rating, Rating::Again);
    assert_eq!(history[1].state_before, CardState::Learning);
    assert_eq!(history[1].state_after, CardState::Review);
  }

  #[test]
  fn test_due_selection_and_stats_after_answers() {
    let svc = service();
    let a = add(&svc, "alice", "uno");
    let b = add(&svc, "alice", "dos");
    let c = add(&svc, "alice", "tres");
    svc.answer_card("alice", b.id, 3, t0()).unwrap();

    let due: Vec<CardId> = svc
      .get_due_cards("alice", t0())
      .unwrap()
      .iter()
      .map(|c| c.id)
      .collect();
    assert_eq!(due, vec![a.id, c.id]);

    let stats = svc.get_stats("alice", t0()).unwrap();
    assert_eq!(
      stats,
      CardStats {
        total: 3,
        due: 2,
        learning: 2,
        review: 1,
        relearning: 0,
      }
    );
    assert_eq!(svc.next_due("alice", t0()).unwrap(), Some(t0() + Duration::days(1)));
  }

  #[test]
  fn test_reads_are_repeatable() {
    let svc = service();
    add(&svc, "alice", "uno");
    add(&svc, "alice", "dos");
    assert_eq!(
      svc.get_due_cards("alice", t0()).unwrap(),
      svc.get_due_cards("alice", t0()).unwrap()
    );
    assert_eq!(svc.get_stats("alice", t0()).unwrap(), svc.get_stats("alice", t0()).unwrap());
  }

  #[test]
  fn test_delete_card() {
    let svc = service();
    let card = add(&svc, "alice", "uno");
    svc.delete_card("alice", card.id).unwrap();
    assert!(matches!(svc.delete_card("alice", card.id), Err(SrsError::UnknownCard(_))));
    assert_eq!(svc.get_stats("alice", t0()).unwrap().total, 0);
  }

  #[test]
  fn test_concurrent_answers_are_serialized() {
    let svc = Arc::new(service());
    let card_id = add(&svc, "alice", "uno").id;

    let handles: Vec<_> = (0..8)
      .map(|i| {
        let svc = svc.clone();
        std::thread::spawn(move || {
          let rating = if i % 2 == 0 { 1 } else { 4 };
          svc.answer_card("alice", card_id, rating, t0()).unwrap();
        })
      })
      .collect();
    for handle in handles {
      handle.join().unwrap();
    }

    let card = svc.get_due_cards("alice", t0() + Duration::days(1)).unwrap();
    let card = card.first().expect("card still present");
    assert_eq!(card.reps, 8);
    assert_eq!(card.lapses, 4);
    assert_eq!(svc.review_history("alice", card.id).unwrap().len(), 8);
  }

  #[test]
  fn test_writer_locks_are_released() {
    let svc = service();
    for i in 0..50 {
      let user = format!("ghost{}", i);
      assert!(svc.answer_card(&user, 1, 3, t0()).is_err());
      assert!(svc.delete_card(&user, 1).is_err());
    }
    let card = add(&svc, "alice", "uno");
    svc.answer_card("alice", card.id, 3, t0()).unwrap();
    assert!(svc.writers.locks.lock().unwrap().is_empty());
  }

  #[test]
  fn test_overview_reports_next_due_only_when_idle() {
    let svc = service();
    let card = add(&svc, "alice", "uno");
    let (stats, next_due) = svc.get_overview("alice", t0()).unwrap();
    assert_eq!(stats.due, 1);
    assert!(next_due.is_none());

    svc.answer_card("alice", card.id, 2, t0()).unwrap();
    let (stats, next_due) = svc.get_overview("alice", t0()).unwrap();
    assert_eq!(stats.due, 0);
    assert_eq!(next_due, Some(t0() + Duration::minutes(5)));
  }

  #[test]
  fn test_answer_at_end_of_time_stays_readable_on_sqlite() {
    use chrono::TimeZone;

    let svc = ReviewService::new(Arc::new(SqliteCardStore::in_memory().unwrap()));
    let late = Utc.with_ymd_and_hms(9999, 12, 31, 23, 58, 0).unwrap();
    let failed = add(&svc, "alice", "uno");
    let promoted = add(&svc, "alice", "dos");

    svc.answer_card("alice", failed.id, 1, late).unwrap();
    svc.answer_card("alice", promoted.id, 3, late).unwrap();

    let stats = svc.get_stats("alice", late).unwrap();
    assert_eq!(stats.total, 2);
    assert_eq!(stats.due, 0);
    assert!(svc.get_due_cards("alice", late).unwrap().is_empty());
    assert_eq!(svc.review_history("alice", promoted.id).unwrap().len(), 1);
  }

  #[test]
  fn test_same_behaviour_on_sqlite() {
    let svc = ReviewService::new(Arc::new(SqliteCardStore::in_memory().unwrap()));
    let card = add(&svc, "alice", "uno");
    let answered = svc.answer_card("alice", card.id, 3, t0()).unwrap();
    assert_eq!(answered.state, CardState::Review);
    assert_eq!(svc.get_stats("alice", t0()).unwrap().review, 1);
    assert!(matches!(svc.answer_card("alice", card.id, 9, t0()), Err(SrsError::InvalidRating(9))));
    svc.delete_card("alice", card.id).unwrap();
    assert!(matches!(svc.answer_card("alice", card.id, 3, t0()), Err(SrsError::UnknownCard(_))));
  }
}
