//! In-process card store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::RwLock;

use super::CardStore;
use crate::domain::{Card, CardId, ReviewLog};
use crate::error::{StoreError, StoreResult};

#[derive(Debug, Default)]
struct UserCollection {
  cards: HashMap<CardId, Card>,
  reviews: Vec<ReviewLog>,
}

/// Cards held in memory, one collection per user behind a single RwLock
#[derive(Debug)]
pub struct MemoryCardStore {
  users: RwLock<HashMap<String, UserCollection>>,
  last_card_id: AtomicI64,
  last_review_id: AtomicI64,
}

impl MemoryCardStore {
  pub fn new() -> Self {
    Self {
      users: RwLock::new(HashMap::new()),
      last_card_id: AtomicI64::new(0),
      last_review_id: AtomicI64::new(0),
    }
  }
}

impl Default for MemoryCardStore {
  fn default() -> Self {
    Self::new()
  }
}

impl CardStore for MemoryCardStore {
  fn has_user(&self, user_id: &str) -> StoreResult<bool> {
    let users = self.users.read().map_err(|_| StoreError::Lock)?;
    Ok(users.contains_key(user_id))
  }

  fn get_card(&self, user_id: &str, card_id: CardId) -> StoreResult<Option<Card>> {
    let users = self.users.read().map_err(|_| StoreError::Lock)?;
    Ok(users.get(user_id).and_then(|u| u.cards.get(&card_id)).cloned())
  }

  fn list_cards(&self, user_id: &str) -> StoreResult<Vec<Card>> {
    let users = self.users.read().map_err(|_| StoreError::Lock)?;
    Ok(
      users
        .get(user_id)
        .map(|u| u.cards.values().cloned().collect())
        .unwrap_or_default(),
    )
  }

  fn insert_card(&self, user_id: &str, mut card: Card) -> StoreResult<Card> {
    let mut users = self.users.write().map_err(|_| StoreError::Lock)?;
    card.id = self.last_card_id.fetch_add(1, Ordering::Relaxed) + 1;
    users
      .entry(user_id.to_string())
      .or_default()
      .cards
      .insert(card.id, card.clone());
    Ok(card)
  }

  fn record_answer(
    &self,
    user_id: &str,
    card: &Card,
    log: &ReviewLog,
  ) -> StoreResult<Option<ReviewLog>> {
    let mut users = self.users.write().map_err(|_| StoreError::Lock)?;
    let Some(collection) = users.get_mut(user_id) else {
      return Ok(None);
    };
    let Some(stored) = collection.cards.get_mut(&card.id) else {
      return Ok(None);
    };
    *stored = card.clone();

    let mut log = log.clone();
    log.id = self.last_review_id.fetch_add(1, Ordering::Relaxed) + 1;
    collection.reviews.push(log.clone());
    Ok(Some(log))
  }

  fn delete_card(&self, user_id: &str, card_id: CardId) -> StoreResult<bool> {
    let mut users = self.users.write().map_err(|_| StoreError::Lock)?;
    let Some(collection) = users.get_mut(user_id) else {
      return Ok(false);
    };
    let existed = collection.cards.remove(&card_id).is_some();
    if existed {
      collection.reviews.retain(|r| r.card_id != card_id);
    }
    Ok(existed)
  }

  fn review_history(&self, user_id: &str, card_id: CardId) -> StoreResult<Vec<ReviewLog>> {
    let users = self.users.read().map_err(|_| StoreError::Lock)?;
    Ok(
      users
        .get(user_id)
        .map(|u| {
          u.reviews
            .iter()
            .filter(|r| r.card_id == card_id)
            .cloned()
            .collect()
        })
        .unwrap_or_default(),
    )
  }
}
