//! Card storage capability.
//!
//! The scheduler holds no card state of its own. Everything it reads or
//! writes goes through a [`CardStore`], keyed by user and card id.

pub mod memory;
pub mod sqlite;

use crate::domain::{Card, CardId, ReviewLog};
use crate::error::StoreResult;

pub use memory::MemoryCardStore;
pub use sqlite::SqliteCardStore;

/// Per-user keyed card collection.
///
/// A user exists once their first card is inserted and keeps existing
/// after their last card is deleted. Each call must be atomic with respect
/// to the others, so readers never observe half of a `record_answer`.
pub trait CardStore: Send + Sync {
  fn has_user(&self, user_id: &str) -> StoreResult<bool>;

  fn get_card(&self, user_id: &str, card_id: CardId) -> StoreResult<Option<Card>>;

  /// All of a user's cards; empty for an unknown user.
  fn list_cards(&self, user_id: &str) -> StoreResult<Vec<Card>>;

  /// Insert a new card and return it with its assigned id.
  fn insert_card(&self, user_id: &str, card: Card) -> StoreResult<Card>;

  /// Replace the stored card and append the review to its history in one
  /// step. Returns `None` without writing if the card does not exist.
  fn record_answer(
    &self,
    user_id: &str,
    card: &Card,
    log: &ReviewLog,
  ) -> StoreResult<Option<ReviewLog>>;

  /// Remove a card and its history. Returns whether it existed.
  fn delete_card(&self, user_id: &str, card_id: CardId) -> StoreResult<bool>;

  /// A card's reviews, oldest first.
  fn review_history(&self, user_id: &str, card_id: CardId) -> StoreResult<Vec<ReviewLog>>;
}
