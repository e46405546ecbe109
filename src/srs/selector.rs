//! Due card selection.

use chrono::{DateTime, Utc};

use crate::domain::Card;

/// Every card with `due <= now`, ordered by due time then id.
pub fn due_cards(cards: &[Card], now: DateTime<Utc>) -> Vec<Card> {
  let mut due: Vec<Card> = cards.iter().filter(|c| c.is_due(now)).cloned().collect();
  due.sort_by(|a, b| a.due.cmp(&b.due).then(a.id.cmp(&b.id)));
  due
}

/// Earliest due time strictly after `now`, if any card is waiting
pub fn next_due(cards: &[Card], now: DateTime<Utc>) -> Option<DateTime<Utc>> {
  cards.iter().map(|c| c.due).filter(|due| *due > now).min()
}
