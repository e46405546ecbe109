//! Per-user statistics, recomputed from scratch on every call.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Card, CardState};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardStats {
  pub total: usize,
  pub due: usize,
  pub learning: usize,
  pub review: usize,
  pub relearning: usize,
}

pub fn card_stats(cards: &[Card], now: DateTime<Utc>) -> CardStats {
  cards.iter().fold(
    CardStats {
      total: cards.len(),
      ..CardStats::default()
    },
    |mut stats, card| {
      if card.is_due(now) {
        stats.due += 1;
      }
      match card.state {
        CardState::Learning => stats.learning += 1,
        CardState::Review => stats.review += 1,
        CardState::Relearning => stats.relearning += 1,
      }
      stats
    },
  )
}
