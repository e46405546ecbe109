use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::card::{Card, CardId, CardState};
use super::rating::Rating;

/// One answered review, as appended to a user's history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewLog {
  pub id: i64,
  pub card_id: CardId,
  pub rating: Rating,
  pub reviewed_at: DateTime<Utc>,
  pub state_before: CardState,
  pub state_after: CardState,
  pub elapsed_days: f64,
  pub scheduled_days: f64,
}

impl ReviewLog {
  /// Describe the step from `before` to `after`.
  pub fn from_transition(before: &Card, after: &Card, rating: Rating, reviewed_at: DateTime<Utc>) -> Self {
    Self {
      id: 0,
      card_id: after.id,
      rating,
      reviewed_at,
      state_before: before.state,
      state_after: after.state,
      elapsed_days: after.elapsed_days,
      scheduled_days: after.scheduled_days,
    }
  }
}
