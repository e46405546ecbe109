use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type CardId = i64;

/// Coarse learning phase of a card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CardState {
  #[default]
  Learning,
  Review,
  /// Never produced by the scheduler; accepted from storage
  Relearning,
}

impl CardState {
  pub fn from_str(s: &str) -> Option<Self> {
    match s {
      "Learning" => Some(Self::Learning),
      "Review" => Some(Self::Review),
      "Relearning" => Some(Self::Relearning),
      _ => None,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Learning => "Learning",
      Self::Review => "Review",
      Self::Relearning => "Relearning",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
  /// Zero until the store assigns one
  pub id: CardId,
  pub word: String,
  pub translation: String,
  pub context: Option<String>,

  pub state: CardState,
  pub due: DateTime<Utc>,
  pub stability: f64,
  pub difficulty: f64,
  pub elapsed_days: f64,
  pub scheduled_days: f64,
  pub reps: u32,
  pub lapses: u32,

  pub created: DateTime<Utc>,
  pub last_reviewed: Option<DateTime<Utc>>,
}

impl Card {
  /// A fresh card, due immediately.
  pub fn new(
    word: String,
    translation: String,
    context: Option<String>,
    now: DateTime<Utc>,
  ) -> Self {
    Self {
      id: 0,
      word,
      translation,
      context,
      state: CardState::Learning,
      due: now,
      stability: 0.0,
      difficulty: 0.0,
      elapsed_days: 0.0,
      scheduled_days: 0.0,
      reps: 0,
      lapses: 0,
      created: now,
      last_reviewed: None,
    }
  }

  pub fn is_due(&self, now: DateTime<Utc>) -> bool {
    self.due <= now
  }
}
