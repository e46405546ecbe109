//! Review session controller.
//!
//! A session snapshots the user's due cards into a queue and walks it one
//! card at a time: Idle -> Presenting -> AwaitingAnswer -> ... -> Complete.
//! Each answer is committed through [`ReviewService::answer_card`] the moment
//! it arrives, so dropping a session mid-way loses nothing already answered.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use super::review::ReviewService;
use crate::domain::Card;
use crate::error::{SrsError, SrsResult};
use crate::srs::CardStats;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
  Idle,
  Presenting,
  AwaitingAnswer,
  Complete,
}

/// Fires once each time the observed due count drops from positive to zero.
#[derive(Debug, Clone, Default)]
pub struct DueWatcher {
  previous: Option<usize>,
}

impl DueWatcher {
  /// Record a fresh due count; true if it just reached zero.
  pub fn observe(&mut self, due: usize) -> bool {
    let cleared = matches!(self.previous, Some(prev) if prev > 0) && due == 0;
    self.previous = Some(due);
    cleared
  }
}

/// What happened after one answer
#[derive(Debug, Clone, Serialize)]
pub struct AnswerOutcome {
  pub card: Card,
  pub stats: CardStats,
  pub phase: SessionPhase,
  /// Due count went from positive to zero on this answer
  pub due_cleared: bool,
}

#[derive(Debug, Clone)]
pub struct ReviewSession {
  user_id: String,
  phase: SessionPhase,
  queue: VecDeque<Card>,
  answered: usize,
  watcher: DueWatcher,
}

impl ReviewSession {
  pub fn new(user_id: &str) -> Self {
    Self {
      user_id: user_id.to_string(),
      phase: SessionPhase::Idle,
      queue: VecDeque::new(),
      answered: 0,
      watcher: DueWatcher::default(),
    }
  }

  /// Create a session and load its queue in one go.
  pub fn start(service: &ReviewService, user_id: &str, now: DateTime<Utc>) -> SrsResult<Self> {
    let mut session = Self::new(user_id);
    session.begin(service, now)?;
    Ok(session)
  }

  /// Load the due queue into a fresh Idle session.
  fn begin(&mut self, service: &ReviewService, now: DateTime<Utc>) -> SrsResult<()> {
    let due = service.get_due_cards(&self.user_id, now)?;
    self.watcher.observe(due.len());
    self.queue = due.into();
    self.phase = if self.queue.is_empty() {
      SessionPhase::Complete
    } else {
      SessionPhase::Presenting
    };
    tracing::debug!(
      "Review session for '{}' started with {} due cards",
      self.user_id,
      self.queue.len()
    );
    Ok(())
  }

  pub fn user_id(&self) -> &str {
    &self.user_id
  }

  pub fn phase(&self) -> SessionPhase {
    self.phase
  }

  pub fn remaining(&self) -> usize {
    self.queue.len()
  }

  pub fn answered(&self) -> usize {
    self.answered
  }

  /// Show the card at the head of the queue.
  pub fn present(&mut self) -> Option<&Card> {
    match self.phase {
      SessionPhase::Presenting | SessionPhase::AwaitingAnswer => {
        self.phase = SessionPhase::AwaitingAnswer;
        self.queue.front()
      }
      SessionPhase::Idle | SessionPhase::Complete => None,
    }
  }

  /// Answer the head card, advance, and refresh statistics.
  pub fn answer(
    &mut self,
    service: &ReviewService,
    rating: i64,
    now: DateTime<Utc>,
  ) -> SrsResult<AnswerOutcome> {
    let card_id = match (self.phase, self.queue.front()) {
      (SessionPhase::Presenting | SessionPhase::AwaitingAnswer, Some(card)) => card.id,
      _ => return Err(SrsError::SessionComplete),
    };

    let card = match service.answer_card(&self.user_id, card_id, rating, now) {
      Ok(card) => card,
      Err(SrsError::UnknownCard(id)) => {
        // Deleted out from under us: drop it and move on
        self.advance();
        return Err(SrsError::UnknownCard(id));
      }
      Err(e) => return Err(e),
    };
    self.answered += 1;
    self.advance();

    let (stats, due_cleared) = self.refresh(service, now)?;
    Ok(AnswerOutcome {
      card,
      stats,
      phase: self.phase,
      due_cleared,
    })
  }

  /// Re-run statistics; completes the session when the due count hits zero.
  pub fn refresh(&mut self, service: &ReviewService, now: DateTime<Utc>) -> SrsResult<(CardStats, bool)> {
    let stats = service.get_stats(&self.user_id, now)?;
    let cleared = self.watcher.observe(stats.due);
    if cleared {
      tracing::info!(
        "User '{}' cleared all due cards after {} answers",
        self.user_id,
        self.answered
      );
      self.queue.clear();
      self.phase = SessionPhase::Complete;
    }
    Ok((stats, cleared))
  }

  fn advance(&mut self) {
    self.queue.pop_front();
    self.phase = if self.queue.is_empty() {
      SessionPhase::Complete
    } else {
      SessionPhase::Presenting
    };
  }
}
