//! Rating transition function.
//!
//! Given a card, a rating and the time of answering, produce the card's next
//! scheduling state. Deterministic: the caller supplies `now` and persists
//! the result.
//!
//! Rules by rating:
//!   - Again / Hard: back to Learning, stability * 0.8, due in 5 minutes.
//!     Only path that counts a lapse.
//!   - Good on a Learning card: graduates to Review with stability reset to
//!     1.5, due in 1 day.
//!   - Good otherwise: stability * 1.2, state kept.
//!   - Easy / Perfect: stability * 1.5, state kept.
//!
//! For the two multiplicative success branches the next interval is the
//! stability held *before* this answer, in days, while the stored stability
//! is the multiplied value. Intervals therefore lag one review behind the
//! stored stability.

use chrono::{DateTime, Duration, Utc};

use crate::config::{
  DIFFICULTY_STEP, EASY_STABILITY_FACTOR, FAILURE_RETRY_MINUTES, FAILURE_STABILITY_FACTOR,
  GOOD_STABILITY_FACTOR, MAX_DIFFICULTY, MIN_DIFFICULTY, MIN_STABILITY, PROMOTION_INTERVAL_DAYS,
  PROMOTION_STABILITY,
};
use crate::domain::{Card, CardState, Rating};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Apply `rating` to `card` answered at `now`.
pub fn transition(card: &Card, rating: Rating, now: DateTime<Utc>) -> Card {
  let elapsed_days = days_between(card.due, now).max(0.0);
  let prior_stability = card.stability.max(0.0);

  let (state, stability, due) = match rating {
    Rating::Again | Rating::Hard => (
      CardState::Learning,
      (card.stability * FAILURE_STABILITY_FACTOR).max(0.0),
      add_duration(now, Duration::minutes(FAILURE_RETRY_MINUTES)),
    ),
    Rating::Good => match card.state {
      CardState::Learning => (
        CardState::Review,
        PROMOTION_STABILITY,
        add_duration(now, Duration::days(PROMOTION_INTERVAL_DAYS)),
      ),
      CardState::Review | CardState::Relearning => (
        card.state,
        card.stability * GOOD_STABILITY_FACTOR,
        add_days(now, prior_stability),
      ),
    },
    Rating::Easy | Rating::Perfect => (
      card.state,
      card.stability * EASY_STABILITY_FACTOR,
      add_days(now, prior_stability),
    ),
  };

  let shift = (rating.value() as f64 - 3.0) * DIFFICULTY_STEP;
  let difficulty = (card.difficulty + shift).max(MIN_DIFFICULTY).min(MAX_DIFFICULTY);

  Card {
    state,
    due,
    stability: stability.max(MIN_STABILITY),
    difficulty,
    elapsed_days,
    scheduled_days: days_between(now, due).max(0.0),
    reps: card.reps.saturating_add(1),
    lapses: card.lapses.saturating_add(u32::from(rating.is_failure())),
    last_reviewed: Some(now),
    ..card.clone()
  }
}

/// Signed distance from `from` to `to` in fractional days
pub fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
  (to - from).num_milliseconds() as f64 / MILLIS_PER_DAY
}

/// 9999-12-31T23:59:59Z, the last instant an RFC 3339 timestamp can hold
const LATEST_DUE_SECS: i64 = 253_402_300_799;

fn latest_due() -> DateTime<Utc> {
  DateTime::from_timestamp(LATEST_DUE_SECS, 0).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// `now + delta`, saturating at [`latest_due`] so the result stays storable.
fn add_duration(now: DateTime<Utc>, delta: Duration) -> DateTime<Utc> {
  now
    .checked_add_signed(delta)
    .map_or_else(latest_due, |due| due.min(latest_due()))
}

fn add_days(now: DateTime<Utc>, days: f64) -> DateTime<Utc> {
  let millis = (days * MILLIS_PER_DAY).round() as i64;
  Duration::try_milliseconds(millis).map_or_else(latest_due, |d| add_duration(now, d))
}
