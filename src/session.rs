//! In-memory storage for review sessions.
//!
//! Sessions are keyed by a random ID handed to the client and auto-expire
//! after a configurable duration of inactivity.

use crate::config;
use crate::error::{SrsError, SrsResult, StoreError};
use crate::services::ReviewSession;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Session entry with last access time for expiration
struct SessionEntry {
  session: Arc<Mutex<ReviewSession>>,
  last_access: DateTime<Utc>,
}

#[derive(Default)]
pub struct SessionStore {
  sessions: Mutex<HashMap<String, SessionEntry>>,
}

impl SessionStore {
  pub fn new() -> Self {
    Self::default()
  }

  fn lock(&self) -> SrsResult<MutexGuard<'_, HashMap<String, SessionEntry>>> {
    self.sessions.lock().map_err(|_| {
      tracing::error!("Session store mutex poisoned");
      SrsError::Store(StoreError::Lock)
    })
  }

  /// Store a session under a fresh ID and return the ID
  pub fn insert(&self, session: ReviewSession) -> SrsResult<String> {
    let mut sessions = self.lock()?;

    // Clean up expired sessions occasionally (~10% chance)
    if rand::random::<u8>() < config::SESSION_CLEANUP_THRESHOLD {
      cleanup_expired(&mut sessions, Utc::now());
    }

    let mut id = generate_session_id();
    while sessions.contains_key(&id) {
      id = generate_session_id();
    }
    sessions.insert(
      id.clone(),
      SessionEntry {
        session: Arc::new(Mutex::new(session)),
        last_access: Utc::now(),
      },
    );
    Ok(id)
  }

  /// Run `f` against a live session, refreshing its access time.
  ///
  /// Only the session itself stays locked while `f` runs; other sessions
  /// remain reachable.
  pub fn with<T>(
    &self,
    session_id: &str,
    f: impl FnOnce(&mut ReviewSession) -> SrsResult<T>,
  ) -> SrsResult<T> {
    let handle = {
      let mut sessions = self.lock()?;
      let now = Utc::now();
      let entry = sessions
        .get_mut(session_id)
        .filter(|entry| !is_expired(entry, now))
        .ok_or_else(|| SrsError::UnknownSession(session_id.to_string()))?;
      entry.last_access = now;
      entry.session.clone()
    };

    let mut session = handle.lock().map_err(|_| {
      tracing::error!("Review session {} poisoned", session_id);
      SrsError::Store(StoreError::Lock)
    })?;
    f(&mut session)
  }

  /// Drop a session; false if it did not exist
  pub fn remove(&self, session_id: &str) -> SrsResult<bool> {
    Ok(self.lock()?.remove(session_id).is_some())
  }
}

fn is_expired(entry: &SessionEntry, now: DateTime<Utc>) -> bool {
  entry.last_access <= now - Duration::hours(config::SESSION_EXPIRY_HOURS)
}

/// Clean up expired sessions
fn cleanup_expired(sessions: &mut HashMap<String, SessionEntry>, now: DateTime<Utc>) {
  let before = sessions.len();
  sessions.retain(|_, entry| !is_expired(entry, now));
  let removed = before - sessions.len();
  if removed > 0 {
    tracing::debug!("Expired {} review sessions", removed);
  }
}

/// Generate a new session ID
pub fn generate_session_id() -> String {
  use rand::Rng;
  let mut rng = rand::rng();
  (0..32)
    .map(|_| {
      let idx = rng.random_range(0..36u8);
      if idx < 10 {
        (b'0' + idx) as char
      } else {
        (b'a' + idx - 10) as char
      }
    })
    .collect()
}
