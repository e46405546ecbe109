//! Error types for the scheduler and its card stores.

use crate::domain::CardId;

/// Failure inside a card store. Surfaced to callers as-is, never retried.
#[derive(Debug)]
pub enum StoreError {
  /// A thread panicked while holding the store lock
  Lock,
  Database(rusqlite::Error),
}

impl std::fmt::Display for StoreError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      StoreError::Lock => write!(f, "Database unavailable"),
      StoreError::Database(e) => write!(f, "Database error: {}", e),
    }
  }
}

impl std::error::Error for StoreError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      StoreError::Lock => None,
      StoreError::Database(e) => Some(e),
    }
  }
}

impl From<rusqlite::Error> for StoreError {
  fn from(e: rusqlite::Error) -> Self {
    StoreError::Database(e)
  }
}

#[derive(Debug)]
pub enum SrsError {
  InvalidRating(i64),
  /// A required card field was blank
  InvalidCard(&'static str),
  UnknownCard(CardId),
  UnknownUser(String),
  UnknownSession(String),
  SessionComplete,
  Store(StoreError),
}

impl std::fmt::Display for SrsError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      SrsError::InvalidRating(r) => write!(f, "Invalid rating {}: expected 1-5", r),
      SrsError::InvalidCard(field) => write!(f, "Card {} must not be empty", field),
      SrsError::UnknownCard(id) => write!(f, "Card {} not found", id),
      SrsError::UnknownUser(user) => write!(f, "User '{}' has no cards", user),
      SrsError::UnknownSession(id) => write!(f, "Review session '{}' not found", id),
      SrsError::SessionComplete => write!(f, "Review session is already complete"),
      SrsError::Store(e) => write!(f, "{}", e),
    }
  }
}

impl std::error::Error for SrsError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      SrsError::Store(e) => Some(e),
      _ => None,
    }
  }
}

impl From<StoreError> for SrsError {
  fn from(e: StoreError) -> Self {
    SrsError::Store(e)
  }
}

pub type SrsResult<T> = std::result::Result<T, SrsError>;
pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_error_messages() {
    assert_eq!(SrsError::InvalidRating(9).to_string(), "Invalid rating 9: expected 1-5");
    assert_eq!(SrsError::UnknownCard(12).to_string(), "Card 12 not found");
    assert_eq!(SrsError::InvalidCard("word").to_string(), "Card word must not be empty");
    assert_eq!(StoreError::Lock.to_string(), "Database unavailable");
  }

  #[test]
  fn test_store_error_passes_through_verbatim() {
    let err: SrsError = StoreError::Lock.into();
    assert_eq!(err.to_string(), "Database unavailable");
    assert!(std::error::Error::source(&err).is_some());
  }

  #[test]
  fn test_sqlite_error_converts() {
    let err: StoreError = rusqlite::Error::QueryReturnedNoRows.into();
    assert!(matches!(err, StoreError::Database(_)));
  }
}
