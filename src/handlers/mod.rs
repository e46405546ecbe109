pub mod cards;
pub mod sessions;

use axum::{
  http::StatusCode,
  response::{IntoResponse, Json, Response},
  routing::{get, post},
  Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::error::SrsError;
use crate::state::AppState;

/// Optional `?now=` override; handlers fall back to the wall clock
#[derive(Debug, Default, Deserialize)]
pub struct NowQuery {
  pub now: Option<DateTime<Utc>>,
}

impl NowQuery {
  pub fn resolve(&self) -> DateTime<Utc> {
    self.now.unwrap_or_else(Utc::now)
  }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
  pub error: String,
}

impl SrsError {
  fn status(&self) -> StatusCode {
    match self {
      SrsError::InvalidRating(_) | SrsError::InvalidCard(_) => StatusCode::BAD_REQUEST,
      SrsError::UnknownCard(_) | SrsError::UnknownUser(_) | SrsError::UnknownSession(_) => {
        StatusCode::NOT_FOUND
      }
      SrsError::SessionComplete => StatusCode::CONFLICT,
      SrsError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl IntoResponse for SrsError {
  fn into_response(self) -> Response {
    let status = self.status();
    if let SrsError::Store(e) = &self {
      tracing::error!("Store failure: {}", e);
    }
    (status, Json(ErrorResponse { error: self.to_string() })).into_response()
  }
}

pub fn router(state: AppState) -> Router {
  Router::new()
    .route("/users/{user_id}/cards", post(cards::create_card))
    .route("/users/{user_id}/cards/due", get(cards::due_cards))
    .route("/users/{user_id}/cards/{card_id}", axum::routing::delete(cards::delete_card))
    .route("/users/{user_id}/cards/{card_id}/answer", post(cards::answer_card))
    .route("/users/{user_id}/cards/{card_id}/reviews", get(cards::review_history))
    .route("/users/{user_id}/stats", get(cards::stats))
    .route("/users/{user_id}/sessions", post(sessions::start_session))
    .route(
      "/sessions/{session_id}",
      get(sessions::show_session).delete(sessions::abandon_session),
    )
    .route("/sessions/{session_id}/answer", post(sessions::answer_session))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}


#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::StoreError;

  #[test]
  fn test_error_status_mapping() {
    assert_eq!(SrsError::InvalidRating(9).status(), StatusCode::BAD_REQUEST);
    assert_eq!(SrsError::InvalidCard("word").status(), StatusCode::BAD_REQUEST);
    assert_eq!(SrsError::UnknownCard(1).status(), StatusCode::NOT_FOUND);
    assert_eq!(SrsError::UnknownUser("bob".into()).status(), StatusCode::NOT_FOUND);
    assert_eq!(SrsError::UnknownSession("x".into()).status(), StatusCode::NOT_FOUND);
    assert_eq!(SrsError::SessionComplete.status(), StatusCode::CONFLICT);
    assert_eq!(
      SrsError::Store(StoreError::Lock).status(),
      StatusCode::INTERNAL_SERVER_ERROR
    );
  }

  #[test]
  fn test_now_query_prefers_explicit_time() {
    let now = crate::testing::t0();
    assert_eq!(NowQuery { now: Some(now) }.resolve(), now);
  }
}
