use axum::{
  extract::{Path, Query, State},
  http::StatusCode,
  response::Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::cards::AnswerRequest;
use super::NowQuery;
use crate::domain::Card;
use crate::error::SrsError;
use crate::services::{AnswerOutcome, ReviewSession, SessionPhase};
use crate::state::AppState;

/// Snapshot of a session as the client sees it
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionView {
  pub session_id: String,
  pub user_id: String,
  pub phase: SessionPhase,
  pub current: Option<Card>,
  pub remaining: usize,
  pub answered: usize,
}

impl SessionView {
  fn present(session_id: &str, session: &mut ReviewSession) -> Self {
    let current = session.present().cloned();
    Self {
      session_id: session_id.to_string(),
      user_id: session.user_id().to_string(),
      phase: session.phase(),
      current,
      remaining: session.remaining(),
      answered: session.answered(),
    }
  }
}

#[derive(Debug, Serialize)]
pub struct SessionAnswerResponse {
  #[serde(flatten)]
  pub outcome: AnswerOutcome,
  pub next: Option<Card>,
}

pub async fn start_session(
  State(state): State<AppState>,
  Path(user_id): Path<String>,
  Query(query): Query<NowQuery>,
) -> Result<(StatusCode, Json<SessionView>), SrsError> {
  let mut session = ReviewSession::start(&state.service, &user_id, query.resolve())?;
  let view = SessionView::present("", &mut session);
  let session_id = state.sessions.insert(session)?;
  Ok((StatusCode::CREATED, Json(SessionView { session_id, ..view })))
}

pub async fn show_session(
  State(state): State<AppState>,
  Path(session_id): Path<String>,
) -> Result<Json<SessionView>, SrsError> {
  let view = state
    .sessions
    .with(&session_id, |session| Ok(SessionView::present(&session_id, session)))?;
  Ok(Json(view))
}

pub async fn answer_session(
  State(state): State<AppState>,
  Path(session_id): Path<String>,
  Json(req): Json<AnswerRequest>,
) -> Result<Json<SessionAnswerResponse>, SrsError> {
  let now = req.now.unwrap_or_else(Utc::now);
  let response = state.sessions.with(&session_id, |session| {
    let outcome = session.answer(&state.service, req.rating, now)?;
    let next = session.present().cloned();
    Ok(SessionAnswerResponse { outcome, next })
  })?;
  Ok(Json(response))
}

pub async fn abandon_session(
  State(state): State<AppState>,
  Path(session_id): Path<String>,
) -> Result<StatusCode, SrsError> {
  if !state.sessions.remove(&session_id)? {
    return Err(SrsError::UnknownSession(session_id));
  }
  tracing::debug!("Abandoned review session {}", session_id);
  Ok(StatusCode::NO_CONTENT)
}
