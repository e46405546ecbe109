use axum::{
  extract::{Path, Query, State},
  http::StatusCode,
  response::Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::NowQuery;
use crate::domain::{Card, CardId, ReviewLog};
use crate::error::SrsError;
use crate::srs::CardStats;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateCardRequest {
  pub word: String,
  pub translation: String,
  #[serde(default)]
  pub context: Option<String>,
  #[serde(default)]
  pub now: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
  pub rating: i64,
  #[serde(default)]
  pub now: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
  #[serde(flatten)]
  pub stats: CardStats,
  /// Only set when nothing is due
  pub next_due: Option<DateTime<Utc>>,
}

pub async fn create_card(
  State(state): State<AppState>,
  Path(user_id): Path<String>,
  Json(req): Json<CreateCardRequest>,
) -> Result<(StatusCode, Json<Card>), SrsError> {
  let now = req.now.unwrap_or_else(Utc::now);
  let card = state.service.create_card(
    &user_id,
    &req.word,
    &req.translation,
    req.context.as_deref(),
    now,
  )?;
  Ok((StatusCode::CREATED, Json(card)))
}

pub async fn due_cards(
  State(state): State<AppState>,
  Path(user_id): Path<String>,
  Query(query): Query<NowQuery>,
) -> Result<Json<Vec<Card>>, SrsError> {
  Ok(Json(state.service.get_due_cards(&user_id, query.resolve())?))
}

pub async fn answer_card(
  State(state): State<AppState>,
  Path((user_id, card_id)): Path<(String, CardId)>,
  Json(req): Json<AnswerRequest>,
) -> Result<Json<Card>, SrsError> {
  let now = req.now.unwrap_or_else(Utc::now);
  Ok(Json(state.service.answer_card(&user_id, card_id, req.rating, now)?))
}

pub async fn review_history(
  State(state): State<AppState>,
  Path((user_id, card_id)): Path<(String, CardId)>,
) -> Result<Json<Vec<ReviewLog>>, SrsError> {
  Ok(Json(state.service.review_history(&user_id, card_id)?))
}

pub async fn delete_card(
  State(state): State<AppState>,
  Path((user_id, card_id)): Path<(String, CardId)>,
) -> Result<StatusCode, SrsError> {
  state.service.delete_card(&user_id, card_id)?;
  Ok(StatusCode::NO_CONTENT)
}

pub async fn stats(
  State(state): State<AppState>,
  Path(user_id): Path<String>,
  Query(query): Query<NowQuery>,
) -> Result<Json<StatsResponse>, SrsError> {
  let (stats, next_due) = state.service.get_overview(&user_id, query.resolve())?;
  Ok(Json(StatsResponse { stats, next_due }))
}
