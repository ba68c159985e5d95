//! Event award route.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use serde::Deserialize;
use serde_json::Value;

use stellar_core::ledger::{EventAwardInput, TransactionRecord};
use stellar_shared::types::EventId;

use super::payload::points;
use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Creates the event routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/events/{event_id}/transactions", post(award_points))
}

/// Request body for an event award.
#[derive(Debug, Deserialize)]
pub struct EventAwardRequest {
    /// Recipient handle.
    pub utorid: String,
    /// Positive point amount.
    pub amount: Option<Value>,
    /// Free-text remark.
    #[serde(default)]
    pub remark: String,
}

/// POST `/events/{event_id}/transactions` - Award event points (manager+).
async fn award_points(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(event_id): Path<i64>,
    Json(payload): Json<EventAwardRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let actor = auth.actor(&state.ledger)?;
    let amount = points(payload.amount.as_ref(), "amount")?;
    let tx = state.ledger.award_event(
        &actor,
        EventAwardInput {
            utorid: payload.utorid,
            amount,
            event_id: Some(EventId::new(event_id)),
            remark: payload.remark,
        },
    )?;
    Ok((StatusCode::CREATED, Json(TransactionRecord::from(tx))))
}
