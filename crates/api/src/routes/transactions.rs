//! Transaction routes: staff-created transactions, lookup, listing and
//! the suspicious/processed/cancelled state changes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
};
use serde::Deserialize;
use serde_json::Value;

use stellar_core::ledger::{
    AdjustmentInput, ListScope, PurchaseInput, TransactionKind, TransactionRecord,
    TransactionRequest,
};
use stellar_shared::types::{PromotionId, TransactionId};

use super::payload::{ListTransactionsQuery, money, points};
use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Creates the transaction routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/transactions", get(list_transactions).post(create_transaction))
        .route("/transactions/{transaction_id}", get(get_transaction))
        .route("/transactions/{transaction_id}/suspicious", patch(set_suspicious))
        .route("/transactions/{transaction_id}/processed", patch(process_redemption))
        .route("/transactions/{transaction_id}/cancelled", patch(cancel_redemption))
}

// ============================================================================
// Request Types
// ============================================================================

/// Request body for creating a purchase or an adjustment.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionRequest {
    /// `purchase` or `adjustment`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Owner handle.
    pub utorid: String,
    /// Money spent (purchase).
    pub spent: Option<Value>,
    /// Point amount (adjustment).
    pub amount: Option<Value>,
    /// Corrected transaction (adjustment).
    pub related_id: Option<i64>,
    /// Requested one-time promotions (purchase).
    #[serde(default)]
    pub promotion_ids: Vec<i64>,
    /// Free-text remark.
    #[serde(default)]
    pub remark: String,
}

impl CreateTransactionRequest {
    fn into_request(self) -> Result<TransactionRequest, ApiError> {
        match TransactionKind::parse(&self.kind) {
            Some(TransactionKind::Purchase) => Ok(TransactionRequest::Purchase(PurchaseInput {
                spent: money(self.spent.as_ref(), "spent")?,
                utorid: self.utorid,
                promotion_ids: self.promotion_ids.into_iter().map(PromotionId::new).collect(),
                remark: self.remark,
            })),
            Some(TransactionKind::Adjustment) => {
                let related_id = self
                    .related_id
                    .ok_or_else(|| ApiError::validation("relatedId is required"))?;
                Ok(TransactionRequest::Adjustment(AdjustmentInput {
                    amount: points(self.amount.as_ref(), "amount")?,
                    utorid: self.utorid,
                    related_id: TransactionId::new(related_id),
                    remark: self.remark,
                }))
            }
            _ => Err(ApiError::validation(format!(
                "type must be purchase or adjustment, got {}",
                self.kind
            ))),
        }
    }
}

/// Request body for `PATCH /transactions/{id}/suspicious`.
#[derive(Debug, Deserialize)]
pub struct SuspiciousRequest {
    /// New flag value.
    pub suspicious: bool,
}

/// Request body for `PATCH /transactions/{id}/processed`.
#[derive(Debug, Deserialize)]
pub struct ProcessedRequest {
    /// Must be `true`.
    pub processed: bool,
}

/// Request body for `PATCH /transactions/{id}/cancelled`.
#[derive(Debug, Deserialize)]
pub struct CancelledRequest {
    /// Must be `true`.
    pub cancelled: bool,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/transactions` - Record a purchase (cashier+) or adjustment (manager+).
async fn create_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateTransactionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let actor = auth.actor(&state.ledger)?;
    let request = payload.into_request()?;
    let tx = state.ledger.record(&actor, request)?;
    Ok((StatusCode::CREATED, Json(TransactionRecord::from(tx))))
}

/// GET `/transactions` - List every user's transactions (manager+).
async fn list_transactions(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListTransactionsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let actor = auth.actor(&state.ledger)?;
    let (filter, page) = query.into_filter()?;
    let rows = state.ledger.list(&actor, ListScope::All, &filter, page)?;
    Ok(Json(rows.map(TransactionRecord::from)))
}

/// GET `/transactions/{transaction_id}` - One transaction (owner or manager+).
async fn get_transaction(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(transaction_id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let actor = auth.actor(&state.ledger)?;
    let tx = state
        .ledger
        .transaction(&actor, TransactionId::new(transaction_id))?;
    Ok(Json(TransactionRecord::from(tx)))
}

/// PATCH `/transactions/{transaction_id}/suspicious` - Set or clear the hold.
async fn set_suspicious(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(transaction_id): Path<i64>,
    Json(payload): Json<SuspiciousRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let actor = auth.actor(&state.ledger)?;
    let tx = state.ledger.set_suspicious(
        &actor,
        TransactionId::new(transaction_id),
        payload.suspicious,
    )?;
    Ok(Json(TransactionRecord::from(tx)))
}

/// PATCH `/transactions/{transaction_id}/processed` - Fulfil a redemption.
async fn process_redemption(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(transaction_id): Path<i64>,
    Json(payload): Json<ProcessedRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let actor = auth.actor(&state.ledger)?;
    if !payload.processed {
        return Err(ApiError::validation("processed must be true"));
    }
    let tx = state
        .ledger
        .process_redemption(&actor, TransactionId::new(transaction_id))?;
    Ok(Json(TransactionRecord::from(tx)))
}

/// PATCH `/transactions/{transaction_id}/cancelled` - Withdraw a redemption.
async fn cancel_redemption(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(transaction_id): Path<i64>,
    Json(payload): Json<CancelledRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let actor = auth.actor(&state.ledger)?;
    if !payload.cancelled {
        return Err(ApiError::validation("cancelled must be true"));
    }
    let tx = state
        .ledger
        .cancel_redemption(&actor, TransactionId::new(transaction_id))?;
    Ok(Json(TransactionRecord::from(tx)))
}
