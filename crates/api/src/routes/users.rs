//! User routes: registration, profile, own transactions, transfers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use stellar_core::access::{AccessDenied, AccessGate, Operation, Role};
use stellar_core::ledger::{ListScope, RedemptionInput, TransactionRecord, TransferInput};
use stellar_core::promotion::Promotion;
use stellar_core::user::{DirectoryError, NewUser, User};
use stellar_shared::types::UserId;

use super::payload::{ListTransactionsQuery, points};
use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Creates the user routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(register_user))
        .route("/users/me", get(me))
        .route("/users/me/transactions", get(list_own_transactions).post(request_redemption))
        .route("/users/{user_id}", patch(update_user))
        .route("/users/{user_id}/transactions", post(transfer_points))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for registering a user.
#[derive(Debug, Deserialize)]
pub struct RegisterUserRequest {
    /// Handle.
    pub utorid: String,
    /// Display name.
    pub name: String,
}

/// Request body for changing a user's role or flags.
#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    /// New role.
    pub role: Option<Role>,
    /// Verification state.
    pub verified: Option<bool>,
    /// Suspicion state.
    pub suspicious: Option<bool>,
}

/// Request body for the user-scoped transaction endpoints.
#[derive(Debug, Deserialize)]
pub struct UserTransactionRequest {
    /// `redemption` on `/users/me`, `transfer` on `/users/{id}`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Point amount.
    pub amount: Option<Value>,
    /// Free-text remark.
    #[serde(default)]
    pub remark: String,
}

/// Profile of the calling user.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    /// Directory entry.
    #[serde(flatten)]
    pub user: User,
    /// Current balance.
    pub points: i64,
    /// One-time promotions still available to the user.
    pub promotions: Vec<Promotion>,
}

fn expect_kind(request: &UserTransactionRequest, expected: &str) -> Result<(), ApiError> {
    if request.kind.trim().eq_ignore_ascii_case(expected) {
        Ok(())
    } else {
        Err(ApiError::validation(format!(
            "type must be {expected}, got {}",
            request.kind
        )))
    }
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/users` - Register a regular, unverified user.
async fn register_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<RegisterUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let actor = auth.actor(&state.ledger)?;
    AccessGate::authorize(&actor, Operation::RegisterUser, None)?;

    let user = state.ledger.directory().register(NewUser {
        utorid: payload.utorid,
        name: payload.name,
        role: Role::Regular,
        verified: false,
    })?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// PATCH `/users/{user_id}` - Change role, verification or suspicion.
///
/// Granting manager or superuser, or editing an existing manager or
/// superuser, requires a superuser.
async fn update_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<i64>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let actor = auth.actor(&state.ledger)?;
    AccessGate::authorize(&actor, Operation::UpdateUser, None)?;
    if payload.role.is_some_and(|role| role.at_least(Role::Manager))
        && !actor.role.at_least(Role::Superuser)
    {
        return Err(AccessDenied {
            operation: Operation::UpdateUser,
        }
        .into());
    }

    let directory = state.ledger.directory();
    let id = UserId::new(user_id);
    let mut user = directory
        .find(id)
        .ok_or(DirectoryError::UserNotFound(id))?;
    if user.role.at_least(Role::Manager) && !actor.role.at_least(Role::Superuser) {
        return Err(AccessDenied {
            operation: Operation::UpdateUser,
        }
        .into());
    }
    if let Some(role) = payload.role {
        user = directory.set_role(id, role)?;
    }
    if let Some(verified) = payload.verified {
        user = directory.set_verified(id, verified)?;
    }
    if let Some(suspicious) = payload.suspicious {
        user = directory.set_suspicious(id, suspicious)?;
    }

    tracing::info!(
        user_id = %id,
        role = %user.role,
        verified = user.verified,
        suspicious = user.suspicious,
        updated_by = %actor.utorid,
        "User updated"
    );
    Ok(Json(user))
}

/// GET `/users/me` - Profile with balance and available promotions.
async fn me(State(state): State<AppState>, auth: AuthUser) -> Result<impl IntoResponse, ApiError> {
    let actor = auth.actor(&state.ledger)?;
    let user = state
        .ledger
        .directory()
        .find(actor.id)
        .ok_or(DirectoryError::UserNotFound(actor.id))?;

    Ok(Json(ProfileResponse {
        points: state.ledger.balance(actor.id),
        promotions: state.ledger.available_promotions(actor.id, Utc::now()),
        user,
    }))
}

/// GET `/users/me/transactions` - The caller's own transactions.
async fn list_own_transactions(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListTransactionsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let actor = auth.actor(&state.ledger)?;
    let (filter, page) = query.into_filter()?;
    let rows = state.ledger.list(&actor, ListScope::Own, &filter, page)?;
    Ok(Json(rows.map(TransactionRecord::from)))
}

/// POST `/users/me/transactions` - Request a redemption.
async fn request_redemption(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<UserTransactionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let actor = auth.actor(&state.ledger)?;
    expect_kind(&payload, "redemption")?;
    let amount = points(payload.amount.as_ref(), "amount")?;

    let tx = state.ledger.request_redemption(
        &actor,
        RedemptionInput {
            amount,
            remark: payload.remark,
        },
    )?;
    Ok((StatusCode::CREATED, Json(TransactionRecord::from(tx))))
}

/// POST `/users/{user_id}/transactions` - Transfer points to `user_id`.
async fn transfer_points(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(user_id): Path<i64>,
    Json(payload): Json<UserTransactionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let actor = auth.actor(&state.ledger)?;
    expect_kind(&payload, "transfer")?;
    let amount = points(payload.amount.as_ref(), "amount")?;

    let (sent, _received) = state.ledger.transfer(
        &actor,
        TransferInput {
            recipient: UserId::new(user_id),
            amount,
            remark: payload.remark,
        },
    )?;
    Ok((StatusCode::CREATED, Json(TransactionRecord::from(sent))))
}
