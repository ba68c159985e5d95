//! Promotion catalog routes.

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use chrono::Utc;
use serde::Deserialize;

use stellar_core::access::{AccessGate, Operation};
use stellar_core::promotion::NewPromotion;
use stellar_shared::types::{PageRequest, PageResponse};

use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Creates the promotion routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/promotions", get(list_promotions).post(create_promotion))
}

/// Query parameters for listing promotions.
#[derive(Debug, Deserialize)]
pub struct ListPromotionsQuery {
    /// Page number (1-indexed).
    pub page: Option<u32>,
    /// Page size (default: 10, max: 100).
    pub limit: Option<u32>,
}

/// GET `/promotions` - Promotions active now.
async fn list_promotions(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListPromotionsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    auth.actor(&state.ledger)?;
    let active = state.ledger.catalog().active_at(Utc::now());
    Ok(Json(PageResponse::paginate(
        active,
        PageRequest::from_query(query.page, query.limit),
    )))
}

/// POST `/promotions` - Create a promotion (manager+).
async fn create_promotion(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<NewPromotion>,
) -> Result<impl IntoResponse, ApiError> {
    let actor = auth.actor(&state.ledger)?;
    AccessGate::authorize(&actor, Operation::ManagePromotions, None)?;
    let promotion = state.ledger.catalog().create(payload)?;
    Ok((StatusCode::CREATED, Json(promotion)))
}

#[cfg(test)]
mod tests {
    use crate::routes::test_support::TestApp;
    use axum::http::StatusCode;
    use chrono::{Duration, Utc};
    use serde_json::json;
    use stellar_core::access::Role;

    #[tokio::test]
    async fn test_promotion_applies_to_purchase() {
        let app = TestApp::new();
        let manager = app.user("manager1", Role::Manager);
        let cashier = app.user("cashier1", Role::Cashier);
        let alice = app.user("alice001", Role::Regular);
        let now = Utc::now();
        let window = |kind: &str| {
            json!({
                "name": format!("{kind} promo"),
                "type": kind,
                "startTime": (now - Duration::hours(1)).to_rfc3339(),
                "endTime": (now + Duration::hours(1)).to_rfc3339(),
            })
        };

        let mut automatic = window("automatic");
        automatic["points"] = json!(10);
        let (status, auto) = app
            .send("POST", "/promotions", Some(&app.token(&manager)), Some(automatic))
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let mut one_time = window("one-time");
        one_time["rate"] = json!("0.05");
        one_time["minSpending"] = json!("20");
        let (status, once) = app
            .send("POST", "/promotions", Some(&app.token(&manager)), Some(one_time.clone()))
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, _) = app
            .send("POST", "/promotions", Some(&app.token(&cashier)), Some(one_time))
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, listed) = app
            .send("GET", "/promotions", Some(&app.token(&alice)), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed["count"], 2);

        let (_, me) = app.send("GET", "/users/me", Some(&app.token(&alice)), None).await;
        assert_eq!(me["promotions"][0]["id"], once["id"]);

        let (status, tx) = app
            .send(
                "POST",
                "/transactions",
                Some(&app.token(&cashier)),
                Some(json!({
                    "type": "purchase",
                    "utorid": "alice001",
                    "spent": 50.00,
                    "promotionIds": [once["id"]],
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(tx["amount"], 200 + 12);
        assert_eq!(tx["promotionIds"], json!([auto["id"], once["id"]]));

        let (_, me) = app.send("GET", "/users/me", Some(&app.token(&alice)), None).await;
        assert_eq!(me["points"], 212);
        assert_eq!(me["promotions"], json!([]));
    }

    #[tokio::test]
    async fn test_invalid_promotion_rejected() {
        let app = TestApp::new();
        let manager = app.user("manager1", Role::Manager);
        let now = Utc::now();
        let (status, body) = app
            .send(
                "POST",
                "/promotions",
                Some(&app.token(&manager)),
                Some(json!({
                    "name": "Backwards",
                    "type": "automatic",
                    "startTime": now.to_rfc3339(),
                    "endTime": (now - Duration::hours(1)).to_rfc3339(),
                    "points": 5,
                })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "INVALID_WINDOW");
    }
}
