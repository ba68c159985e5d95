//! Shared fixtures for route tests.

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header::AUTHORIZATION},
};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use stellar_core::access::Role;
use stellar_core::ledger::EventAwardInput;
use stellar_core::user::{NewUser, User};
use stellar_core::{Actor, LedgerSettings, PointsLedger, PromotionCatalog, UserDirectory};
use stellar_shared::{JwtConfig, JwtService};

use crate::{AppState, create_router};

pub struct TestApp {
    pub state: AppState,
    pub router: Router,
}

impl TestApp {
    pub fn new() -> Self {
        let ledger = PointsLedger::new(
            LedgerSettings::default(),
            Arc::new(UserDirectory::new()),
            Arc::new(PromotionCatalog::new()),
        );
        let state = AppState {
            ledger: Arc::new(ledger),
            jwt_service: Arc::new(JwtService::new(JwtConfig::default())),
        };
        let router = create_router(state.clone());
        Self { state, router }
    }

    pub fn user(&self, utorid: &str, role: Role) -> User {
        self.state
            .ledger
            .directory()
            .register(NewUser {
                utorid: utorid.to_string(),
                name: format!("{utorid} name"),
                role,
                verified: true,
            })
            .expect("register user")
    }

    pub fn token(&self, user: &User) -> String {
        self.state
            .jwt_service
            .issue_token(user.id, &user.utorid, user.role.as_str())
            .expect("issue token")
    }

    /// Credits points through an event award by a throwaway manager.
    pub fn fund(&self, user: &User, amount: i64) {
        let manager = Actor {
            id: user.id,
            utorid: "seeder".to_string(),
            role: Role::Superuser,
            verified: true,
            suspicious: false,
        };
        self.state
            .ledger
            .award_event(
                &manager,
                EventAwardInput {
                    utorid: user.utorid.clone(),
                    amount,
                    event_id: None,
                    remark: String::new(),
                },
            )
            .expect("fund user");
    }

    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method(method)
            .uri(format!("/api/v1{uri}"))
            .header("Content-Type", "application/json");
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = body.map_or_else(Body::empty, |json| Body::from(json.to_string()));

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }
}
