//! Stellar API Server
//!
//! Main entry point for the points ledger service.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stellar_api::{AppState, create_router};
use stellar_core::access::Role;
use stellar_core::user::{DirectoryError, NewUser};
use stellar_core::{LedgerSettings, PointsLedger, PromotionCatalog, UserDirectory};
use stellar_shared::config::BootstrapConfig;
use stellar_shared::{AppConfig, JwtConfig, JwtService};

/// Registers the configured superuser unless it already exists.
fn seed_superuser(directory: &UserDirectory, bootstrap: &BootstrapConfig) -> anyhow::Result<()> {
    match directory.register(NewUser {
        utorid: bootstrap.superuser_utorid.clone(),
        name: bootstrap.superuser_name.clone(),
        role: Role::Superuser,
        verified: true,
    }) {
        Ok(user) => {
            info!(user_id = %user.id, utorid = %user.utorid, "Bootstrap superuser seeded");
            Ok(())
        }
        Err(DirectoryError::DuplicateUtorid(_)) => Ok(()),
        Err(e) => Err(anyhow::Error::new(e).context("Failed to seed bootstrap superuser")),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stellar=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;

    // Create JWT service
    let jwt_config = JwtConfig {
        secret: config.jwt.secret.clone(),
        access_token_expires_minutes: i64::try_from(config.jwt.access_token_expiry_secs / 60)
            .unwrap_or(i64::MAX),
    };
    let jwt_service = JwtService::new(jwt_config);

    // Build the ledger
    let directory = Arc::new(UserDirectory::new());
    if let Some(bootstrap) = &config.bootstrap {
        seed_superuser(&directory, bootstrap)?;
    }
    let settings = LedgerSettings {
        base_rate: config.points.base_rate,
    };
    let ledger = PointsLedger::new(settings, directory, Arc::new(PromotionCatalog::new()));
    info!(base_rate = %settings.base_rate, "Ledger ready");

    // Create application state
    let state = AppState {
        ledger: Arc::new(ledger),
        jwt_service: Arc::new(jwt_service),
    };

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
