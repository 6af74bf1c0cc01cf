//! HTTP API for scanning and analyzing repositories.

pub mod auth;
mod handlers;

use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::orchestrator::Orchestrator;

use auth::Credentials;

/// Shared application state for HTTP handlers
pub struct AppState {
    pub orchestrator: Orchestrator,
    pub credentials: Credentials,
}

/// Run the HTTP server until Ctrl+C
pub async fn run_server(config: &Config) -> Result<()> {
    let orchestrator = Orchestrator::from_config(config)?;
    tracing::info!("Issue store at {}", orchestrator.store().path().display());

    let state = Arc::new(AppState {
        orchestrator,
        credentials: Credentials::new(config.username.clone(), config.password.clone()),
    });

    let app = handlers::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    tracing::info!("Issue analyzer listening on {}", config.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await?;

    Ok(())
}
