//! Axum server wiring.

use std::sync::Arc;
use std::time::Duration;

use axum::error_handling::HandleErrorLayer;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower::timeout::TimeoutLayer;
use tower::{BoxError, ServiceBuilder};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::handlers;
use crate::core::ServerConfig;
use crate::scoring::ScoringService;
use crate::storage::TransactionStore;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared request state: the immutable scoring context plus the store used
/// by the reports listing.
pub struct RiskServer {
    pub service: Arc<ScoringService>,
    pub store: Arc<TransactionStore>,
    pub host: String,
    pub port: u16,
}

impl RiskServer {
    pub fn new(
        service: Arc<ScoringService>,
        store: Arc<TransactionStore>,
        config: &ServerConfig,
    ) -> Self {
        Self {
            service,
            store,
            host: config.host.clone(),
            port: config.port,
        }
    }

    pub fn create_router(self) -> Router {
        let state = Arc::new(self);

        Router::new()
            .route("/", get(handlers::home))
            .route("/health", get(handlers::health_check))
            .route("/score", post(handlers::score_wallet))
            .route("/reports", get(handlers::list_reports))
            .layer(
                ServiceBuilder::new()
                    // Convert middleware errors (timeouts) into HTTP responses
                    .layer(HandleErrorLayer::new(|err: BoxError| async move {
                        if err.is::<tower::timeout::error::Elapsed>() {
                            (StatusCode::REQUEST_TIMEOUT, "request timed out")
                        } else {
                            (StatusCode::INTERNAL_SERVER_ERROR, "internal error")
                        }
                    }))
                    .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
                    .layer(TraceLayer::new_for_http()),
            )
            // Dashboard frontend runs on a different origin
            .layer(CorsLayer::permissive())
            .with_state(state)
    }

    pub async fn start(self) -> anyhow::Result<()> {
        let addr = format!("{}:{}", self.host, self.port);
        let router = self.create_router();

        tracing::info!("server listening on {}", addr);
        let listener = TcpListener::bind(&addr).await?;
        axum::serve(listener, router.into_make_service()).await?;
        Ok(())
    }
}
