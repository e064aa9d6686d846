use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
};
use tower_http::{
    cors::CorsLayer,
    trace::{self, TraceLayer},
};
use tracing::Level;

use crate::{
    AppState,
    auth::{JwtKeys, auth_middleware},
    routes::{self, challenges, pdfs, records, users},
};

const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

pub struct Server {
    config: healthhub_config::Config,
    port: Option<u16>,
}

impl Server {
    pub fn new(config: healthhub_config::Config, port: Option<u16>) -> Self {
        Self { config, port }
    }

    pub async fn build_router(&self) -> anyhow::Result<Router<()>> {
        let keys = match &self.config.general.jwt_secret {
            Some(secret) if !secret.is_empty() => JwtKeys::new(secret),
            _ => {
                tracing::warn!("jwt_secret_not_configured_using_random_key");
                JwtKeys::random()
            }
        };

        let pdf_dir = self.config.storage.pdf_dir();
        tokio::fs::create_dir_all(&pdf_dir).await?;
        tracing::info!(pdf_dir = %pdf_dir.display(), "storage_ready");

        Ok(router(Arc::new(AppState::new(keys, pdf_dir))))
    }

    /// Serves until `shutdown_signal` resolves and returns the bound port.
    pub async fn run_with_shutdown(
        self,
        shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<u16> {
        let router = self.build_router().await?;

        let port = self.port.unwrap_or(self.config.general.port);
        let listener =
            tokio::net::TcpListener::bind((self.config.general.host.as_str(), port)).await?;

        let addr = listener.local_addr()?;
        tracing::info!(addr = %addr, "server_started");

        let server = axum::serve(listener, router.into_make_service())
            .with_graceful_shutdown(shutdown_signal);

        if let Err(e) = server.await {
            tracing::error!(error = %e, "server_failed");
            return Err(anyhow::anyhow!(e));
        }

        Ok(addr.port())
    }
}

pub fn router(state: Arc<AppState>) -> Router<()> {
    let protected = Router::new()
        .route("/api/records", post(records::create).get(records::list))
        .route(
            "/api/records/{id}",
            get(records::get)
                .put(records::update)
                .delete(records::delete),
        )
        .route(
            "/api/records/upload-pdf",
            post(pdfs::upload).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/api/records/list-pdfs", get(pdfs::list))
        .route("/api/records/download-pdf/{filename}", get(pdfs::download))
        .route("/api/challenges", get(challenges::list))
        .route("/api/challenges/complete", post(challenges::complete))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let public = Router::new()
        .route("/health", get(routes::health))
        .route("/api/register", post(users::register))
        .route("/api/login", post(users::login))
        .route("/api/challenges/leaderboard", get(challenges::leaderboard));

    public
        .merge(protected)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_request(trace::DefaultOnRequest::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO))
                .on_body_chunk(())
                .on_eos(())
                .on_failure(trace::DefaultOnFailure::new().level(Level::ERROR)),
        )
}
