use crate::config::ShapeConfig;
use crate::handlers;
use crate::services::{ShapeProvider, UploadStaging};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use service_core::error::AppError;
use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: ShapeConfig,
    pub staging: UploadStaging,
    pub provider: Arc<dyn ShapeProvider>,
}

pub struct Application {
    port: u16,
    server: Box<dyn std::future::Future<Output = std::io::Result<()>> + Send + Unpin>,
}

impl Application {
    /// Build the service around an already-constructed provider handle.
    /// The handle is created once at process startup and injected here,
    /// which is also what lets tests substitute a mock.
    pub async fn build(
        config: ShapeConfig,
        provider: Arc<dyn ShapeProvider>,
    ) -> Result<Self, AppError> {
        let staging = UploadStaging::new(&config.uploads.dir).await.map_err(|e| {
            tracing::error!(
                "Failed to initialize upload staging at {}: {}",
                config.uploads.dir,
                e
            );
            e
        })?;

        let state = AppState {
            config: config.clone(),
            staging,
            provider,
        };

        let app = Router::new()
            .route("/health", get(handlers::health_check))
            .route(
                "/generate3d",
                post(handlers::generate_shape).layer(DefaultBodyLimit::disable()),
            )
            .layer(CorsLayer::permissive())
            .layer(TraceLayer::new_for_http())
            .with_state(state);

        let addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("Listening on {}", port);

        let server = axum::serve(listener, app);

        Ok(Self {
            port,
            server: Box::new(server.into_future()),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        self.server.await
    }
}
