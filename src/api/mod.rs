//! HTTP API.
//!
//! | Method | Path          | Handler                 |
//! |--------|---------------|-------------------------|
//! | GET    | `/health`     | [`health`]              |
//! | GET    | `/tasks`      | [`tasks::list_tasks`]   |
//! | POST   | `/tasks`      | [`tasks::create_task`]  |
//! | GET    | `/tasks/{id}` | [`tasks::get_task`]     |
//! | PUT    | `/tasks/{id}` | [`tasks::update_task`]  |
//! | DELETE | `/tasks/{id}` | [`tasks::delete_task`]  |

mod error;
pub mod tasks;

use axum::{routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::db::Database;

pub use error::{ApiError, ErrorBody};
pub use tasks::DeleteResponse;

/// State shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub fn create_router(db: Database) -> Router {
    // Browser front ends are served from another origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/tasks", get(tasks::list_tasks).post(tasks::create_task))
        .route(
            "/tasks/{id}",
            get(tasks::get_task)
                .put(tasks::update_task)
                .delete(tasks::delete_task),
        )
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(AppState { db })
}

/// Bind to the configured address and serve until Ctrl-C.
pub async fn serve(config: &ServerConfig, db: Database) -> anyhow::Result<()> {
    let app = create_router(db);

    let listener = tokio::net::TcpListener::bind(config.addr()).await?;
    tracing::info!(
        "Taskboard server listening on http://{}",
        listener.local_addr()?
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Taskboard server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
        // Without a signal handler, run until killed
        std::future::pending::<()>().await;
    }
}
