/// API Routes definition

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::handlers::{self, AppState};

pub fn create_router(state: AppState, enable_cors: bool) -> Router {
    let mut app = Router::new()
        .route(
            "/api/instances",
            get(handlers::get_instances).post(handlers::add_instance),
        )
        .route(
            "/api/instances/:id",
            put(handlers::update_instance).delete(handlers::remove_instance),
        )
        .route("/api/backup/:id/:type", post(handlers::run_backup))
        .route("/api/cleanup/:id", post(handlers::run_cleanup))
        .route("/api/check/:id", post(handlers::run_check))
        .route("/api/info/:id", get(handlers::get_info))
        .route("/api/history/:id", get(handlers::get_history))
        .route("/api/status/:id", get(handlers::get_status))
        .route("/api/logs", get(handlers::get_logs))
        .route(
            "/api/config",
            get(handlers::get_config).put(handlers::put_config),
        )
        .route("/api/health", get(handlers::health_check))
        .with_state(state)
        // Add tracing middleware
        .layer(TraceLayer::new_for_http());

    if enable_cors {
        app = app.layer(CorsLayer::permissive());
    }

    app
}
