pub mod config;
pub mod rooms;

use axum::{Router, debug_handler, extract::FromRef, routing::get};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use config::Config;
use rooms::Coordinator;

#[derive(Clone, FromRef)]
pub struct AppState {
    pub coordinator: Coordinator,
}

pub fn app(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/", get(hello))
        .merge(rooms::router())
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

#[debug_handler]
async fn hello() -> &'static str {
    "Hello from Video Conference Demo App"
}
