pub mod api;
pub mod config;
pub mod ui;
pub mod upstream;

use std::sync::Arc;

use axum::Router;

use crate::config::RelayConfig;

pub use crate::config::server_port_from_env;

pub struct AppState {
    pub config: RelayConfig,
    pub http: reqwest::Client,
}

pub fn app_state_from_env() -> Arc<AppState> {
    Arc::new(AppState {
        config: RelayConfig::from_env(),
        http: reqwest::Client::new(),
    })
}

pub fn build_app(state: Arc<AppState>) -> Router {
    api::router(state)
}

pub async fn run_server(app: Router, port: u16) {
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .expect("bind failed");

    axum::serve(listener, app).await.expect("server failed");
}
