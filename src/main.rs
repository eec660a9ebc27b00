use chat_relay::{app_state_from_env, build_app, run_server, server_port_from_env};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let state = app_state_from_env();
    let app = build_app(state);
    let port = server_port_from_env();

    tracing::info!(port, "starting chat relay");
    run_server(app, port).await;
}
