use std::sync::Arc;
use supagate_provider::GoTrueClient;
use supagate_server::{
    app,
    auth::{AppState, CookiePolicy},
    config::ServerConfig,
};
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment
    let config = ServerConfig::from_env().expect("failed to load configuration");
    tracing::info!(environment = ?config.environment, "Loaded configuration");

    if config.supabase.service_role_key().is_none() {
        tracing::warn!("No service-role key configured; magic links are disabled");
    }

    let client = GoTrueClient::new(config.supabase).expect("failed to create provider client");

    let cookies = CookiePolicy::from_config(config.environment, &config.cookies);
    let state = AppState::new(Arc::new(client), cookies)
        .with_strip_refresh_token(config.cookies.strip_refresh_token);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("failed to bind to address");

    tracing::info!("listening on http://{}", config.bind_addr);

    axum::serve(listener, app::router(Arc::new(state)))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
