use repro_platform_access::{InMemoryUserDirectory, OriginAllowlist, ProviderRegistry};
use repro_server::{
    app::{AppState, router},
    auth::{FlowController, GithubProvider, SessionStore},
    config::{LogFormat, ServerConfig},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load configuration from environment
    let config = ServerConfig::from_env().expect("failed to load configuration");

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| "info,tower_http=debug".into());
    match config.log_format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init(),
    }
    tracing::info!("Loaded configuration");

    if config.session_secret().is_none() {
        tracing::warn!("SESSION_SECRET is not set; using an insecure development secret");
    }

    let mut providers = ProviderRegistry::new();
    match config.github() {
        Some(github) => {
            let provider =
                GithubProvider::new(&github).expect("invalid GitHub OAuth configuration");
            providers = providers.with_provider(Arc::new(provider));
            tracing::info!(callback_url = %github.callback_url, "GitHub login enabled");
        }
        None => tracing::warn!("GitHub OAuth is not configured; login is disabled"),
    }

    let frontend_url = config.frontend_url();
    let sessions = SessionStore::new(
        config.session_secret_or_dev_default(),
        config.session_name(),
        config.secure_cookies(),
    );
    let flow = FlowController::new(
        providers,
        Arc::new(InMemoryUserDirectory::new()),
        sessions,
        frontend_url.clone(),
    );
    let origins = OriginAllowlist::from_origins(config.cors_origins(), &frontend_url);
    let app = router(AppState::new(flow, origins));

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind to address");

    tracing::info!("listening on http://{}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("server error");

    tracing::info!("server stopped");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
