use anyhow::Context;
use chatrelay::server::build_router;
use chatrelay::util::{init_tracing, AppState};
use chatrelay::RelayConfig;
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_source = init_tracing();
    tracing::info!(
        env_file = env_source.as_deref().unwrap_or("none"),
        "Environment loaded"
    );

    let config = RelayConfig::from_env().context("invalid configuration")?;

    if config.uses_default_api_key() {
        tracing::warn!("RELAY_API_KEY not set; accepting the built-in default bearer secret");
    }
    tracing::info!(
        provider = %config.provider_base_url,
        model = %config.provider_model,
        "Provider configured"
    );

    let state = Arc::new(AppState::from_config(&config));
    let app = build_router(state, &config.cors);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!("Chatrelay listening on http://{}", config.bind_addr);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Chatrelay stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}
