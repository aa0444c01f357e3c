use debtgraph_rs::{GraphDriver, GraphSearch};
use debtgraph_server::{
    config::Config,
    init_tracing,
    routes::{router, AppState},
    store::Store,
};
use tokio::signal;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── Tracing ───────────────────────────────────────────────────────────────
    init_tracing()?;

    info!("debtgraph-server starting");

    // ── Config ────────────────────────────────────────────────────────────────
    let config = Config::from_env().map_err(|e| {
        error!("Configuration error: {}", e);
        e
    })?;

    info!(
        neo4j     = %config.graph.neo4j_uri,
        namespace = %config.graph.group_id,
        addr      = %config.bind_addr,
        "configuration loaded"
    );

    // ── Graph store ───────────────────────────────────────────────────────────
    let store = Store::neo4j(&config.graph).await.map_err(|e| {
        error!("Graph store connection failed: {}", e);
        e
    })?;

    // ── Axum router ───────────────────────────────────────────────────────────
    let state = AppState::new(GraphSearch::new(store).in_namespace(config.graph.group_id.clone()));
    let app = router(state.clone());

    // ── Listen ────────────────────────────────────────────────────────────────
    info!(addr = %config.bind_addr, "listening");
    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if let Err(e) = state.search.driver().close().await {
        error!(error = %e, "failed to close graph store");
    }
    info!("server stopped");
    Ok(())
}

/// Graceful shutdown on SIGTERM or Ctrl-C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => { info!("received Ctrl-C, shutting down"); }
        _ = terminate => { info!("received SIGTERM, shutting down"); }
    }
}
