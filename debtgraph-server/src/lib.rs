//! HTTP read API and ingestion entry point for the debt-collection graph.

pub mod config;
pub mod routes;
pub mod store;

/// Install the JSON tracing subscriber shared by both binaries.
pub fn init_tracing() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("debtgraph_server=info".parse()?)
                .add_directive("debtgraph_rs=info".parse()?),
        )
        .json()
        .init();
    Ok(())
}
