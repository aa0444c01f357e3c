use std::{net::SocketAddr, path::PathBuf, str::FromStr};

use debtgraph_rs::DebtGraphConfig;

/// HTTP server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to bind the HTTP server. Env: `BIND_ADDR`, default `0.0.0.0:8080`.
    pub bind_addr: SocketAddr,
    /// Graph store connection and namespace.
    pub graph: DebtGraphConfig,
}

impl Config {
    /// Load configuration from environment variables, applying defaults.
    ///
    /// # Errors
    /// Returns an error if `BIND_ADDR` is not a valid socket address or the
    /// graph configuration is incomplete.
    pub fn from_env() -> anyhow::Result<Self> {
        let graph = DebtGraphConfig::from_env()?;
        let bind_addr = parse_bind_addr(std::env::var("BIND_ADDR").ok())?;
        Ok(Config { bind_addr, graph })
    }
}

fn parse_bind_addr(raw: Option<String>) -> anyhow::Result<SocketAddr> {
    let raw = raw.unwrap_or_else(|| "0.0.0.0:8080".to_string());
    SocketAddr::from_str(&raw).map_err(|e| anyhow::anyhow!("Invalid BIND_ADDR '{}': {}", raw, e))
}

/// Which ingestion strategy a run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestMode {
    /// Explicit per-record mapping.
    Triplets,
    /// Whole dataset as one episode.
    Episode,
}

impl FromStr for IngestMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "triplets" | "triplet" => Ok(IngestMode::Triplets),
            "episode" | "bulk" => Ok(IngestMode::Episode),
            other => anyhow::bail!("Invalid INGEST_MODE '{}': expected triplets or episode", other),
        }
    }
}

/// Settings of one `debtgraph-ingest` run.
#[derive(Debug, Clone)]
pub struct IngestSettings {
    /// First CLI argument, else `DATASET_PATH`, else `data/interacciones_clientes.json`.
    pub dataset_path: PathBuf,
    /// Env: `INGEST_MODE`, default `triplets`.
    pub mode: IngestMode,
    /// Env: `AUTO_EXTRACT`, default `true`. Only read in episode mode.
    pub auto_extract: bool,
    /// Env: `INGEST_DRY_RUN`, default `false`. Uses the in-memory store.
    pub dry_run: bool,
}

impl IngestSettings {
    /// Resolve settings from CLI arguments (program name excluded) and the environment.
    pub fn from_env_and_args(mut args: impl Iterator<Item = String>) -> anyhow::Result<Self> {
        Self::resolve(args.next(), |name| std::env::var(name).ok())
    }

    fn resolve(
        arg: Option<String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<Self> {
        let dataset_path = arg
            .or_else(|| env("DATASET_PATH"))
            .unwrap_or_else(|| "data/interacciones_clientes.json".to_string());

        let mode = match env("INGEST_MODE") {
            Some(raw) => raw.parse()?,
            None => IngestMode::Triplets,
        };

        Ok(IngestSettings {
            dataset_path: PathBuf::from(dataset_path),
            mode,
            auto_extract: parse_bool("AUTO_EXTRACT", env("AUTO_EXTRACT"), true)?,
            dry_run: parse_bool("INGEST_DRY_RUN", env("INGEST_DRY_RUN"), false)?,
        })
    }
}

fn parse_bool(name: &str, raw: Option<String>, default: bool) -> anyhow::Result<bool> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(default),
        Some(v) if ["1", "true", "yes", "on"].contains(&v.to_ascii_lowercase().as_str()) => Ok(true),
        Some(v) if ["0", "false", "no", "off"].contains(&v.to_ascii_lowercase().as_str()) => Ok(false),
        Some(v) => anyhow::bail!("Invalid {}: '{}' is not a boolean", name, v),
    }
}
