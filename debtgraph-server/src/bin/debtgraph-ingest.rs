//! Loads a dataset file into the graph store and exits.
//!
//! Usage: `debtgraph-ingest [DATASET_PATH]`

use debtgraph_rs::llm_client::OpenAiClient;
use debtgraph_rs::pipeline::EpisodeExtractor;
use debtgraph_rs::{Dataset, DebtGraphConfig, EpisodeLoader, GraphBuilder, GraphDriver};
use debtgraph_server::{
    config::{IngestMode, IngestSettings},
    init_tracing,
    store::Store,
};
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;

    let settings = IngestSettings::from_env_and_args(std::env::args().skip(1)).map_err(|e| {
        error!("Configuration error: {}", e);
        e
    })?;

    let graph = if settings.dry_run {
        DebtGraphConfig::from_env().unwrap_or_else(|e| {
            warn!(error = %e, "graph configuration incomplete, using defaults for dry run");
            DebtGraphConfig::default()
        })
    } else {
        DebtGraphConfig::from_env().map_err(|e| {
            error!("Configuration error: {}", e);
            e
        })?
    };

    info!(
        dataset   = %settings.dataset_path.display(),
        mode      = ?settings.mode,
        namespace = %graph.group_id,
        dry_run   = settings.dry_run,
        "ingestion starting"
    );

    let dataset = Dataset::from_path(&settings.dataset_path).map_err(|e| {
        error!("Dataset error: {}", e);
        e
    })?;

    let store = if settings.dry_run {
        Store::memory()
    } else {
        Store::neo4j(&graph).await.map_err(|e| {
            error!("Graph store connection failed: {}", e);
            e
        })?
    };

    let outcome = run(&settings, &graph, &dataset, store).await;
    if let Err(e) = &outcome {
        error!(error = %e, "ingestion aborted");
    }
    outcome
}

async fn run(
    settings: &IngestSettings,
    graph: &DebtGraphConfig,
    dataset: &Dataset,
    store: Store,
) -> anyhow::Result<()> {
    let backend = store.backend();
    let store = match settings.mode {
        IngestMode::Triplets => {
            let builder = GraphBuilder::new(store, graph.group_id.clone());
            let report = builder.ingest(dataset).await?;
            info!(
                backend,
                customers = report.customers,
                interactions = report.interactions,
                duplicate_customers = report.duplicate_customers,
                skipped_interactions = report.skipped_interactions,
                failed_customers = report.failed_customers,
                failed_interactions = report.failed_interactions,
                nodes = report.nodes,
                edges = report.edges,
                "triplet ingestion finished"
            );
            builder.into_driver()
        }
        IngestMode::Episode => {
            let loader = EpisodeLoader::new(store, graph.group_id.clone());
            let extractor = settings
                .auto_extract
                .then(|| OpenAiClient::from_config(graph))
                .transpose()
                .unwrap_or_else(|e| {
                    warn!(error = %e, "LLM client unavailable, episode will be stored without extraction");
                    None
                });

            let (report, driver) = match extractor {
                Some(llm) => {
                    let loader = loader.with_extractor(EpisodeExtractor::new(llm));
                    (loader.load(dataset, settings.auto_extract).await?, loader.into_driver())
                }
                None => (loader.load(dataset, settings.auto_extract).await?, loader.into_driver()),
            };
            info!(
                backend,
                episode = %report.episode_uuid,
                entities = report.entities,
                relations = report.relations,
                dropped_entities = report.dropped_entities,
                dropped_relations = report.dropped_relations,
                mentions = report.mentions,
                failed_mentions = report.failed_mentions,
                extraction_error = report.extraction_error.as_deref(),
                "episode ingestion finished"
            );
            driver
        }
    };

    store.close().await?;
    Ok(())
}
