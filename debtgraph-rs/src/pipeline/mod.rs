//! Ingestion pipeline.
//!
//! Two mutually exclusive strategies, chosen by the caller per run:
//! - [`builder::GraphBuilder`] — explicit, auditable per-record mapping into triplets
//! - [`episode::EpisodeLoader`] — the whole dataset as one episode with optional LLM inference

pub mod builder;
pub mod episode;

pub use builder::{GraphBuilder, IngestionReport, RunCaches};
pub use episode::{
    EdgeTypeRule, EpisodeExtractor, EpisodeLoader, EpisodeReport, EpisodeSubmission,
    ExtractedGraph,
};
