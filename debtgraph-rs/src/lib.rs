//! # debtgraph-rs
//!
//! Projects debt-collection interaction datasets (customers, agents, calls,
//! promises, payments, renegotiated plans) into a labelled property graph.
//!
//! ## Architecture
//!
//! - **Record model** ([`records`]): typed view of the input JSON document
//! - **Graph builder** ([`pipeline::GraphBuilder`]): explicit per-record mapping into
//!   node-edge-node triplets with in-run identity caches
//! - **Episode mode** ([`pipeline::EpisodeLoader`]): the whole dataset as one episode,
//!   optionally expanded by LLM extraction
//! - **Graph drivers** ([`driver`]): Neo4j and in-memory backends
//! - **Query facade** ([`search::GraphSearch`]): fact rendering and read-side projections

pub mod edges;
pub mod errors;
pub mod nodes;
pub mod records;
pub mod types;

pub mod driver;
pub mod llm_client;

pub mod prompts;
pub mod search;

pub mod pipeline;
pub mod utils;

pub use driver::{GraphDriver, MemoryDriver, Neo4jDriver};
pub use errors::{DebtGraphError, LlmError, Result};
pub use pipeline::{EpisodeLoader, GraphBuilder, IngestionReport};
pub use records::Dataset;
pub use search::GraphSearch;
pub use types::{DebtGraphConfig, DEFAULT_NAMESPACE};
