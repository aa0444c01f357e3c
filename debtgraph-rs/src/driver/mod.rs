//! Graph store abstraction.
//!
//! Defines the [`GraphDriver`] trait the ingestion pipeline and the query
//! facade talk to, plus two backends:
//! - [`neo4j::Neo4jDriver`] — Bolt connection to Neo4j via `neo4rs`
//! - [`memory::MemoryDriver`] — in-process store for tests, benches and dry runs
//!
//! Drivers own durability and idempotency. Callers never retry.

pub mod memory;
pub mod neo4j;
pub mod query;

pub use memory::MemoryDriver;
pub use neo4j::Neo4jDriver;
pub use query::{EdgeQuery, NodeQuery};

use crate::edges::{EntityEdge, EpisodicEdge};
use crate::errors::Result;
use crate::nodes::EntityNode;
use crate::pipeline::episode::EpisodeSubmission;

/// Trait representing a graph database backend.
#[allow(async_fn_in_trait)]
pub trait GraphDriver: Send + Sync {
    /// Health check. An error here means the store is unusable and any
    /// ingestion run must abort.
    async fn ping(&self) -> Result<()>;

    /// Release the connection. Later calls fail with
    /// [`DebtGraphError::NotInitialized`](crate::DebtGraphError::NotInitialized).
    async fn close(&self) -> Result<()>;

    /// Persist one node-edge-node unit.
    async fn add_triplet(
        &self,
        source: &EntityNode,
        edge: &EntityEdge,
        target: &EntityNode,
    ) -> Result<()>;

    /// Persist a node on its own, upserting by uuid.
    async fn add_node(&self, node: &EntityNode) -> Result<()>;

    /// Persist one opaque bulk episode together with its type hints.
    async fn add_episode(&self, submission: &EpisodeSubmission) -> Result<()>;

    /// Link a stored episode to an entity inferred from it.
    async fn add_mention(&self, edge: &EpisodicEdge) -> Result<()>;

    /// Edges matching `query`, ordered by creation time then uuid.
    async fn search_edges(&self, query: &EdgeQuery) -> Result<Vec<EntityEdge>>;

    /// Nodes matching `query`, ordered by creation time then uuid.
    async fn search_nodes(&self, query: &NodeQuery) -> Result<Vec<EntityNode>>;
}
