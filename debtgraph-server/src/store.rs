//! Graph backend selected at startup.
//!
//! Handlers need a concrete driver type so their futures are known to be
//! `Send`; this enum gives both binaries one such type over either backend.

use debtgraph_rs::driver::{EdgeQuery, NodeQuery};
use debtgraph_rs::edges::{EntityEdge, EpisodicEdge};
use debtgraph_rs::nodes::EntityNode;
use debtgraph_rs::pipeline::EpisodeSubmission;
use debtgraph_rs::{DebtGraphConfig, GraphDriver, MemoryDriver, Neo4jDriver, Result};

pub enum Store {
    Neo4j(Neo4jDriver),
    Memory(MemoryDriver),
}

impl Store {
    pub async fn neo4j(config: &DebtGraphConfig) -> Result<Self> {
        Ok(Store::Neo4j(Neo4jDriver::from_config(config).await?))
    }

    pub fn memory() -> Self {
        Store::Memory(MemoryDriver::new())
    }

    pub fn backend(&self) -> &'static str {
        match self {
            Store::Neo4j(_) => "neo4j",
            Store::Memory(_) => "memory",
        }
    }
}

impl From<MemoryDriver> for Store {
    fn from(driver: MemoryDriver) -> Self {
        Store::Memory(driver)
    }
}

impl GraphDriver for Store {
    async fn ping(&self) -> Result<()> {
        match self {
            Store::Neo4j(d) => d.ping().await,
            Store::Memory(d) => d.ping().await,
        }
    }

    async fn close(&self) -> Result<()> {
        match self {
            Store::Neo4j(d) => d.close().await,
            Store::Memory(d) => d.close().await,
        }
    }

    async fn add_triplet(
        &self,
        source: &EntityNode,
        edge: &EntityEdge,
        target: &EntityNode,
    ) -> Result<()> {
        match self {
            Store::Neo4j(d) => d.add_triplet(source, edge, target).await,
            Store::Memory(d) => d.add_triplet(source, edge, target).await,
        }
    }

    async fn add_node(&self, node: &EntityNode) -> Result<()> {
        match self {
            Store::Neo4j(d) => d.add_node(node).await,
            Store::Memory(d) => d.add_node(node).await,
        }
    }

    async fn add_episode(&self, submission: &EpisodeSubmission) -> Result<()> {
        match self {
            Store::Neo4j(d) => d.add_episode(submission).await,
            Store::Memory(d) => d.add_episode(submission).await,
        }
    }

    async fn add_mention(&self, edge: &EpisodicEdge) -> Result<()> {
        match self {
            Store::Neo4j(d) => d.add_mention(edge).await,
            Store::Memory(d) => d.add_mention(edge).await,
        }
    }

    async fn search_edges(&self, query: &EdgeQuery) -> Result<Vec<EntityEdge>> {
        match self {
            Store::Neo4j(d) => d.search_edges(query).await,
            Store::Memory(d) => d.search_edges(query).await,
        }
    }

    async fn search_nodes(&self, query: &NodeQuery) -> Result<Vec<EntityNode>> {
        match self {
            Store::Neo4j(d) => d.search_nodes(query).await,
            Store::Memory(d) => d.search_nodes(query).await,
        }
    }
}
