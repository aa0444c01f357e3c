//! In-memory graph store.
//!
//! Keeps nodes, edges, episodes and mentions in `tokio::sync::RwLock`
//! collections and evaluates [`EdgeQuery`]/[`NodeQuery`] with the same
//! semantics as the Neo4j backend. Nodes are upserted by uuid, like a
//! Cypher `MERGE`.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::{EdgeQuery, GraphDriver, NodeQuery};
use crate::edges::{EntityEdge, EpisodicEdge};
use crate::errors::{DebtGraphError, Result};
use crate::nodes::EntityNode;
use crate::pipeline::episode::EpisodeSubmission;

#[derive(Default)]
pub struct MemoryDriver {
    nodes: RwLock<HashMap<Uuid, EntityNode>>,
    edges: RwLock<Vec<EntityEdge>>,
    episodes: RwLock<Vec<EpisodeSubmission>>,
    mentions: RwLock<Vec<EpisodicEdge>>,
    triplet_calls: AtomicUsize,
    closed: AtomicBool,
}

impl MemoryDriver {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(DebtGraphError::NotInitialized);
        }
        Ok(())
    }

    /// All stored nodes, oldest first.
    pub async fn nodes(&self) -> Vec<EntityNode> {
        let mut nodes: Vec<EntityNode> = self.nodes.read().await.values().cloned().collect();
        nodes.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.uuid.cmp(&b.uuid)));
        nodes
    }

    /// All stored edges in submission order.
    pub async fn edges(&self) -> Vec<EntityEdge> {
        self.edges.read().await.clone()
    }

    pub async fn episodes(&self) -> Vec<EpisodeSubmission> {
        self.episodes.read().await.clone()
    }

    pub async fn mentions(&self) -> Vec<EpisodicEdge> {
        self.mentions.read().await.clone()
    }

    /// Number of `add_triplet` calls accepted so far.
    pub fn triplet_calls(&self) -> usize {
        self.triplet_calls.load(Ordering::SeqCst)
    }
}

impl GraphDriver for MemoryDriver {
    async fn ping(&self) -> Result<()> {
        self.ensure_open()
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn add_triplet(
        &self,
        source: &EntityNode,
        edge: &EntityEdge,
        target: &EntityNode,
    ) -> Result<()> {
        self.ensure_open()?;
        if edge.source_node_uuid != source.uuid || edge.target_node_uuid != target.uuid {
            return Err(DebtGraphError::Validation(format!(
                "edge {} does not connect {} -> {}",
                edge.uuid, source.uuid, target.uuid
            )));
        }

        {
            let mut nodes = self.nodes.write().await;
            nodes.insert(source.uuid, source.clone());
            nodes.insert(target.uuid, target.clone());
        }
        self.edges.write().await.push(edge.clone());
        self.triplet_calls.fetch_add(1, Ordering::SeqCst);

        debug!(edge = %edge.name, source = %source.name, target = %target.name, "triplet stored");
        Ok(())
    }

    async fn add_node(&self, node: &EntityNode) -> Result<()> {
        self.ensure_open()?;
        self.nodes.write().await.insert(node.uuid, node.clone());
        Ok(())
    }

    async fn add_episode(&self, submission: &EpisodeSubmission) -> Result<()> {
        self.ensure_open()?;
        self.episodes.write().await.push(submission.clone());
        Ok(())
    }

    async fn add_mention(&self, edge: &EpisodicEdge) -> Result<()> {
        self.ensure_open()?;
        let known_episode = self
            .episodes
            .read()
            .await
            .iter()
            .any(|s| s.episode.uuid == edge.source_node_uuid);
        if !known_episode {
            return Err(DebtGraphError::NodeNotFound(edge.source_node_uuid.to_string()));
        }
        if !self.nodes.read().await.contains_key(&edge.target_node_uuid) {
            return Err(DebtGraphError::NodeNotFound(edge.target_node_uuid.to_string()));
        }
        self.mentions.write().await.push(edge.clone());
        Ok(())
    }

    async fn search_edges(&self, query: &EdgeQuery) -> Result<Vec<EntityEdge>> {
        self.ensure_open()?;
        let nodes = self.nodes.read().await;
        let mut matched: Vec<EntityEdge> = self
            .edges
            .read()
            .await
            .iter()
            .filter(|edge| {
                match (
                    nodes.get(&edge.source_node_uuid),
                    nodes.get(&edge.target_node_uuid),
                ) {
                    (Some(source), Some(target)) => query.matches(edge, source, target),
                    _ => false,
                }
            })
            .cloned()
            .collect();

        matched.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.uuid.cmp(&b.uuid)));
        if let Some(limit) = query.limit {
            matched.truncate(limit);
        }
        Ok(matched)
    }

    async fn search_nodes(&self, query: &NodeQuery) -> Result<Vec<EntityNode>> {
        self.ensure_open()?;
        let mut matched: Vec<EntityNode> = self
            .nodes()
            .await
            .into_iter()
            .filter(|node| query.matches(node))
            .collect();
        if let Some(limit) = query.limit {
            matched.truncate(limit);
        }
        Ok(matched)
    }
}
