//! Neo4j graph driver implementation.
//!
//! Uses `neo4rs` 0.8 for async, pooled Bolt connections. Storage layout:
//! - every entity is an `:Entity` node with its domain labels added on top
//!   (`:Entity:CLIENTE`), keyed by `uuid`
//! - facts are `[:RELATES_TO]` relationships carrying the label in `name`
//! - bulk documents are `:Episodic` nodes linked to inferred entities by `[:MENTIONS]`
//!
//! Node attributes are written twice: as top-level properties (so Cypher can
//! filter on them) and as a JSON string in `attributes_json` (so the read
//! path gets them back losslessly, nulls included).

mod cypher;

use std::collections::HashMap;
use std::sync::RwLock;

use neo4rs::{query, BoltType, Graph, Query};
use tracing::{debug, info, warn};
use uuid::Uuid;

use self::cypher::{edge_search, node_merge, node_search};
use super::{EdgeQuery, GraphDriver, NodeQuery};
use crate::edges::{EntityEdge, EpisodicEdge};
use crate::errors::{DebtGraphError, Result};
use crate::nodes::{Attributes, EntityNode};
use crate::pipeline::episode::EpisodeSubmission;
use crate::types::DebtGraphConfig;
use crate::utils::{format_neo4j_datetime, parse_flexible_datetime};

/// Properties managed by the driver; attributes with these keys are only
/// kept in `attributes_json`.
const RESERVED_PROPERTIES: &[&str] = &[
    "uuid",
    "name",
    "group_id",
    "labels",
    "created_at",
    "attributes_json",
];

const SCHEMA: &[&str] = &[
    "CREATE CONSTRAINT entity_uuid IF NOT EXISTS FOR (n:Entity) REQUIRE n.uuid IS UNIQUE",
    "CREATE CONSTRAINT episodic_uuid IF NOT EXISTS FOR (e:Episodic) REQUIRE e.uuid IS UNIQUE",
    "CREATE INDEX entity_group_id IF NOT EXISTS FOR (n:Entity) ON (n.group_id)",
    "CREATE INDEX entity_name IF NOT EXISTS FOR (n:Entity) ON (n.name)",
    "CREATE INDEX relates_to_name IF NOT EXISTS FOR ()-[e:RELATES_TO]-() ON (e.name)",
];

/// Neo4j-backed [`GraphDriver`].
pub struct Neo4jDriver {
    graph: RwLock<Option<Graph>>,
}

impl Neo4jDriver {
    /// Connect and make sure constraints and indexes exist.
    pub async fn connect(uri: &str, user: &str, password: &str) -> Result<Self> {
        let graph = Graph::new(uri, user, password)
            .await
            .map_err(|e| DebtGraphError::Connection(format!("{uri}: {e}")))?;

        let driver = Self {
            graph: RwLock::new(Some(graph)),
        };
        driver.ping().await?;
        driver.init_schema().await?;

        info!(uri, "connected to neo4j");
        Ok(driver)
    }

    pub async fn from_config(config: &DebtGraphConfig) -> Result<Self> {
        Self::connect(&config.neo4j_uri, &config.neo4j_user, &config.neo4j_password).await
    }

    fn graph(&self) -> Result<Graph> {
        self.graph
            .read()
            .map_err(|_| DebtGraphError::NotInitialized)?
            .clone()
            .ok_or(DebtGraphError::NotInitialized)
    }

    async fn init_schema(&self) -> Result<()> {
        let graph = self.graph()?;
        for statement in SCHEMA {
            if let Err(e) = graph.run(query(statement)).await {
                warn!(statement, error = %e, "schema statement failed");
            }
        }
        Ok(())
    }
}

impl GraphDriver for Neo4jDriver {
    async fn ping(&self) -> Result<()> {
        self.graph()?
            .run(query("RETURN 1"))
            .await
            .map_err(|e| DebtGraphError::Connection(e.to_string()))
    }

    async fn close(&self) -> Result<()> {
        let mut slot = self
            .graph
            .write()
            .map_err(|_| DebtGraphError::NotInitialized)?;
        *slot = None;
        Ok(())
    }

    async fn add_triplet(
        &self,
        source: &EntityNode,
        edge: &EntityEdge,
        target: &EntityNode,
    ) -> Result<()> {
        let cypher = format!(
            r#"
            {source}
            {target}
            MERGE (s)-[e:RELATES_TO {{uuid: $e_uuid}}]->(t)
            SET e.name = $e_name, e.fact = $e_fact, e.group_id = $e_group_id,
                e.created_at = datetime($e_created_at)
            "#,
            source = node_merge("s", &source.labels),
            target = node_merge("t", &target.labels),
        );

        let q = bind_node(query(&cypher), "s", source)?;
        let q = bind_node(q, "t", target)?
            .param("e_uuid", edge.uuid.to_string())
            .param("e_name", edge.name.clone())
            .param("e_fact", edge.fact.clone())
            .param("e_group_id", edge.group_id.clone())
            .param("e_created_at", format_neo4j_datetime(&edge.created_at));

        self.graph()?.run(q).await?;
        debug!(edge = %edge.name, source = %source.name, target = %target.name, "triplet merged");
        Ok(())
    }

    async fn add_node(&self, node: &EntityNode) -> Result<()> {
        let q = bind_node(query(&node_merge("n", &node.labels)), "n", node)?;
        self.graph()?.run(q).await?;
        debug!(node = %node.name, "node merged");
        Ok(())
    }

    async fn add_episode(&self, submission: &EpisodeSubmission) -> Result<()> {
        let episode = &submission.episode;
        let q = query(
            r#"
            MERGE (ep:Episodic {uuid: $uuid})
            SET ep.name = $name, ep.group_id = $group_id, ep.source = $source,
                ep.source_description = $source_description, ep.content = $content,
                ep.entity_types = $entity_types, ep.edge_types = $edge_types,
                ep.edge_type_map = $edge_type_map, ep.auto_extract = $auto_extract,
                ep.created_at = datetime($created_at), ep.valid_at = datetime($valid_at)
            "#,
        )
        .param("uuid", episode.uuid.to_string())
        .param("name", episode.name.clone())
        .param("group_id", episode.group_id.clone())
        .param("source", episode.source.as_str())
        .param("source_description", episode.source_description.clone())
        .param("content", episode.content.clone())
        .param("entity_types", serde_json::to_string(&submission.entity_types)?)
        .param("edge_types", serde_json::to_string(&submission.edge_types)?)
        .param("edge_type_map", serde_json::to_string(&submission.edge_type_map)?)
        .param("auto_extract", submission.auto_extract)
        .param("created_at", format_neo4j_datetime(&episode.created_at))
        .param("valid_at", format_neo4j_datetime(&episode.valid_at));

        self.graph()?.run(q).await?;
        debug!(episode = %episode.uuid, "episode merged");
        Ok(())
    }

    async fn add_mention(&self, edge: &EpisodicEdge) -> Result<()> {
        let q = query(
            r#"
            MATCH (ep:Episodic {uuid: $episode_uuid})
            MATCH (n:Entity {uuid: $entity_uuid})
            MERGE (ep)-[m:MENTIONS {uuid: $uuid}]->(n)
            SET m.group_id = $group_id, m.created_at = datetime($created_at)
            "#,
        )
        .param("episode_uuid", edge.source_node_uuid.to_string())
        .param("entity_uuid", edge.target_node_uuid.to_string())
        .param("uuid", edge.uuid.to_string())
        .param("group_id", edge.group_id.clone())
        .param("created_at", format_neo4j_datetime(&edge.created_at));

        self.graph()?.run(q).await?;
        Ok(())
    }

    async fn search_edges(&self, edge_query: &EdgeQuery) -> Result<Vec<EntityEdge>> {
        let mut stream = self
            .graph()?
            .execute(edge_search(edge_query))
            .await
            .map_err(|e| search_error("edge search", e))?;
        let mut edges = Vec::new();
        while let Some(row) = stream.next().await? {
            edges.push(EntityEdge {
                uuid: parse_uuid(&row.get::<String>("uuid")?)?,
                source_node_uuid: parse_uuid(&row.get::<String>("source_uuid")?)?,
                target_node_uuid: parse_uuid(&row.get::<String>("target_uuid")?)?,
                name: row.get("name")?,
                fact: row.get("fact")?,
                group_id: row.get("group_id")?,
                created_at: parse_timestamp(&row.get::<String>("created_at")?)?,
            });
        }
        Ok(edges)
    }

    async fn search_nodes(&self, node_query: &NodeQuery) -> Result<Vec<EntityNode>> {
        let mut stream = self
            .graph()?
            .execute(node_search(node_query))
            .await
            .map_err(|e| search_error("node search", e))?;
        let mut nodes = Vec::new();
        while let Some(row) = stream.next().await? {
            let attributes_json: Option<String> = row.get("attributes_json")?;
            let attributes: Attributes = match attributes_json {
                Some(raw) => serde_json::from_str(&raw)?,
                None => Attributes::new(),
            };
            nodes.push(EntityNode {
                uuid: parse_uuid(&row.get::<String>("uuid")?)?,
                name: row.get("name")?,
                group_id: row.get("group_id")?,
                labels: row.get("labels")?,
                attributes,
                created_at: parse_timestamp(&row.get::<String>("created_at")?)?,
            });
        }
        Ok(nodes)
    }
}

/// Connectivity failures keep their fatal classification; anything else is a query error.
fn search_error(context: &str, err: neo4rs::Error) -> DebtGraphError {
    match DebtGraphError::from(err) {
        DebtGraphError::Driver(message) => DebtGraphError::Query(format!("{context}: {message}")),
        fatal => fatal,
    }
}

/// Bind the `{prefix}_*` parameters of one node.
fn bind_node(q: Query, prefix: &str, node: &EntityNode) -> Result<Query> {
    Ok(q
        .param(&format!("{prefix}_uuid"), node.uuid.to_string())
        .param(&format!("{prefix}_name"), node.name.clone())
        .param(&format!("{prefix}_group_id"), node.group_id.clone())
        .param(&format!("{prefix}_labels"), node.labels.clone())
        .param(
            &format!("{prefix}_attributes_json"),
            serde_json::to_string(&node.attributes)?,
        )
        .param(&format!("{prefix}_created_at"), format_neo4j_datetime(&node.created_at))
        .param(&format!("{prefix}_props"), scalar_properties(&node.attributes)))
}

/// Non-null scalar attributes as a Bolt map. Nested values are skipped; they
/// survive in `attributes_json`.
fn scalar_properties(attributes: &Attributes) -> HashMap<String, BoltType> {
    attributes
        .iter()
        .filter(|(key, _)| !RESERVED_PROPERTIES.contains(&key.as_str()))
        .filter_map(|(key, value)| {
            let bolt = match value {
                serde_json::Value::Bool(b) => BoltType::from(*b),
                serde_json::Value::Number(n) => match n.as_i64() {
                    Some(i) => BoltType::from(i),
                    None => BoltType::from(n.as_f64()?),
                },
                serde_json::Value::String(s) => BoltType::from(s.clone()),
                _ => return None,
            };
            Some((key.clone(), bolt))
        })
        .collect()
}

fn parse_uuid(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|e| DebtGraphError::Driver(format!("bad uuid '{raw}': {e}")))
}

fn parse_timestamp(raw: &str) -> Result<chrono::DateTime<chrono::Utc>> {
    parse_flexible_datetime(raw)
        .ok_or_else(|| DebtGraphError::Driver(format!("bad timestamp '{raw}'")))
}
