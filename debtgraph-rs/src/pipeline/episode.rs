//! Bulk episode mode.
//!
//! Serializes the whole [`Dataset`] into one [`EpisodicNode`] and submits it
//! with entity/edge type hints. When auto-extraction is requested and an
//! [`EpisodeExtractor`] is configured, an LLM infers entities and relations
//! from the document; those are persisted as triplets and linked back to the
//! episode with MENTIONS edges.

use std::collections::{BTreeMap, HashMap};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::driver::GraphDriver;
use crate::edges::{EntityEdge, EpisodicEdge};
use crate::errors::Result;
use crate::llm_client::{LlmClient, OpenAiClient};
use crate::nodes::{EntityNode, EpisodicNode};
use crate::prompts;
use crate::records::hints::{
    Agent, InteractedWith, PaymentMade, PaymentPromise, PlanRenegotiated, PromiseBroken,
};
use crate::records::{Customer, Dataset, Interaction, RenegotiatedPlan};
use crate::utils::{cypher_label, normalize_whitespace};

pub const EPISODE_NAME: &str = "Dataset completo";
pub const EPISODE_SOURCE_DESCRIPTION: &str = "Full load of customers, interactions and metadata";

/// Allowed relation types between two entity types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeTypeRule {
    pub source: String,
    pub target: String,
    pub edge_types: Vec<String>,
}

impl EdgeTypeRule {
    fn new(source: &str, target: &str, edge_types: &[&str]) -> Self {
        Self {
            source: source.to_string(),
            target: target.to_string(),
            edge_types: edge_types.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// One bulk unit handed to [`GraphDriver::add_episode`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodeSubmission {
    pub episode: EpisodicNode,
    /// Entity type name → JSON schema.
    pub entity_types: BTreeMap<String, Value>,
    /// Relation type name → JSON schema.
    pub edge_types: BTreeMap<String, Value>,
    pub edge_type_map: Vec<EdgeTypeRule>,
    pub auto_extract: bool,
}

fn schema_of<T: JsonSchema>() -> Result<Value> {
    Ok(serde_json::to_value(schemars::schema_for!(T))?)
}

impl EpisodeSubmission {
    /// Build the submission for a whole dataset.
    pub fn from_dataset(dataset: &Dataset, namespace: &str, auto_extract: bool) -> Result<Self> {
        let content = serde_json::to_string(dataset)?;
        let episode = EpisodicNode::json(EPISODE_NAME, namespace, EPISODE_SOURCE_DESCRIPTION, content);

        let entity_types = BTreeMap::from([
            ("Cliente".to_string(), schema_of::<Customer>()?),
            ("Interaccion".to_string(), schema_of::<Interaction>()?),
            ("Agente".to_string(), schema_of::<Agent>()?),
            ("NuevoPlanPago".to_string(), schema_of::<RenegotiatedPlan>()?),
            ("PromesaPago".to_string(), schema_of::<PaymentPromise>()?),
        ]);

        let edge_types = BTreeMap::from([
            ("InteractuoCon".to_string(), schema_of::<InteractedWith>()?),
            ("PromesaPago".to_string(), schema_of::<PaymentPromise>()?),
            ("RealizoPago".to_string(), schema_of::<PaymentMade>()?),
            ("RenegocioPlan".to_string(), schema_of::<PlanRenegotiated>()?),
            ("IncumplioPromesa".to_string(), schema_of::<PromiseBroken>()?),
        ]);

        let edge_type_map = vec![
            EdgeTypeRule::new("Agente", "Cliente", &["InteractuoCon"]),
            EdgeTypeRule::new("Cliente", "PromesaPago", &["PromesaPago"]),
            EdgeTypeRule::new("Cliente", "Pago", &["RealizoPago"]),
            EdgeTypeRule::new("Cliente", "Deuda", &["RenegocioPlan"]),
            EdgeTypeRule::new("PromesaPago", "Pago", &["IncumplioPromesa"]),
        ];

        Ok(Self {
            episode,
            entity_types,
            edge_types,
            edge_type_map,
            auto_extract,
        })
    }

    /// Whether `entity_type` is hinted or referenced by the edge type map.
    pub fn knows_entity_type(&self, entity_type: &str) -> bool {
        self.entity_types.contains_key(entity_type)
            || self
                .edge_type_map
                .iter()
                .any(|r| r.source == entity_type || r.target == entity_type)
    }

    /// Whether the edge type map allows `edge_type` from `source` to `target`.
    pub fn allows(&self, source: &str, target: &str, edge_type: &str) -> bool {
        self.edge_type_map.iter().any(|r| {
            r.source == source && r.target == target && r.edge_types.iter().any(|t| t == edge_type)
        })
    }
}

// ── Extraction ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ExtractedEntity {
    pub name: String,
    pub entity_type: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ExtractedRelation {
    pub source: String,
    pub target: String,
    pub relation_type: String,
    pub fact: String,
}

/// Structured output requested from the model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ExtractedGraph {
    #[serde(default)]
    pub entities: Vec<ExtractedEntity>,
    #[serde(default)]
    pub relations: Vec<ExtractedRelation>,
}

/// Infers entities and relations from an episode with an LLM.
pub struct EpisodeExtractor<L> {
    llm: L,
}

impl<L: LlmClient> EpisodeExtractor<L> {
    pub fn new(llm: L) -> Self {
        Self { llm }
    }

    pub async fn extract(&self, submission: &EpisodeSubmission) -> Result<ExtractedGraph> {
        let messages = prompts::extract_episode::messages(submission)?;
        self.llm.generate_structured::<ExtractedGraph>(&messages).await
    }
}

// ── Loader ────────────────────────────────────────────────────────────────────

/// Summary of one episode-mode run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EpisodeReport {
    pub namespace: String,
    pub episode_uuid: uuid::Uuid,
    pub entities: usize,
    pub relations: usize,
    pub dropped_entities: usize,
    pub dropped_relations: usize,
    pub mentions: usize,
    /// Mentions the store rejected; the mentioned entities are kept.
    pub failed_mentions: usize,
    /// Set when extraction was requested but failed; the episode itself is stored.
    pub extraction_error: Option<String>,
}

/// Submits a dataset as a single episode.
pub struct EpisodeLoader<D, L = OpenAiClient> {
    driver: D,
    namespace: String,
    extractor: Option<EpisodeExtractor<L>>,
}

impl<D: GraphDriver> EpisodeLoader<D> {
    pub fn new(driver: D, namespace: impl Into<String>) -> Self {
        Self {
            driver,
            namespace: namespace.into(),
            extractor: None,
        }
    }
}

impl<D: GraphDriver, L: LlmClient> EpisodeLoader<D, L> {
    pub fn with_extractor<M: LlmClient>(self, extractor: EpisodeExtractor<M>) -> EpisodeLoader<D, M> {
        EpisodeLoader {
            driver: self.driver,
            namespace: self.namespace,
            extractor: Some(extractor),
        }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn into_driver(self) -> D {
        self.driver
    }

    /// Store `dataset` as one episode, optionally running auto-extraction.
    ///
    /// Connectivity failures abort. An extraction failure is logged and
    /// reported; the stored episode is kept.
    pub async fn load(&self, dataset: &Dataset, auto_extract: bool) -> Result<EpisodeReport> {
        self.driver.ping().await.inspect_err(|e| {
            error!(error = %e, "graph store unavailable, aborting episode load");
        })?;

        let submission = EpisodeSubmission::from_dataset(dataset, &self.namespace, auto_extract)?;
        self.driver.add_episode(&submission).await?;
        info!(
            episode = %submission.episode.uuid,
            namespace = %self.namespace,
            bytes = submission.episode.content.len(),
            "episode stored"
        );

        let mut report = EpisodeReport {
            namespace: self.namespace.clone(),
            episode_uuid: submission.episode.uuid,
            entities: 0,
            relations: 0,
            dropped_entities: 0,
            dropped_relations: 0,
            mentions: 0,
            failed_mentions: 0,
            extraction_error: None,
        };

        if !auto_extract {
            return Ok(report);
        }
        let Some(extractor) = &self.extractor else {
            warn!("auto-extraction requested but no extractor is configured; episode stored as-is");
            return Ok(report);
        };

        match extractor.extract(&submission).await {
            Ok(graph) => self.materialize(&submission, graph, &mut report).await?,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                error!(episode = %submission.episode.uuid, error = %e, "episode extraction failed");
                report.extraction_error = Some(e.to_string());
            }
        }

        info!(
            entities = report.entities,
            relations = report.relations,
            dropped_entities = report.dropped_entities,
            dropped_relations = report.dropped_relations,
            "episode extraction applied"
        );
        Ok(report)
    }

    async fn materialize(
        &self,
        submission: &EpisodeSubmission,
        graph: ExtractedGraph,
        report: &mut EpisodeReport,
    ) -> Result<()> {
        // One node per distinct name within an episode.
        let mut by_name: HashMap<String, EntityNode> = HashMap::new();
        let mut order: Vec<String> = Vec::new();

        for entity in graph.entities {
            let name = normalize_whitespace(&entity.name);
            let known = submission.knows_entity_type(&entity.entity_type)
                && cypher_label(&entity.entity_type).is_some();
            if name.is_empty() || !known {
                warn!(name = %entity.name, entity_type = %entity.entity_type, "dropping extracted entity");
                report.dropped_entities += 1;
                continue;
            }
            if by_name.contains_key(&name) {
                continue;
            }

            let mut node = EntityNode::new(entity.entity_type.as_str(), name.as_str(), self.namespace.as_str());
            node.attributes.extend(entity.attributes);
            self.driver.add_node(&node).await?;
            by_name.insert(name.clone(), node);
            order.push(name);
            report.entities += 1;
        }

        for relation in graph.relations {
            let endpoints = (
                by_name.get(&normalize_whitespace(&relation.source)),
                by_name.get(&normalize_whitespace(&relation.target)),
            );
            let (Some(source), Some(target)) = endpoints else {
                warn!(source = %relation.source, target = %relation.target, "relation endpoint not extracted");
                report.dropped_relations += 1;
                continue;
            };

            let source_type = source.labels.first().map(String::as_str).unwrap_or_default();
            let target_type = target.labels.first().map(String::as_str).unwrap_or_default();
            if !submission.allows(source_type, target_type, &relation.relation_type) {
                warn!(
                    relation = %relation.relation_type,
                    source_type,
                    target_type,
                    "relation not allowed by the edge type map"
                );
                report.dropped_relations += 1;
                continue;
            }

            let edge = EntityEdge::between(source, relation.relation_type, target, relation.fact);
            match self.driver.add_triplet(source, &edge, target).await {
                Ok(()) => report.relations += 1,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    error!(edge = %edge.uuid, error = %e, "failed to store extracted relation");
                    report.dropped_relations += 1;
                }
            }
        }

        for name in &order {
            let Some(node) = by_name.get(name) else { continue };
            let mention = EpisodicEdge::mentions(submission.episode.uuid, node.uuid, self.namespace.as_str());
            match self.driver.add_mention(&mention).await {
                Ok(()) => report.mentions += 1,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    error!(entity = %node.uuid, error = %e, "failed to store episode mention");
                    report.failed_mentions += 1;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::MemoryDriver;
    use crate::errors::{DebtGraphError, LlmError};
    use crate::llm_client::Message;

    /// Returns a canned graph regardless of the prompt.
    struct CannedLlm(std::result::Result<ExtractedGraph, ()>);

    impl LlmClient for CannedLlm {
        async fn generate(&self, _messages: &[Message]) -> Result<String> {
            Ok(String::new())
        }

        async fn generate_structured<T>(&self, _messages: &[Message]) -> Result<T>
        where
            T: serde::de::DeserializeOwned + JsonSchema,
        {
            match &self.0 {
                Ok(graph) => Ok(serde_json::from_value(serde_json::to_value(graph)?)?),
                Err(()) => Err(LlmError::EmptyResponse.into()),
            }
        }
    }

    fn dataset() -> Dataset {
        Dataset::from_json_str(
            r#"{
                "clientes": [{"id": "c1", "nombre": "Ana", "monto_deuda_inicial": 1000}],
                "interacciones": [{"id": "i1", "cliente_id": "c1", "tipo": "llamada_saliente",
                                    "agente_id": "agente_01", "monto_prometido": 200}]
            }"#,
        )
        .unwrap()
    }

    fn entity(name: &str, entity_type: &str) -> ExtractedEntity {
        ExtractedEntity {
            name: name.into(),
            entity_type: entity_type.into(),
            attributes: BTreeMap::new(),
        }
    }

    fn relation(source: &str, target: &str, relation_type: &str) -> ExtractedRelation {
        ExtractedRelation {
            source: source.into(),
            target: target.into(),
            relation_type: relation_type.into(),
            fact: format!("{source} {relation_type} {target}"),
        }
    }

    #[test]
    fn test_submission_carries_hints() {
        let submission = EpisodeSubmission::from_dataset(&dataset(), "carga_2.0", true).unwrap();
        assert_eq!(submission.episode.name, EPISODE_NAME);
        assert_eq!(submission.episode.group_id, "carga_2.0");
        assert_eq!(submission.entity_types.len(), 5);
        assert_eq!(submission.edge_types.len(), 5);
        assert!(submission.allows("Agente", "Cliente", "InteractuoCon"));
        assert!(!submission.allows("Cliente", "Agente", "InteractuoCon"));
        assert!(submission.knows_entity_type("Pago"));
        assert!(!submission.knows_entity_type("Sucursal"));

        let content: Dataset = serde_json::from_str(&submission.episode.content).unwrap();
        assert_eq!(content, dataset());
    }

    #[tokio::test]
    async fn test_load_without_extraction_stores_only_the_episode() {
        let loader = EpisodeLoader::new(MemoryDriver::new(), "carga_2.0");
        let report = loader.load(&dataset(), false).await.unwrap();

        assert_eq!(report.entities, 0);
        assert_eq!(loader.driver().episodes().await.len(), 1);
        assert!(loader.driver().nodes().await.is_empty());
    }

    #[tokio::test]
    async fn test_auto_extract_without_extractor_keeps_episode() {
        let loader = EpisodeLoader::new(MemoryDriver::new(), "carga_2.0");
        let report = loader.load(&dataset(), true).await.unwrap();

        assert!(report.extraction_error.is_none());
        let episodes = loader.driver().episodes().await;
        assert_eq!(episodes.len(), 1);
        assert!(episodes[0].auto_extract);
        assert!(loader.driver().edges().await.is_empty());
    }

    #[tokio::test]
    async fn test_extraction_filters_by_edge_type_map() {
        let graph = ExtractedGraph {
            entities: vec![
                entity("Ana", "Cliente"),
                entity("agente_01", "Agente"),
                entity("Ana", "Cliente"),
                entity("Sucursal Centro", "Sucursal"),
            ],
            relations: vec![
                relation("agente_01", "Ana", "InteractuoCon"),
                relation("Ana", "agente_01", "InteractuoCon"),
                relation("Ana", "Pago fantasma", "RealizoPago"),
            ],
        };
        let loader = EpisodeLoader::new(MemoryDriver::new(), "carga_2.0")
            .with_extractor(EpisodeExtractor::new(CannedLlm(Ok(graph))));

        let report = loader.load(&dataset(), true).await.unwrap();
        assert_eq!(report.entities, 2);
        assert_eq!(report.dropped_entities, 1);
        assert_eq!(report.relations, 1);
        assert_eq!(report.dropped_relations, 2);
        assert_eq!(report.mentions, 2);

        let driver = loader.driver();
        let edges = driver.edges().await;
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].name, "InteractuoCon");
        let mentions = driver.mentions().await;
        assert!(mentions.iter().all(|m| m.source_node_uuid == report.episode_uuid));
    }

    /// Rejects every mention with a recoverable or a fatal error.
    struct RejectingMentions {
        inner: MemoryDriver,
        fatal: bool,
    }

    impl GraphDriver for RejectingMentions {
        async fn ping(&self) -> Result<()> {
            self.inner.ping().await
        }

        async fn close(&self) -> Result<()> {
            self.inner.close().await
        }

        async fn add_triplet(
            &self,
            source: &EntityNode,
            edge: &EntityEdge,
            target: &EntityNode,
        ) -> Result<()> {
            self.inner.add_triplet(source, edge, target).await
        }

        async fn add_node(&self, node: &EntityNode) -> Result<()> {
            self.inner.add_node(node).await
        }

        async fn add_episode(&self, submission: &EpisodeSubmission) -> Result<()> {
            self.inner.add_episode(submission).await
        }

        async fn add_mention(&self, _edge: &EpisodicEdge) -> Result<()> {
            if self.fatal {
                Err(DebtGraphError::Connection("connection reset".into()))
            } else {
                Err(DebtGraphError::Driver("constraint violated".into()))
            }
        }

        async fn search_edges(&self, query: &crate::driver::EdgeQuery) -> Result<Vec<EntityEdge>> {
            self.inner.search_edges(query).await
        }

        async fn search_nodes(&self, query: &crate::driver::NodeQuery) -> Result<Vec<EntityNode>> {
            self.inner.search_nodes(query).await
        }
    }

    fn agent_and_customer() -> ExtractedGraph {
        ExtractedGraph {
            entities: vec![entity("Ana", "Cliente"), entity("agente_01", "Agente")],
            relations: vec![relation("agente_01", "Ana", "InteractuoCon")],
        }
    }

    #[tokio::test]
    async fn test_rejected_mentions_keep_the_extracted_graph() {
        let driver = RejectingMentions {
            inner: MemoryDriver::new(),
            fatal: false,
        };
        let loader = EpisodeLoader::new(driver, "carga_2.0")
            .with_extractor(EpisodeExtractor::new(CannedLlm(Ok(agent_and_customer()))));

        let report = loader.load(&dataset(), true).await.unwrap();
        assert_eq!(report.entities, 2);
        assert_eq!(report.relations, 1);
        assert_eq!(report.mentions, 0);
        assert_eq!(report.failed_mentions, 2);
        assert_eq!(loader.driver().inner.edges().await.len(), 1);
    }

    #[tokio::test]
    async fn test_lost_store_while_mentioning_aborts() {
        let driver = RejectingMentions {
            inner: MemoryDriver::new(),
            fatal: true,
        };
        let loader = EpisodeLoader::new(driver, "carga_2.0")
            .with_extractor(EpisodeExtractor::new(CannedLlm(Ok(agent_and_customer()))));

        let err = loader.load(&dataset(), true).await.unwrap_err();
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_extraction_failure_is_reported() {
        let loader = EpisodeLoader::new(MemoryDriver::new(), "carga_2.0")
            .with_extractor(EpisodeExtractor::new(CannedLlm(Err(()))));

        let report = loader.load(&dataset(), true).await.unwrap();
        assert!(report.extraction_error.is_some());
        assert_eq!(loader.driver().episodes().await.len(), 1);
    }

    #[tokio::test]
    async fn test_closed_store_aborts() {
        let driver = MemoryDriver::new();
        driver.close().await.unwrap();
        let loader = EpisodeLoader::new(driver, "carga_2.0");
        let err = loader.load(&dataset(), false).await.unwrap_err();
        assert!(matches!(err, DebtGraphError::NotInitialized));
    }
}
