//! Explicit per-record mapping from a [`Dataset`] to graph triplets.
//!
//! Two sequential phases over the dataset:
//! 1. customers: CLIENTE node, its DEUDA node and the OWNS edge
//! 2. interactions: INTERACCION node and HAS edge, then the optional agent,
//!    payment and plan sub-graphs
//!
//! Every triplet is handed to the driver as soon as it is built. A failure
//! while handling one record is logged and the run moves on; connectivity
//! failures abort the run.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::driver::GraphDriver;
use crate::edges::{EdgeLabel, EntityEdge};
use crate::errors::{DebtGraphError, Result};
use crate::nodes::{EntityNode, NodeLabel};
use crate::records::{Customer, Dataset, Interaction, PaymentKind, RenegotiatedPlan};

/// Identity caches for a single run.
///
/// Created fresh by every [`GraphBuilder::ingest`] call and dropped when it
/// returns, so concurrent runs never share node identities.
#[derive(Debug, Default)]
pub struct RunCaches {
    customers: HashMap<String, EntityNode>,
    agents: HashMap<String, EntityNode>,
}

impl RunCaches {
    pub fn customer(&self, id: &str) -> Option<&EntityNode> {
        self.customers.get(id)
    }

    pub fn agent(&self, id: &str) -> Option<&EntityNode> {
        self.agents.get(id)
    }
}

/// Outcome of one ingestion run.
///
/// A run that returns a report is successful even when records were skipped
/// or failed; the counters say how many.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IngestionReport {
    pub namespace: String,
    /// Customers whose sub-graph was fully emitted.
    pub customers: usize,
    /// Interactions whose sub-graph was fully emitted.
    pub interactions: usize,
    /// Customer records repeating an id already seen in this run.
    pub duplicate_customers: usize,
    /// Interactions dropped because their customer is unknown.
    pub skipped_interactions: usize,
    pub failed_customers: usize,
    pub failed_interactions: usize,
    /// Nodes constructed, including those of failed records.
    pub nodes: usize,
    /// Edges accepted by the driver.
    pub edges: usize,
}

enum InteractionOutcome {
    Ingested,
    UnknownCustomer,
}

/// Projects a dataset into the graph, one triplet at a time.
pub struct GraphBuilder<D> {
    driver: D,
    namespace: String,
}

impl<D: GraphDriver> GraphBuilder<D> {
    pub fn new(driver: D, namespace: impl Into<String>) -> Self {
        Self {
            driver,
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn into_driver(self) -> D {
        self.driver
    }

    /// Run both phases over `dataset`.
    ///
    /// Returns `Err` only when the graph store is unusable, either at the
    /// initial ping or mid-run.
    pub async fn ingest(&self, dataset: &Dataset) -> Result<IngestionReport> {
        self.driver.ping().await.inspect_err(|e| {
            error!(error = %e, "graph store unavailable, aborting ingestion");
        })?;

        let mut caches = RunCaches::default();
        let mut report = IngestionReport {
            namespace: self.namespace.clone(),
            ..IngestionReport::default()
        };

        info!(
            namespace = %self.namespace,
            customers = dataset.customers.len(),
            interactions = dataset.interactions.len(),
            "ingestion started"
        );

        for customer in &dataset.customers {
            if let Some(id) = customer.id.as_deref() {
                if caches.customers.contains_key(id) {
                    warn!(cliente_id = id, "duplicate customer id, keeping the first record");
                    report.duplicate_customers += 1;
                    continue;
                }
            }
            match self.ingest_customer(customer, &mut caches, &mut report).await {
                Ok(()) => report.customers += 1,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    error!(cliente_id = ?customer.id, error = %e, "failed to ingest customer");
                    report.failed_customers += 1;
                }
            }
        }

        for interaction in &dataset.interactions {
            match self
                .ingest_interaction(interaction, &mut caches, &mut report)
                .await
            {
                Ok(InteractionOutcome::Ingested) => report.interactions += 1,
                Ok(InteractionOutcome::UnknownCustomer) => report.skipped_interactions += 1,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    error!(interaccion_id = ?interaction.id, error = %e, "failed to ingest interaction");
                    report.failed_interactions += 1;
                }
            }
        }

        info!(
            namespace = %report.namespace,
            customers = report.customers,
            interactions = report.interactions,
            skipped = report.skipped_interactions,
            failed = report.failed_customers + report.failed_interactions,
            nodes = report.nodes,
            edges = report.edges,
            "ingestion finished"
        );
        Ok(report)
    }

    async fn ingest_customer(
        &self,
        customer: &Customer,
        caches: &mut RunCaches,
        report: &mut IngestionReport,
    ) -> Result<()> {
        let id = customer
            .id
            .as_deref()
            .ok_or_else(|| DebtGraphError::Validation("customer record has no id".into()))?;
        let name = customer.display_name().unwrap_or_else(|| id.to_string());

        let customer_node = EntityNode::new(NodeLabel::Customer.as_str(), name.as_str(), self.namespace.as_str())
            .with_attribute("cliente_id", Some(id))
            .with_attribute("telefono", customer.phone.clone())
            .with_attribute("monto_deuda_inicial", customer.initial_debt)
            .with_attribute("fecha_prestamo", customer.loan_date.map(|d| d.to_rfc3339()))
            .with_attribute("tipo_deuda", customer.debt_type.clone());
        report.nodes += 1;
        caches.customers.insert(id.to_string(), customer_node.clone());

        let debt_node = debt_node(&customer_node, customer);
        report.nodes += 1;

        let fact = format!("{} owns debt {}", customer_node.name, debt_node.name);
        self.emit(&customer_node, EdgeLabel::Owns, &debt_node, fact, report)
            .await?;

        debug!(cliente_id = id, "customer ingested");
        Ok(())
    }

    async fn ingest_interaction(
        &self,
        interaction: &Interaction,
        caches: &mut RunCaches,
        report: &mut IngestionReport,
    ) -> Result<InteractionOutcome> {
        let Some(customer_node) = interaction
            .customer_id
            .as_deref()
            .and_then(|id| caches.customers.get(id))
            .cloned()
        else {
            warn!(
                interaccion_id = ?interaction.id,
                cliente_id = ?interaction.customer_id,
                "interaction references an unknown customer, skipping"
            );
            return Ok(InteractionOutcome::UnknownCustomer);
        };

        let id = interaction.id.as_deref().unwrap_or_default();
        let interaction_node = EntityNode::new(
            NodeLabel::Interaction.as_str(),
            format!("Interaccion_{id}"),
            self.namespace.as_str(),
        )
        .with_attribute("interaccion_id", interaction.id.clone())
        .with_attribute("tipo", interaction.kind.clone())
        .with_attribute("timestamp", interaction.timestamp.map(|t| t.to_rfc3339()))
        .with_attribute("duracion_segundos", interaction.duration_seconds)
        .with_attribute("resultado", interaction.outcome.clone())
        .with_attribute("sentimiento", interaction.sentiment.clone());
        report.nodes += 1;

        let fact = format!("{} has interaction {}", customer_node.name, interaction_node.name);
        self.emit(&customer_node, EdgeLabel::Has, &interaction_node, fact, report)
            .await?;

        if let Some(agent_id) = interaction.agent() {
            let agent_node = match caches.agents.get(agent_id) {
                Some(node) => node.clone(),
                None => {
                    let node = EntityNode::new(NodeLabel::Agent.as_str(), agent_id, self.namespace.as_str());
                    report.nodes += 1;
                    caches.agents.insert(agent_id.to_string(), node.clone());
                    node
                }
            };
            let fact = format!("{} performed interaction {}", agent_node.name, interaction_node.name);
            self.emit(&agent_node, EdgeLabel::Performs, &interaction_node, fact, report)
                .await?;
        }

        if let Some(kind) = interaction.payment_kind() {
            let payment_node = EntityNode::new(
                NodeLabel::Payment.as_str(),
                format!("Pago_{id}"),
                self.namespace.as_str(),
            )
            .with_attribute("monto", interaction.payment_amount())
            .with_attribute("metodo_pago", interaction.payment_method.clone())
            .with_attribute("pago_completo", interaction.payment_complete)
            .with_attribute("fecha_promesa", interaction.promise_date.map(|d| d.to_rfc3339()));
            report.nodes += 1;

            let label = match kind {
                PaymentKind::Promise => EdgeLabel::Promises,
                PaymentKind::Received => EdgeLabel::Pays,
            };
            let fact = format!("{} links to payment {}", interaction_node.name, payment_node.name);
            self.emit(&interaction_node, label, &payment_node, fact, report)
                .await?;

            let fact = format!("{} made payment {}", customer_node.name, payment_node.name);
            self.emit(&customer_node, EdgeLabel::Pays, &payment_node, fact, report)
                .await?;
        }

        if let Some(plan) = &interaction.new_plan {
            let plan_node = plan_node(id, plan, interaction, &self.namespace);
            report.nodes += 1;

            let fact = format!("{} created plan {}", interaction_node.name, plan_node.name);
            self.emit(&interaction_node, EdgeLabel::RenewsPlan, &plan_node, fact, report)
                .await?;
        }

        Ok(InteractionOutcome::Ingested)
    }

    async fn emit(
        &self,
        source: &EntityNode,
        label: EdgeLabel,
        target: &EntityNode,
        fact: String,
        report: &mut IngestionReport,
    ) -> Result<()> {
        let edge = EntityEdge::between(source, label.as_str(), target, fact);
        self.driver.add_triplet(source, &edge, target).await?;
        report.edges += 1;
        Ok(())
    }
}

fn debt_node(customer_node: &EntityNode, customer: &Customer) -> EntityNode {
    EntityNode::new(
        NodeLabel::Debt.as_str(),
        format!("Deuda_{}", customer_node.name),
        customer_node.group_id.as_str(),
    )
    .with_attribute("monto_inicial", customer.initial_debt)
    .with_attribute("monto_actual", customer.initial_debt)
    .with_attribute("tipo", customer.debt_type.clone())
    .with_attribute("fecha_inicio", customer.loan_date.map(|d| d.to_rfc3339()))
}

fn plan_node(
    interaction_id: &str,
    plan: &RenegotiatedPlan,
    interaction: &Interaction,
    namespace: &str,
) -> EntityNode {
    EntityNode::new(
        NodeLabel::PaymentPlan.as_str(),
        format!("PlanPago_{interaction_id}"),
        namespace,
    )
    .with_attribute("cuotas", plan.installments)
    .with_attribute("monto_mensual", plan.monthly_amount)
    .with_attribute("fecha_inicio", interaction.timestamp.map(|t| t.to_rfc3339()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::MemoryDriver;

    fn customer(id: &str, name: &str) -> Customer {
        Customer {
            id: Some(id.into()),
            name: Some(name.into()),
            initial_debt: Some(1000.0),
            debt_type: Some("auto".into()),
            ..Customer::default()
        }
    }

    #[test]
    fn test_debt_node_mirrors_customer() {
        let c = customer("c1", "Ana");
        let node = EntityNode::new("CLIENTE", "Ana", "g");
        let debt = debt_node(&node, &c);
        assert_eq!(debt.name, "Deuda_Ana");
        assert_eq!(debt.group_id, "g");
        assert_eq!(debt.attr_f64("monto_inicial"), Some(1000.0));
        assert_eq!(debt.attr_f64("monto_actual"), Some(1000.0));
        assert_eq!(debt.attr_str("tipo"), Some("auto"));
    }

    #[tokio::test]
    async fn test_customer_without_id_fails_alone() {
        let dataset = Dataset {
            customers: vec![
                Customer {
                    name: Some("Sin Id".into()),
                    ..Customer::default()
                },
                customer("c2", "Luis"),
            ],
            interactions: vec![],
        };
        let builder = GraphBuilder::new(MemoryDriver::new(), "g");
        let report = builder.ingest(&dataset).await.unwrap();

        assert_eq!(report.failed_customers, 1);
        assert_eq!(report.customers, 1);
        assert_eq!(builder.driver().edges().await.len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_customer_is_created_once() {
        let dataset = Dataset {
            customers: vec![customer("c1", "Ana"), customer("c1", "Ana bis")],
            interactions: vec![],
        };
        let builder = GraphBuilder::new(MemoryDriver::new(), "g");
        let report = builder.ingest(&dataset).await.unwrap();

        assert_eq!(report.customers, 1);
        assert_eq!(report.duplicate_customers, 1);
        let names: Vec<String> = builder
            .driver()
            .nodes()
            .await
            .into_iter()
            .map(|n| n.name)
            .collect();
        assert!(names.contains(&"Ana".to_string()));
        assert!(!names.contains(&"Ana bis".to_string()));
    }

    #[tokio::test]
    async fn test_customer_name_falls_back_to_id() {
        let dataset = Dataset {
            customers: vec![Customer {
                id: Some("cliente_009".into()),
                name: Some("   ".into()),
                ..Customer::default()
            }],
            interactions: vec![],
        };
        let builder = GraphBuilder::new(MemoryDriver::new(), "g");
        builder.ingest(&dataset).await.unwrap();

        let edges = builder.driver().edges().await;
        assert_eq!(edges[0].fact, "cliente_009 owns debt Deuda_cliente_009");
    }

    #[tokio::test]
    async fn test_report_counts_nodes_and_edges() {
        let dataset = Dataset {
            customers: vec![customer("c1", "Ana")],
            interactions: vec![Interaction {
                id: Some("i1".into()),
                customer_id: Some("c1".into()),
                agent_id: Some("agente_01".into()),
                promised_amount: Some(250.0),
                new_plan: Some(RenegotiatedPlan {
                    installments: Some(6),
                    monthly_amount: Some(150.0),
                }),
                ..Interaction::default()
            }],
        };
        let builder = GraphBuilder::new(MemoryDriver::new(), "g");
        let report = builder.ingest(&dataset).await.unwrap();

        // customer, debt, interaction, agent, payment, plan
        assert_eq!(report.nodes, 6);
        // OWNS, HAS, PERFORMS, PROMISES, PAYS, RENEWS_PLAN
        assert_eq!(report.edges, 6);
        assert_eq!(builder.driver().triplet_calls(), 6);
    }
}
