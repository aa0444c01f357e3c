//! Read-side projections served by the HTTP API.
//!
//! Every projection is composed from [`EdgeQuery`]/[`NodeQuery`] calls, so it
//! behaves the same on every driver.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use super::GraphSearch;
use crate::driver::{EdgeQuery, GraphDriver, NodeQuery};
use crate::edges::{EdgeLabel, EntityEdge};
use crate::errors::{DebtGraphError, Result};
use crate::nodes::{EntityNode, NodeLabel};

const DIAGNOSTIC_LIMIT: usize = 10;

/// Portfolio-level indicators.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpis {
    pub total_clientes: usize,
    /// Sum of every debt's initial amount.
    pub total_deudas: f64,
    /// Promises whose customer has at least one received payment.
    pub promesas_cumplidas: usize,
    /// Received payments over total debt, as a percentage.
    pub tasa_recuperacion: f64,
}

/// One customer with the nodes hanging off it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerDetail {
    pub cliente: EntityNode,
    pub interacciones: Vec<EntityNode>,
    pub pagos: Vec<EntityNode>,
    pub planes_pago: Vec<EntityNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphExport {
    pub nodes: Vec<EntityNode>,
    pub edges: Vec<EntityEdge>,
}

impl<D: GraphDriver> GraphSearch<D> {
    pub async fn kpis(&self) -> Result<Kpis> {
        let customers = self
            .nodes(NodeQuery::new().labelled(NodeLabel::Customer.as_str()))
            .await?;
        let debts = self
            .nodes(NodeQuery::new().labelled(NodeLabel::Debt.as_str()))
            .await?;
        let total_deudas: f64 = debts.iter().filter_map(|d| d.attr_f64("monto_inicial")).sum();

        // interaction uuid → customer uuid
        let owner_of: HashMap<Uuid, Uuid> = self
            .edges(
                EdgeQuery::new()
                    .named(EdgeLabel::Has.as_str())
                    .from_label(NodeLabel::Customer.as_str()),
            )
            .await?
            .into_iter()
            .map(|e| (e.target_node_uuid, e.source_node_uuid))
            .collect();

        let received = self
            .edges(
                EdgeQuery::new()
                    .named(EdgeLabel::Pays.as_str())
                    .from_label(NodeLabel::Interaction.as_str()),
            )
            .await?;
        let paying_customers: HashSet<Uuid> = received
            .iter()
            .filter_map(|e| owner_of.get(&e.source_node_uuid).copied())
            .collect();

        let promesas_cumplidas = self
            .edges(
                EdgeQuery::new()
                    .named(EdgeLabel::Promises.as_str())
                    .from_label(NodeLabel::Interaction.as_str()),
            )
            .await?
            .iter()
            .filter(|e| {
                owner_of
                    .get(&e.source_node_uuid)
                    .is_some_and(|c| paying_customers.contains(c))
            })
            .count();

        let received_amount: f64 = self
            .resolve(received.iter().map(|e| e.target_node_uuid))
            .await?
            .iter()
            .filter_map(|p| p.attr_f64("monto"))
            .sum();

        let tasa_recuperacion = if total_deudas > 0.0 {
            received_amount / total_deudas * 100.0
        } else {
            0.0
        };

        Ok(Kpis {
            total_clientes: customers.len(),
            total_deudas,
            promesas_cumplidas,
            tasa_recuperacion,
        })
    }

    /// Detail for the customer whose `cliente_id` attribute is `customer_id`,
    /// or `None` when there is no such customer.
    pub async fn customer_detail(&self, customer_id: &str) -> Result<Option<CustomerDetail>> {
        let Some(cliente) = self
            .nodes(
                NodeQuery::new()
                    .labelled(NodeLabel::Customer.as_str())
                    .with_attribute("cliente_id", customer_id)
                    .limit(1),
            )
            .await?
            .into_iter()
            .next()
        else {
            debug!(cliente_id = customer_id, "customer not found");
            return Ok(None);
        };

        let outgoing = self
            .edges(EdgeQuery::new().from_nodes([cliente.uuid]))
            .await?;
        let targets_of = |label: EdgeLabel| -> Vec<Uuid> {
            outgoing
                .iter()
                .filter(|e| e.name == label.as_str())
                .map(|e| e.target_node_uuid)
                .collect()
        };
        let interaction_uuids = targets_of(EdgeLabel::Has);
        let payment_uuids = targets_of(EdgeLabel::Pays);

        let plan_uuids: Vec<Uuid> = if interaction_uuids.is_empty() {
            Vec::new()
        } else {
            self.edges(
                EdgeQuery::new()
                    .named(EdgeLabel::RenewsPlan.as_str())
                    .from_nodes(interaction_uuids.iter().copied()),
            )
            .await?
            .into_iter()
            .map(|e| e.target_node_uuid)
            .collect()
        };

        Ok(Some(CustomerDetail {
            interacciones: self.resolve(interaction_uuids).await?,
            pagos: self.resolve(payment_uuids).await?,
            planes_pago: self.resolve(plan_uuids).await?,
            cliente,
        }))
    }

    /// All nodes, or only those labelled `filter_tipo`, plus the edges whose
    /// endpoints both survive the filter.
    pub async fn graph_export(&self, filter_tipo: Option<&str>) -> Result<GraphExport> {
        let mut node_query = NodeQuery::new();
        if let Some(raw) = filter_tipo.filter(|raw| !raw.trim().is_empty()) {
            let label = NodeLabel::parse(raw)
                .ok_or_else(|| DebtGraphError::Validation(format!("unknown node type '{raw}'")))?;
            node_query = node_query.labelled(label.as_str());
        }

        let nodes = self.nodes(node_query).await?;
        let kept: HashSet<Uuid> = nodes.iter().map(|n| n.uuid).collect();
        let edges = self
            .edges(EdgeQuery::new())
            .await?
            .into_iter()
            .filter(|e| kept.contains(&e.source_node_uuid) && kept.contains(&e.target_node_uuid))
            .collect();

        Ok(GraphExport { nodes, edges })
    }

    /// Facts of the first customer-owns-debt edges.
    pub async fn diagnostic(&self) -> Result<String> {
        self.facts(
            EdgeQuery::new()
                .named(EdgeLabel::Owns.as_str())
                .from_label(NodeLabel::Customer.as_str())
                .limit(DIAGNOSTIC_LIMIT),
        )
        .await
    }

    async fn resolve(&self, uuids: impl IntoIterator<Item = Uuid>) -> Result<Vec<EntityNode>> {
        let uuids: Vec<Uuid> = uuids.into_iter().collect();
        if uuids.is_empty() {
            return Ok(Vec::new());
        }
        self.nodes(NodeQuery::new().with_uuids(uuids)).await
    }
}
