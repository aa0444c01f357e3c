//! EntityEdge — a labelled, fact-bearing relationship between two EntityNodes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::nodes::EntityNode;

/// Relationship labels emitted by the explicit mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeLabel {
    /// Customer → Debt
    Owns,
    /// Customer → Interaction
    Has,
    /// Agent → Interaction
    Performs,
    /// Interaction → Payment, when a promised amount is present
    Promises,
    /// Interaction → Payment (received) and Customer → Payment
    Pays,
    /// Interaction → PaymentPlan
    RenewsPlan,
}

impl EdgeLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            EdgeLabel::Owns => "OWNS",
            EdgeLabel::Has => "HAS",
            EdgeLabel::Performs => "PERFORMS",
            EdgeLabel::Promises => "PROMISES",
            EdgeLabel::Pays => "PAYS",
            EdgeLabel::RenewsPlan => "RENEWS_PLAN",
        }
    }
}

impl std::fmt::Display for EdgeLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A directed relationship carrying a human-readable fact sentence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityEdge {
    /// Unique identifier for this edge.
    pub uuid: Uuid,
    /// UUID of the source EntityNode.
    pub source_node_uuid: Uuid,
    /// UUID of the target EntityNode.
    pub target_node_uuid: Uuid,
    /// Relationship label (e.g. "OWNS", "PAYS").
    pub name: String,
    /// Human-readable fact string.
    pub fact: String,
    /// Namespace of the run that created the edge.
    pub group_id: String,
    /// When this edge was created in the graph.
    pub created_at: DateTime<Utc>,
}

impl EntityEdge {
    /// Connect `source` to `target`. The edge inherits the source's namespace.
    pub fn between(
        source: &EntityNode,
        name: impl Into<String>,
        target: &EntityNode,
        fact: impl Into<String>,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            source_node_uuid: source.uuid,
            target_node_uuid: target.uuid,
            name: name.into(),
            fact: fact.into(),
            group_id: source.group_id.clone(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_between_wires_endpoints() {
        let customer = EntityNode::new("CLIENTE", "Ana", "carga_2.0");
        let debt = EntityNode::new("DEUDA", "Deuda_Ana", "carga_2.0");
        let edge = EntityEdge::between(
            &customer,
            EdgeLabel::Owns.as_str(),
            &debt,
            "Ana owns debt Deuda_Ana",
        );

        assert_eq!(edge.source_node_uuid, customer.uuid);
        assert_eq!(edge.target_node_uuid, debt.uuid);
        assert_eq!(edge.name, "OWNS");
        assert_eq!(edge.group_id, "carga_2.0");
    }

    #[test]
    fn test_edge_labels() {
        assert_eq!(EdgeLabel::RenewsPlan.to_string(), "RENEWS_PLAN");
        assert_eq!(EdgeLabel::Promises.as_str(), "PROMISES");
    }
}
