//! EntityNode — a customer, debt, interaction, agent, payment or plan.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Scalar attributes carried by a node. Absent values are stored as `null`.
pub type Attributes = Map<String, Value>;

/// Node label tags used by the explicit mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeLabel {
    Customer,
    Debt,
    Interaction,
    Agent,
    Payment,
    PaymentPlan,
}

impl NodeLabel {
    pub const ALL: [NodeLabel; 6] = [
        NodeLabel::Customer,
        NodeLabel::Debt,
        NodeLabel::Interaction,
        NodeLabel::Agent,
        NodeLabel::Payment,
        NodeLabel::PaymentPlan,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NodeLabel::Customer => "CLIENTE",
            NodeLabel::Debt => "DEUDA",
            NodeLabel::Interaction => "INTERACCION",
            NodeLabel::Agent => "AGENTE",
            NodeLabel::Payment => "PAGO",
            NodeLabel::PaymentPlan => "PLAN_PAGO",
        }
    }

    /// Case-insensitive lookup, so `?filter_tipo=cliente` works.
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|label| label.as_str().eq_ignore_ascii_case(raw.trim()))
    }
}

impl std::fmt::Display for NodeLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed graph node scoped to one ingestion run by `group_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityNode {
    pub uuid: Uuid,
    pub name: String,
    pub group_id: String,
    pub labels: Vec<String>,
    pub attributes: Attributes,
    pub created_at: DateTime<Utc>,
}

impl EntityNode {
    /// Build a node with a fresh uuid and a single timestamp capture.
    pub fn new(label: impl Into<String>, name: impl Into<String>, group_id: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            group_id: group_id.into(),
            labels: vec![label.into()],
            attributes: Attributes::new(),
            created_at: Utc::now(),
        }
    }

    /// Set one attribute; `None` is stored as `null`.
    pub fn with_attribute<V: Into<Value>>(mut self, key: &str, value: Option<V>) -> Self {
        self.attributes
            .insert(key.to_string(), value.map_or(Value::Null, Into::into));
        self
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    /// Attribute as a string slice, if present and a string.
    pub fn attr_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }

    /// Attribute as a number, if present and numeric.
    pub fn attr_f64(&self, key: &str) -> Option<f64> {
        self.attributes.get(key).and_then(Value::as_f64)
    }
}
