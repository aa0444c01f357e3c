//! Structured read queries understood by every [`GraphDriver`](super::GraphDriver).
//!
//! Filters combine with AND; an empty query matches everything.

use uuid::Uuid;

use crate::edges::EntityEdge;
use crate::nodes::EntityNode;

/// Edge filter for the read path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EdgeQuery {
    pub group_id: Option<String>,
    /// Accepted relationship labels; empty accepts all.
    pub names: Vec<String>,
    /// Accepted source node uuids; empty accepts all.
    pub source_uuids: Vec<Uuid>,
    pub source_label: Option<String>,
    pub source_name: Option<String>,
    pub target_label: Option<String>,
    pub limit: Option<usize>,
}

impl EdgeQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_group(mut self, group_id: Option<&str>) -> Self {
        self.group_id = group_id.map(str::to_string);
        self
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.names.push(name.into());
        self
    }

    pub fn from_nodes(mut self, uuids: impl IntoIterator<Item = Uuid>) -> Self {
        self.source_uuids.extend(uuids);
        self
    }

    pub fn from_label(mut self, label: impl Into<String>) -> Self {
        self.source_label = Some(label.into());
        self
    }

    pub fn from_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = Some(name.into());
        self
    }

    pub fn to_label(mut self, label: impl Into<String>) -> Self {
        self.target_label = Some(label.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Evaluate the filter against an edge and its resolved endpoints.
    pub fn matches(&self, edge: &EntityEdge, source: &EntityNode, target: &EntityNode) -> bool {
        self.group_id.as_ref().map_or(true, |g| &edge.group_id == g)
            && (self.names.is_empty() || self.names.iter().any(|n| n == &edge.name))
            && (self.source_uuids.is_empty() || self.source_uuids.contains(&source.uuid))
            && self.source_label.as_ref().map_or(true, |l| source.has_label(l))
            && self.source_name.as_ref().map_or(true, |n| &source.name == n)
            && self.target_label.as_ref().map_or(true, |l| target.has_label(l))
    }
}

/// Node filter for the read path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeQuery {
    pub group_id: Option<String>,
    pub label: Option<String>,
    pub uuids: Vec<Uuid>,
    /// String attribute equality, e.g. `("cliente_id", "cliente_001")`.
    pub attribute: Option<(String, String)>,
    pub limit: Option<usize>,
}

impl NodeQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_group(mut self, group_id: Option<&str>) -> Self {
        self.group_id = group_id.map(str::to_string);
        self
    }

    pub fn labelled(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_uuids(mut self, uuids: impl IntoIterator<Item = Uuid>) -> Self {
        self.uuids.extend(uuids);
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attribute = Some((key.into(), value.into()));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, node: &EntityNode) -> bool {
        self.group_id.as_ref().map_or(true, |g| &node.group_id == g)
            && self.label.as_ref().map_or(true, |l| node.has_label(l))
            && (self.uuids.is_empty() || self.uuids.contains(&node.uuid))
            && self
                .attribute
                .as_ref()
                .map_or(true, |(k, v)| node.attr_str(k) == Some(v.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triplet() -> (EntityNode, EntityEdge, EntityNode) {
        let customer = EntityNode::new("CLIENTE", "Ana", "carga_2.0")
            .with_attribute("cliente_id", Some("c1"));
        let payment = EntityNode::new("PAGO", "Pago_i1", "carga_2.0");
        let edge = EntityEdge::between(&customer, "PAYS", &payment, "Ana made payment Pago_i1");
        (customer, edge, payment)
    }

    #[test]
    fn test_empty_edge_query_matches_everything() {
        let (s, e, t) = triplet();
        assert!(EdgeQuery::new().matches(&e, &s, &t));
    }

    #[test]
    fn test_edge_query_filters_combine() {
        let (s, e, t) = triplet();
        let q = EdgeQuery::new()
            .in_group(Some("carga_2.0"))
            .named("PAYS")
            .from_label("CLIENTE")
            .from_name("Ana")
            .to_label("PAGO");
        assert!(q.matches(&e, &s, &t));

        assert!(!q.clone().named("OWNS").from_name("Luis").matches(&e, &s, &t));
        assert!(!EdgeQuery::new().in_group(Some("other")).matches(&e, &s, &t));
        assert!(!EdgeQuery::new().to_label("DEUDA").matches(&e, &s, &t));
        assert!(!EdgeQuery::new()
            .from_nodes([Uuid::new_v4()])
            .matches(&e, &s, &t));
    }

    #[test]
    fn test_node_query_attribute_filter() {
        let (customer, _, payment) = triplet();
        let q = NodeQuery::new()
            .labelled("CLIENTE")
            .with_attribute("cliente_id", "c1");
        assert!(q.matches(&customer));
        assert!(!q.matches(&payment));
        assert!(!NodeQuery::new()
            .with_attribute("cliente_id", "c2")
            .matches(&customer));
    }
}
