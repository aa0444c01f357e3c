//! Cypher statement builders for the Neo4j driver.
//!
//! Values always go through parameters. Only labels are spliced into the
//! statement text, and only after [`cypher_label`] accepts them.

use neo4rs::{query, Query};
use tracing::warn;

use crate::driver::{EdgeQuery, NodeQuery};
use crate::utils::cypher_label;

/// Accumulates `WHERE` conditions.
#[derive(Debug, Default)]
struct WhereBuilder {
    conditions: Vec<String>,
}

impl WhereBuilder {
    fn push(&mut self, condition: impl Into<String>) -> &mut Self {
        self.conditions.push(condition.into());
        self
    }

    fn push_if(&mut self, enabled: bool, condition: &str) -> &mut Self {
        if enabled {
            self.conditions.push(condition.to_string());
        }
        self
    }

    fn build(&self) -> String {
        if self.conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.conditions.join(" AND "))
        }
    }
}

/// MERGE an `:Entity` by uuid and set every property from the
/// `{alias}_*` parameters bound by the driver.
pub(super) fn node_merge(alias: &str, labels: &[String]) -> String {
    format!(
        r#"
        MERGE ({a}:Entity {{uuid: ${a}_uuid}})
        SET {a}.name = ${a}_name, {a}.group_id = ${a}_group_id, {a}.labels = ${a}_labels,
            {a}.attributes_json = ${a}_attributes_json, {a}.created_at = datetime(${a}_created_at)
        SET {a} += ${a}_props
        {labels}
        "#,
        a = alias,
        labels = label_clause(alias, labels),
    )
}

/// `SET alias:LABEL` for every valid label; invalid ones are dropped.
fn label_clause(alias: &str, labels: &[String]) -> String {
    labels
        .iter()
        .filter_map(|label| match cypher_label(label) {
            Some(valid) => Some(format!("SET {alias}:{valid}")),
            None => {
                warn!(label, "skipping label not usable in cypher");
                None
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub(super) fn edge_search_cypher(q: &EdgeQuery) -> String {
    let mut conditions = WhereBuilder::default();
    conditions
        .push_if(q.group_id.is_some(), "e.group_id = $group_id")
        .push_if(!q.names.is_empty(), "e.name IN $names")
        .push_if(!q.source_uuids.is_empty(), "s.uuid IN $source_uuids")
        .push_if(q.source_label.is_some(), "$source_label IN s.labels")
        .push_if(q.source_name.is_some(), "s.name = $source_name")
        .push_if(q.target_label.is_some(), "$target_label IN t.labels");

    let limit = q
        .limit
        .map(|n| format!("LIMIT {n}"))
        .unwrap_or_default();

    format!(
        r#"
        MATCH (s:Entity)-[e:RELATES_TO]->(t:Entity)
        {where_clause}
        RETURN e.uuid AS uuid, s.uuid AS source_uuid, t.uuid AS target_uuid,
               e.name AS name, e.fact AS fact, e.group_id AS group_id,
               toString(e.created_at) AS created_at
        ORDER BY e.created_at, e.uuid
        {limit}
        "#,
        where_clause = conditions.build(),
    )
}

pub(super) fn edge_search(q: &EdgeQuery) -> Query {
    let mut statement = query(&edge_search_cypher(q));
    if let Some(group_id) = &q.group_id {
        statement = statement.param("group_id", group_id.clone());
    }
    if !q.names.is_empty() {
        statement = statement.param("names", q.names.clone());
    }
    if !q.source_uuids.is_empty() {
        let uuids: Vec<String> = q.source_uuids.iter().map(ToString::to_string).collect();
        statement = statement.param("source_uuids", uuids);
    }
    if let Some(label) = &q.source_label {
        statement = statement.param("source_label", label.clone());
    }
    if let Some(name) = &q.source_name {
        statement = statement.param("source_name", name.clone());
    }
    if let Some(label) = &q.target_label {
        statement = statement.param("target_label", label.clone());
    }
    statement
}

pub(super) fn node_search_cypher(q: &NodeQuery) -> String {
    let mut conditions = WhereBuilder::default();
    conditions
        .push_if(q.group_id.is_some(), "n.group_id = $group_id")
        .push_if(q.label.is_some(), "$label IN n.labels")
        .push_if(!q.uuids.is_empty(), "n.uuid IN $uuids");
    if q.attribute.is_some() {
        conditions.push("n[$attr_key] = $attr_value");
    }

    let limit = q
        .limit
        .map(|n| format!("LIMIT {n}"))
        .unwrap_or_default();

    format!(
        r#"
        MATCH (n:Entity)
        {where_clause}
        RETURN n.uuid AS uuid, n.name AS name, n.group_id AS group_id,
               n.labels AS labels, n.attributes_json AS attributes_json,
               toString(n.created_at) AS created_at
        ORDER BY n.created_at, n.uuid
        {limit}
        "#,
        where_clause = conditions.build(),
    )
}

pub(super) fn node_search(q: &NodeQuery) -> Query {
    let mut statement = query(&node_search_cypher(q));
    if let Some(group_id) = &q.group_id {
        statement = statement.param("group_id", group_id.clone());
    }
    if let Some(label) = &q.label {
        statement = statement.param("label", label.clone());
    }
    if !q.uuids.is_empty() {
        let uuids: Vec<String> = q.uuids.iter().map(ToString::to_string).collect();
        statement = statement.param("uuids", uuids);
    }
    if let Some((key, value)) = &q.attribute {
        statement = statement
            .param("attr_key", key.clone())
            .param("attr_value", value.clone());
    }
    statement
}
