//! Graph query facade.
//!
//! [`GraphSearch`] runs structured queries through a [`GraphDriver`] and
//! renders matched edges as fact sentences. The read-side projections used
//! by the HTTP API live in [`projections`].
//!
//! Query failures are returned to the caller as-is; nothing here retries.

pub mod projections;

pub use projections::{CustomerDetail, GraphExport, Kpis};

use crate::driver::{EdgeQuery, GraphDriver, NodeQuery};
use crate::edges::EntityEdge;
use crate::errors::Result;
use crate::nodes::EntityNode;

/// Read-only access to the persisted graph, optionally scoped to one namespace.
pub struct GraphSearch<D> {
    driver: D,
    namespace: Option<String>,
}

impl<D: GraphDriver> GraphSearch<D> {
    /// Search across every namespace.
    pub fn new(driver: D) -> Self {
        Self {
            driver,
            namespace: None,
        }
    }

    /// Restrict every query to `namespace`.
    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Edges matching `query`, in store order. The facade's namespace wins
    /// over one set on the query.
    pub async fn edges(&self, query: EdgeQuery) -> Result<Vec<EntityEdge>> {
        let query = match &self.namespace {
            Some(ns) => query.in_group(Some(ns)),
            None => query,
        };
        self.driver.search_edges(&query).await
    }

    pub async fn nodes(&self, query: NodeQuery) -> Result<Vec<EntityNode>> {
        let query = match &self.namespace {
            Some(ns) => query.in_group(Some(ns)),
            None => query,
        };
        self.driver.search_nodes(&query).await
    }

    /// Run `query` and render the matches, one fact per line.
    pub async fn facts(&self, query: EdgeQuery) -> Result<String> {
        Ok(render_facts(&self.edges(query).await?))
    }
}

/// Join edge facts with newlines. Display only.
pub fn render_facts(edges: &[EntityEdge]) -> String {
    edges
        .iter()
        .map(|e| e.fact.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}
