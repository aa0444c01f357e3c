//! Dataset — the validated document handed to an ingestion run.

use std::path::Path;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use validator::Validate;

use super::{Customer, Interaction};
use crate::errors::{DebtGraphError, Result};

/// Customers and interactions in input order.
///
/// Unknown top-level keys (such as the generator's `metadata` block) are
/// ignored; a missing list is treated as empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct Dataset {
    #[serde(default, rename = "clientes")]
    #[validate(nested)]
    pub customers: Vec<Customer>,
    #[serde(default, rename = "interacciones")]
    #[validate(nested)]
    pub interactions: Vec<Interaction>,
}

impl Dataset {
    /// Parse and validate a dataset from a JSON string.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let dataset: Dataset = serde_json::from_str(raw)?;
        dataset.validate().map_err(|e| {
            error!(error = %e, "dataset validation failed");
            DebtGraphError::Validation(e.to_string())
        })?;
        info!(
            customers = dataset.customers.len(),
            interactions = dataset.interactions.len(),
            "dataset validated"
        );
        Ok(dataset)
    }

    /// Read, parse and validate a dataset file.
    ///
    /// Any failure here aborts ingestion before a single node is built.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| DebtGraphError::io(path.display(), e))?;
        Self::from_json_str(&raw)
    }
}
