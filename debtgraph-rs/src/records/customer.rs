//! Customer — a debtor as described by the input dataset.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// One entry of the dataset's `clientes` list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct Customer {
    /// Customer identifier, e.g. `cliente_001`.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, rename = "nombre")]
    pub name: Option<String>,
    #[serde(default, rename = "telefono")]
    pub phone: Option<String>,
    #[serde(default, rename = "monto_deuda_inicial")]
    #[validate(range(min = 0.0))]
    pub initial_debt: Option<f64>,
    #[serde(default, rename = "fecha_prestamo", with = "crate::utils::datetime::flexible")]
    #[schemars(with = "Option<String>")]
    pub loan_date: Option<DateTime<Utc>>,
    /// `tarjeta_credito`, `prestamo_personal`, `hipoteca` or `auto`.
    #[serde(default, rename = "tipo_deuda")]
    pub debt_type: Option<String>,
}

impl Customer {
    /// Name used for the customer's graph node.
    ///
    /// Falls back to the identifier when the record has no usable name.
    pub fn display_name(&self) -> Option<String> {
        self.name
            .as_deref()
            .map(crate::utils::normalize_whitespace)
            .filter(|name| !name.is_empty())
            .or_else(|| self.id.clone())
    }
}
