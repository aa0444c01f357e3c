//! Type hints handed to the graph store in bulk episode mode.
//!
//! These records never flow through the explicit mapping; their JSON
//! schemas tell the extractor which entity and relation shapes to look for.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A staff member who contacts customers.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct Agent {
    pub id: Option<String>,
    pub nombre: Option<String>,
}

/// A customer's commitment to pay.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PaymentPromise {
    pub monto_prometido: Option<f64>,
    pub fecha_promesa: Option<DateTime<Utc>>,
}

/// Agent → customer contact.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct InteractedWith {
    pub tipo: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub duracion_segundos: Option<u64>,
    pub resultado: Option<String>,
    pub sentimiento: Option<String>,
}

/// Customer → payment.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PaymentMade {
    pub monto: Option<f64>,
    pub metodo_pago: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
    pub pago_completo: Option<bool>,
}

/// Customer → debt renegotiation.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PlanRenegotiated {
    pub cuotas: Option<u32>,
    pub monto_mensual: Option<f64>,
}

/// Promise → payment that did not arrive in time.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PromiseBroken {
    pub fecha_vencimiento: Option<DateTime<Utc>>,
}
