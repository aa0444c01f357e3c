//! Interaction — one contact event between the agency and a customer.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Interaction type that marks money actually received.
pub const PAYMENT_RECEIVED: &str = "pago_recibido";

/// Renegotiated schedule nested inside an interaction (`nuevo_plan_pago`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct RenegotiatedPlan {
    #[serde(default, rename = "cuotas")]
    #[validate(range(min = 1))]
    pub installments: Option<u32>,
    #[serde(default, rename = "monto_mensual")]
    #[validate(range(min = 0.0))]
    pub monthly_amount: Option<f64>,
}

/// How an interaction relates to a payment, decided once per interaction.
///
/// A promised amount wins over the interaction type: an interaction that
/// carries `monto_prometido` is a promise even when its type is
/// `pago_recibido`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentKind {
    /// The interaction carries a promised amount.
    Promise,
    /// The interaction records money received and promises nothing.
    Received,
}

/// One entry of the dataset's `interacciones` list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct Interaction {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, rename = "cliente_id")]
    pub customer_id: Option<String>,
    #[serde(default, with = "crate::utils::datetime::flexible")]
    #[schemars(with = "Option<String>")]
    pub timestamp: Option<DateTime<Utc>>,
    /// `llamada_saliente`, `llamada_entrante`, `email`, `sms` or `pago_recibido`.
    #[serde(default, rename = "tipo")]
    pub kind: Option<String>,
    #[serde(default, rename = "duracion_segundos")]
    pub duration_seconds: Option<u64>,
    #[serde(default, rename = "agente_id")]
    pub agent_id: Option<String>,
    #[serde(default, rename = "resultado")]
    pub outcome: Option<String>,
    #[serde(default, rename = "sentimiento")]
    pub sentiment: Option<String>,
    #[serde(default, rename = "monto_prometido")]
    #[validate(range(min = 0.0))]
    pub promised_amount: Option<f64>,
    #[serde(default, rename = "fecha_promesa", with = "crate::utils::datetime::flexible")]
    #[schemars(with = "Option<String>")]
    pub promise_date: Option<DateTime<Utc>>,
    #[serde(default, rename = "nuevo_plan_pago")]
    #[validate(nested)]
    pub new_plan: Option<RenegotiatedPlan>,
    #[serde(default, rename = "monto")]
    #[validate(range(min = 0.0))]
    pub amount: Option<f64>,
    #[serde(default, rename = "metodo_pago")]
    pub payment_method: Option<String>,
    #[serde(default, rename = "pago_completo")]
    pub payment_complete: Option<bool>,
}

impl Interaction {
    /// Agent identifier, if present and not blank.
    pub fn agent(&self) -> Option<&str> {
        self.agent_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }

    /// Classify the interaction's payment signal.
    ///
    /// Returns `None` when neither a promised amount nor a received payment
    /// is present.
    /// A promised amount of zero counts as no promise.
    pub fn payment_kind(&self) -> Option<PaymentKind> {
        if self.promised_amount.is_some_and(|amount| amount != 0.0) {
            Some(PaymentKind::Promise)
        } else if self.kind.as_deref() == Some(PAYMENT_RECEIVED) {
            Some(PaymentKind::Received)
        } else {
            None
        }
    }

    /// Amount recorded on the payment node: `monto`, then `monto_prometido`.
    pub fn payment_amount(&self) -> Option<f64> {
        self.amount.or(self.promised_amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interaction(kind: Option<&str>, promised: Option<f64>) -> Interaction {
        Interaction {
            id: Some("int_001".into()),
            customer_id: Some("cliente_001".into()),
            kind: kind.map(str::to_string),
            promised_amount: promised,
            ..Interaction::default()
        }
    }

    #[test]
    fn test_payment_kind_received() {
        let i = interaction(Some(PAYMENT_RECEIVED), None);
        assert_eq!(i.payment_kind(), Some(PaymentKind::Received));
    }

    #[test]
    fn test_payment_kind_promise_regardless_of_type() {
        assert_eq!(
            interaction(Some("llamada_saliente"), Some(5000.0)).payment_kind(),
            Some(PaymentKind::Promise)
        );
        assert_eq!(
            interaction(Some(PAYMENT_RECEIVED), Some(5000.0)).payment_kind(),
            Some(PaymentKind::Promise)
        );
    }

    #[test]
    fn test_zero_promise_is_no_promise() {
        assert_eq!(interaction(Some("llamada_saliente"), Some(0.0)).payment_kind(), None);
        assert_eq!(
            interaction(Some(PAYMENT_RECEIVED), Some(0.0)).payment_kind(),
            Some(PaymentKind::Received)
        );
    }

    #[test]
    fn test_payment_kind_none() {
        assert_eq!(interaction(Some("email"), None).payment_kind(), None);
        assert_eq!(interaction(None, None).payment_kind(), None);
    }

    #[test]
    fn test_payment_amount_falls_back_to_promise() {
        let mut i = interaction(Some("llamada_entrante"), Some(7500.0));
        assert_eq!(i.payment_amount(), Some(7500.0));
        i.amount = Some(1200.0);
        assert_eq!(i.payment_amount(), Some(1200.0));
        assert_eq!(interaction(None, None).payment_amount(), None);
    }

    #[test]
    fn test_blank_agent_is_absent() {
        let mut i = interaction(None, None);
        assert_eq!(i.agent(), None);
        i.agent_id = Some("  ".into());
        assert_eq!(i.agent(), None);
        i.agent_id = Some("agente_03".into());
        assert_eq!(i.agent(), Some("agente_03"));
    }

    #[test]
    fn test_interaction_deserializes_nested_plan() {
        let raw = r#"{
            "id": "int_042",
            "cliente_id": "cliente_007",
            "timestamp": "2024-02-10T14:20:00Z",
            "tipo": "llamada_saliente",
            "duracion_segundos": 320,
            "agente_id": "agente_02",
            "resultado": "renegociacion",
            "sentimiento": "cooperativo",
            "nuevo_plan_pago": {"cuotas": 12, "monto_mensual": 4500}
        }"#;
        let i: Interaction = serde_json::from_str(raw).expect("deserialize");
        let plan = i.new_plan.as_ref().expect("plan present");
        assert_eq!(plan.installments, Some(12));
        assert_eq!(plan.monthly_amount, Some(4500.0));
        assert_eq!(i.duration_seconds, Some(320));
        assert_eq!(i.payment_kind(), None);
    }

    #[test]
    fn test_zero_installments_fail_validation() {
        let i = Interaction {
            new_plan: Some(RenegotiatedPlan {
                installments: Some(0),
                monthly_amount: Some(100.0),
            }),
            ..Interaction::default()
        };
        assert!(i.validate().is_err());
    }
}
