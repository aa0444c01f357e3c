//! Typed input records.
//!
//! The wire format is the collection dataset's JSON document (Spanish keys);
//! Rust fields carry English names with serde renames.
//! - [`Customer`] — `clientes[]`
//! - [`Interaction`] — `interacciones[]`, with optional promise, payment and plan fields
//! - [`Dataset`] — the whole document

pub mod customer;
pub mod dataset;
pub mod hints;
pub mod interaction;

pub use customer::Customer;
pub use dataset::Dataset;
pub use interaction::{Interaction, PaymentKind, RenegotiatedPlan, PAYMENT_RECEIVED};
