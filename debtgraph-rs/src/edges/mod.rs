//! Edge types for the collection graph.
//!
//! - [`EntityEdge`] — labelled fact-bearing relationships (OWNS, HAS, PERFORMS, ...)
//! - [`EpisodicEdge`] — MENTIONS relationships (episode → inferred entity)

pub mod entity;
pub mod episodic;

pub use entity::{EdgeLabel, EntityEdge};
pub use episodic::EpisodicEdge;
