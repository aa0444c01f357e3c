//! Node types for the collection graph.
//!
//! - [`EntityNode`] — customers, debts, interactions, agents, payments and plans
//! - [`EpisodicNode`] — bulk dataset documents submitted in episode mode

pub mod entity;
pub mod episodic;

pub use entity::{Attributes, EntityNode, NodeLabel};
pub use episodic::{EpisodeType, EpisodicNode};
