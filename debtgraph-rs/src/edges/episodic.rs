//! EpisodicEdge — MENTIONS relationship (EpisodicNode → EntityNode).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Links a bulk episode to an entity inferred from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodicEdge {
    pub uuid: Uuid,
    /// UUID of the source EpisodicNode.
    pub source_node_uuid: Uuid,
    /// UUID of the target EntityNode.
    pub target_node_uuid: Uuid,
    pub group_id: String,
    pub created_at: DateTime<Utc>,
}

impl EpisodicEdge {
    pub fn mentions(episode: Uuid, entity: Uuid, group_id: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            source_node_uuid: episode,
            target_node_uuid: entity,
            group_id: group_id.into(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn episodic_edge_points_from_episode_to_entity() {
        let episode = Uuid::new_v4();
        let entity = Uuid::new_v4();
        let edge = EpisodicEdge::mentions(episode, entity, "carga_2.0");
        assert_eq!(edge.source_node_uuid, episode);
        assert_eq!(edge.target_node_uuid, entity);
        assert_eq!(edge.group_id, "carga_2.0");
    }

    #[test]
    fn episodic_edge_deserializes_from_json() {
        let uuid = Uuid::new_v4();
        let source = Uuid::new_v4();
        let target = Uuid::new_v4();
        let json = format!(
            r#"{{
                "uuid": "{uuid}",
                "source_node_uuid": "{source}",
                "target_node_uuid": "{target}",
                "group_id": "grp",
                "created_at": "2026-01-01T00:00:00Z"
            }}"#
        );
        let edge: EpisodicEdge = serde_json::from_str(&json).unwrap();
        assert_eq!(edge.uuid, uuid);
        assert_eq!(edge.source_node_uuid, source);
        assert_eq!(edge.target_node_uuid, target);
    }
}
