//! EpisodicNode — an opaque bulk document submitted in episode mode.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The source type of an episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EpisodeType {
    Message,
    Json,
    Text,
}

impl EpisodeType {
    pub fn as_str(self) -> &'static str {
        match self {
            EpisodeType::Message => "message",
            EpisodeType::Json => "json",
            EpisodeType::Text => "text",
        }
    }
}

/// A whole dataset stored as one unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpisodicNode {
    pub uuid: Uuid,
    pub name: String,
    pub group_id: String,
    pub created_at: DateTime<Utc>,
    pub source: EpisodeType,
    pub source_description: String,
    pub content: String,
    /// Reference time of the episode's content.
    pub valid_at: DateTime<Utc>,
}

impl EpisodicNode {
    /// Build a JSON episode whose creation and reference time are the same
    /// single timestamp capture.
    pub fn json(
        name: impl Into<String>,
        group_id: impl Into<String>,
        source_description: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            group_id: group_id.into(),
            created_at: now,
            source: EpisodeType::Json,
            source_description: source_description.into(),
            content: content.into(),
            valid_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{EpisodeType, EpisodicNode};

    #[test]
    fn test_json_episode_uses_one_timestamp() {
        let node = EpisodicNode::json("Dataset completo", "carga_2.0", "full load", "{}");
        assert_eq!(node.source, EpisodeType::Json);
        assert_eq!(node.created_at, node.valid_at);
        assert_eq!(node.group_id, "carga_2.0");
    }

    #[test]
    fn test_episode_type_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&EpisodeType::Json).unwrap(), "\"json\"");
        assert_eq!(serde_json::to_string(&EpisodeType::Message).unwrap(), "\"message\"");
        let parsed: EpisodeType = serde_json::from_str("\"text\"").unwrap();
        assert_eq!(parsed, EpisodeType::Text);
    }

    #[test]
    fn test_episodic_node_serde_roundtrip() {
        let node = EpisodicNode::json(
            "Dataset completo",
            "grp",
            "Full load",
            r#"{"clientes": [], "interacciones": []}"#,
        );
        let json = serde_json::to_string(&node).expect("serialize");
        let restored: EpisodicNode = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(restored, node);
    }
}
