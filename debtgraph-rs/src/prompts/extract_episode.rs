//! Entity and relation extraction from a bulk dataset episode.

use crate::errors::Result;
use crate::llm_client::Message;
use crate::pipeline::episode::EpisodeSubmission;

const SYSTEM: &str = "You are an assistant that builds knowledge graphs from debt-collection \
records. You only report entities and relations that are explicitly present in the input. \
You never invent identifiers, amounts or dates.";

/// Build the conversation asking the model to extract a typed graph from
/// `submission`'s content, restricted to its hinted types.
pub fn messages(submission: &EpisodeSubmission) -> Result<Vec<Message>> {
    let entity_types = serde_json::to_string_pretty(&submission.entity_types)?;
    let edge_types = serde_json::to_string_pretty(&submission.edge_types)?;
    let edge_type_map = serde_json::to_string_pretty(&submission.edge_type_map)?;

    let user = format!(
        r#"<ENTITY TYPES>
{entity_types}
</ENTITY TYPES>

<RELATION TYPES>
{edge_types}
</RELATION TYPES>

<ALLOWED RELATIONS>
{edge_type_map}
</ALLOWED RELATIONS>

<EPISODE name="{name}" source="{source_description}">
{content}
</EPISODE>

Extract every entity of the listed ENTITY TYPES mentioned in the EPISODE.
- `name` must be the most specific name available (customer name, agent id, record id).
- `entity_type` must be one of the ENTITY TYPES keys.
- `attributes` holds only fields defined by that type's schema.

Then extract the relations between those entities.
- `relation_type` must be one of the RELATION TYPES keys.
- A relation is valid only if its (source type, target type) pair lists it in ALLOWED RELATIONS.
- `source` and `target` must repeat an extracted entity `name` exactly.
- `fact` is one short sentence describing the relation."#,
        name = submission.episode.name,
        source_description = submission.episode.source_description,
        content = submission.episode.content,
    );

    Ok(vec![Message::system(SYSTEM), Message::user(user)])
}
