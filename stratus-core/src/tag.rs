use serde::{Deserialize, Serialize};

/// The restic snapshot tag that ties snapshots to a service. Retention groups
/// snapshots by paths and tags, so the tag must stay stable across hosts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tag(pub String);

impl Tag {
    pub fn for_service(name: &str) -> Tag {
        Tag(format!("stratus.{}", name))
    }
}
