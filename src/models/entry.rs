//! Listed entry data structure.

use serde::{Deserialize, Serialize};

use super::api::ListResult;

/// One row of the mirror index: a discovered item and its kind.
///
/// Identity is `id`; the serialized column names match the index file header.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ListedEntry {
    /// Remote identifier (numeric string)
    #[serde(rename = "ID")]
    pub id: String,

    /// Content kind, e.g. `blogpost`
    #[serde(rename = "type")]
    pub kind: String,

    /// Title at listing time
    pub title: String,
}

impl ListedEntry {
    pub fn new(id: impl Into<String>, kind: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            title: title.into(),
        }
    }
}

impl From<ListResult> for ListedEntry {
    fn from(result: ListResult) -> Self {
        Self {
            id: result.id,
            kind: result.kind,
            title: result.title,
        }
    }
}
