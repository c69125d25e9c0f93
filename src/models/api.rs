//! JSON shapes returned by the remote REST API.
//!
//! Only the fields the mirror depends on are modelled; everything else in
//! the responses is ignored.

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::Value;

use crate::error::{AppError, Result};

/// Decode a fetched JSON value, reporting missing fields as malformed.
pub fn decode<T: DeserializeOwned>(value: Value, context: &str) -> Result<T> {
    serde_json::from_value(value).map_err(|e| AppError::malformed(context, e))
}

/// One page of a cursor-linked listing.
#[derive(Debug, Clone, Deserialize)]
pub struct ListPage {
    #[serde(default)]
    pub results: Vec<ListResult>,
    #[serde(rename = "_links", default)]
    pub links: Links,
    #[serde(default)]
    pub start: u64,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub limit: u64,
}

impl ListPage {
    /// Relative link to the next page, absent on the last page.
    pub fn next(&self) -> Option<&str> {
        self.links.next.as_deref()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListResult {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Links {
    pub next: Option<String>,
    pub download: Option<String>,
}

/// A single content item expanded with `body.view,history`.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentPage {
    pub title: String,
    pub history: History,
    pub body: Body,
}

#[derive(Debug, Clone, Deserialize)]
pub struct History {
    #[serde(rename = "createdBy")]
    pub created_by: Author,
    #[serde(rename = "createdDate")]
    pub created_date: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Author {
    #[serde(rename = "displayName")]
    pub display_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Body {
    pub view: BodyView,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BodyView {
    pub value: String,
}

/// Child listing (`/child/comment`, `/child/attachment`).
#[derive(Debug, Clone, Deserialize)]
pub struct ChildPage {
    #[serde(default)]
    pub results: Vec<ChildResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChildResult {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(rename = "_links", default)]
    pub links: Links,
}

/// Space description, used for the index title.
#[derive(Debug, Clone, Deserialize)]
pub struct SpacePage {
    pub name: String,
}

/// Ids are numeric strings, but accept bare numbers too.
fn id_string<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!("expected id, got {other}"))),
    }
}
