//! Core data models.
//!
//! [`Record`] is what the index stores and search returns. [`Page`] and
//! [`RemoteRecord`] describe the JSON the remote collection serves; they are
//! the only place the remote's field names (`author.username`, `code`) appear.

use serde::{Deserialize, Serialize};

use crate::normalize::normalize_name;

/// One indexed row, keyed by `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub id: String,
    /// Owning author's identifier.
    pub handle: String,
    pub name: String,
    /// Space-separated form of `name`, empty when the name has no word
    /// separators to split on. Only used for matching.
    pub normalized_name: String,
    pub body: String,
}

impl Record {
    pub fn new(
        id: impl Into<String>,
        handle: impl Into<String>,
        name: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        let name = name.into();
        let normalized_name = normalize_name(&name).unwrap_or_default();
        Self {
            id: id.into(),
            handle: handle.into(),
            name,
            normalized_name,
            body: body.into(),
        }
    }
}

impl From<RemoteRecord> for Record {
    fn from(remote: RemoteRecord) -> Self {
        Record::new(remote.id, remote.author.username, remote.name, remote.code)
    }
}

/// One page of the remote collection.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Page {
    pub data: Vec<RemoteRecord>,
    pub links: PageLinks,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PageLinks {
    /// Absolute URL of the following page; absent or null on the last page.
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RemoteRecord {
    pub id: String,
    pub name: String,
    pub author: RemoteAuthor,
    pub code: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RemoteAuthor {
    pub username: String,
}
