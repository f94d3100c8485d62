//! Node references and sync endpoint normalisation.

use serde::{Deserialize, Serialize};

/// A VAMDC database node as known to a registry.
///
/// `url` is the node's base address, e.g.
/// `https://vamdc.example.org/tap`. It may be absent for nodes that are
/// registered but not currently reachable; such a node cannot be queried.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Node {
    /// Registry identifier, e.g. `ivo://vamdc/cdms/vamdc-tap_12.07`.
    pub identifier: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl Node {
    pub fn new(identifier: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            name: None,
            url: Some(url.into()),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// The node's sync endpoint, or `None` if it has no base address.
    pub fn sync_endpoint(&self) -> Option<String> {
        match self.url.as_deref() {
            Some(url) if !url.is_empty() => Some(sync_endpoint(url)),
            _ => None,
        }
    }
}

/// Append the sync suffix to a base address so that `<endpoint><querypath>`
/// is a complete request URL.
///
/// `http://host/tap/` → `http://host/tap/sync?`
/// `http://host/tap`  → `http://host/tap/sync?`
pub fn sync_endpoint(base: &str) -> String {
    if base.ends_with('/') {
        format!("{base}sync?")
    } else {
        format!("{base}/sync?")
    }
}
