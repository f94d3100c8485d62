//! Node registry lookup.
//!
//! The VAMDC registry maps node identifiers to base addresses. The request
//! engine only ever needs one operation from it, [`NodeRegistry::find_node`],
//! so the registry is a trait and the engine does not care whether the
//! answer came from a live registry service or a file on disk.
//!
//! [`StaticRegistry`] is the bundled implementation: a fixed list of nodes,
//! typically loaded from a JSON file:
//!
//! ```json
//! [
//!   { "identifier": "ivo://vamdc/cdms/vamdc-tap_12.07",
//!     "name": "CDMS",
//!     "url": "https://cdms.astro.uni-koeln.de/cdms/tap/" }
//! ]
//! ```

use std::path::Path;

use vamdc::Node;

/// Errors that registry lookups can return.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// No node with this identifier (or name) is registered.
    #[error("node does not exist: {0}")]
    NodeDoesNotExist(String),

    #[error("failed to read node list {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("invalid node list: {0}")]
    Json(#[from] serde_json::Error),
}

/// Resolves node identifiers to [`Node`] references.
pub trait NodeRegistry {
    fn find_node(&self, identifier: &str) -> Result<Node, RegistryError>;
}

/// A registry backed by a fixed, in-memory list of nodes.
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    nodes: Vec<Node>,
}

impl StaticRegistry {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    pub fn from_json_str(json: &str) -> Result<Self, RegistryError> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| RegistryError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }
}

impl NodeRegistry for StaticRegistry {
    /// Exact identifier match first, then a case-insensitive name match.
    fn find_node(&self, identifier: &str) -> Result<Node, RegistryError> {
        self.nodes
            .iter()
            .find(|n| n.identifier == identifier)
            .or_else(|| {
                self.nodes.iter().find(|n| {
                    n.name
                        .as_deref()
                        .is_some_and(|name| name.eq_ignore_ascii_case(identifier))
                })
            })
            .cloned()
            .ok_or_else(|| RegistryError::NodeDoesNotExist(identifier.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn registry() -> StaticRegistry {
        StaticRegistry::new(vec![
            Node::new("ivo://vamdc/cdms", "https://cdms.example.org/tap/").with_name("CDMS"),
            Node {
                identifier: "ivo://vamdc/offline".into(),
                name: None,
                url: None,
            },
        ])
    }

    #[test]
    fn finds_by_identifier() {
        let node = registry().find_node("ivo://vamdc/cdms").unwrap();
        assert_eq!(node.url.as_deref(), Some("https://cdms.example.org/tap/"));
    }

    #[test]
    fn finds_by_name_case_insensitively() {
        let node = registry().find_node("cdms").unwrap();
        assert_eq!(node.identifier, "ivo://vamdc/cdms");
    }

    #[test]
    fn unregistered_node_is_an_error() {
        assert!(matches!(
            registry().find_node("doesnotexist"),
            Err(RegistryError::NodeDoesNotExist(id)) if id == "doesnotexist"
        ));
    }

    #[test]
    fn node_without_url_is_still_found() {
        let node = registry().find_node("ivo://vamdc/offline").unwrap();
        assert!(node.url.is_none());
    }

    #[test]
    fn loads_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"identifier":"ivo://vamdc/vald","name":"VALD","url":"http://vald.example.org/tap"}}]"#
        )
        .unwrap();

        let registry = StaticRegistry::from_json_file(file.path()).unwrap();
        assert_eq!(registry.nodes().len(), 1);
        assert_eq!(registry.find_node("VALD").unwrap().identifier, "ivo://vamdc/vald");
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(matches!(
            StaticRegistry::from_json_file("/nonexistent/nodes.json"),
            Err(RegistryError::Io { .. })
        ));
    }
}
