//! Node-level entry point bundling configuration and a registry.

use vamdc::{Node, SpeciesRef};

use crate::config::ClientConfig;
use crate::document::{QueryResult, XmlText};
use crate::error::RequestError;
use crate::helpers::{get_species_data, get_transitions};
use crate::registry::{NodeRegistry, StaticRegistry};
use crate::request::Request;

/// A node given either by registry identifier or as a resolved reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeSpec {
    Id(String),
    Node(Node),
}

impl From<&str> for NodeSpec {
    fn from(id: &str) -> Self {
        NodeSpec::Id(id.to_string())
    }
}

impl From<String> for NodeSpec {
    fn from(id: String) -> Self {
        NodeSpec::Id(id)
    }
}

impl From<Node> for NodeSpec {
    fn from(node: Node) -> Self {
        NodeSpec::Node(node)
    }
}

type TextResult = Result<Option<QueryResult<String>>, RequestError>;

/// Opens request sessions against nodes.
///
/// Each call returns or uses a fresh [`Request`]; nothing is shared between
/// sessions except the configuration and the registry.
pub struct Client {
    config: ClientConfig,
    registry: Box<dyn NodeRegistry>,
}

impl Client {
    pub fn new(config: ClientConfig, registry: Box<dyn NodeRegistry>) -> Self {
        Self { config, registry }
    }

    /// Build a client whose registry is the node list in
    /// `config.nodes_file`, or an empty registry when none is configured.
    pub fn from_config(config: ClientConfig) -> Result<Self, RequestError> {
        let registry = match &config.nodes_file {
            Some(path) => StaticRegistry::from_json_file(path)?,
            None => StaticRegistry::default(),
        };
        Ok(Self::new(config, Box::new(registry)))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn find_node(&self, identifier: &str) -> Result<Node, RequestError> {
        Ok(self.registry.find_node(identifier)?)
    }

    /// A session pointed at `node`.
    ///
    /// Fails with [`RequestError::NodeDoesNotExist`] when an identifier is
    /// not registered.
    pub fn request(&self, node: impl Into<NodeSpec>) -> Result<Request, RequestError> {
        let mut request = Request::new(&self.config);
        match node.into() {
            NodeSpec::Id(id) => request.set_node_id(self.registry.as_ref(), &id)?,
            NodeSpec::Node(node) => request.set_node(&node),
        }
        Ok(request)
    }

    pub fn species(&self, node: impl Into<NodeSpec>) -> TextResult {
        self.request(node)?.get_species()
    }

    pub fn transitions(
        &self,
        node: impl Into<NodeSpec>,
        species: impl Into<SpeciesRef>,
    ) -> TextResult {
        get_transitions(&mut self.request(node)?, species)
    }

    pub fn species_data(
        &self,
        node: impl Into<NodeSpec>,
        species_id: Option<&str>,
        vamdc_species_id: Option<&str>,
    ) -> TextResult {
        get_species_data(&mut self.request(node)?, species_id, vamdc_species_id)
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> Client {
        Client::new(
            ClientConfig::default(),
            Box::new(StaticRegistry::new(vec![Node::new(
                "ivo://vamdc/cdms",
                "https://cdms.example.org/tap/",
            )])),
        )
    }

    #[test]
    fn request_by_identifier() {
        let r = client().request("ivo://vamdc/cdms").unwrap();
        assert_eq!(r.base_url(), Some("https://cdms.example.org/tap/sync?"));
    }

    #[test]
    fn request_by_node_skips_registry() {
        let r = client()
            .request(Node::new("ivo://unregistered", "http://local.example/tap"))
            .unwrap();
        assert_eq!(r.base_url(), Some("http://local.example/tap/sync?"));
    }

    #[test]
    fn unregistered_identifier_is_node_does_not_exist() {
        assert!(matches!(
            client().request("doesnotexist"),
            Err(RequestError::NodeDoesNotExist(id)) if id == "doesnotexist"
        ));
    }

    #[test]
    fn invalid_species_id_fails_before_sending() {
        let c = client();
        assert!(matches!(
            c.transitions("ivo://vamdc/cdms", "cdms-water"),
            Err(RequestError::InvalidSpeciesId(_))
        ));
    }

    #[test]
    fn from_config_without_nodes_file_has_empty_registry() {
        let c = Client::from_config(ClientConfig::default()).unwrap();
        assert!(c.find_node("ivo://vamdc/cdms").is_err());
    }
}
