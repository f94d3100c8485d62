//! Error taxonomy for node requests.
//!
//! Only conditions a caller cannot infer from the session's status code are
//! raised as errors. A node answering 404 or 500, or a connection that
//! could not be established, is an `Ok(None)` result with the details left
//! on the session's `status()` and `reason()`.

use vamdc::SpeciesIdError;

use crate::document::ParseError;
use crate::registry::RegistryError;

/// Errors returned by [`Request`](crate::Request) operations.
#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    /// The transport timed out while waiting for the node. The session's
    /// status is set to 408 before this is returned.
    #[error("timeout while waiting for the node")]
    Timeout,

    /// A last-modified time was requested but the node has no content for
    /// the current query (HTTP 204, no `last-modified` header).
    #[error("no content to perform operation on")]
    NoContent,

    /// The node identifier is not in the registry.
    #[error("node does not exist: {0}")]
    NodeDoesNotExist(String),

    /// The registry could not be consulted.
    #[error("registry error: {0}")]
    Registry(RegistryError),

    /// No base address is set; the node is unregistered or has an empty url.
    #[error("no base url set for this request")]
    MissingBaseUrl,

    /// No query has been assigned, or the query body is empty.
    #[error("no query set for this request")]
    MissingQuery,

    /// The base address and query path do not form a valid URL.
    #[error("invalid request url {url:?}: {message}")]
    InvalidUrl { url: String, message: String },

    #[error(transparent)]
    InvalidSpeciesId(#[from] SpeciesIdError),

    /// The document parser rejected a 200 response body.
    #[error("could not populate document: {0}")]
    Parse(#[from] ParseError),
}

impl RequestError {
    /// The HTTP status this error corresponds to, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            RequestError::Timeout => Some(408),
            RequestError::NoContent => Some(204),
            _ => None,
        }
    }
}

impl From<RegistryError> for RequestError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::NodeDoesNotExist(id) => RequestError::NodeDoesNotExist(id),
            other => RequestError::Registry(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_carries_408() {
        assert_eq!(RequestError::Timeout.status(), Some(408));
        assert_eq!(RequestError::MissingQuery.status(), None);
    }

    #[test]
    fn unknown_node_maps_to_node_does_not_exist() {
        let e: RequestError = RegistryError::NodeDoesNotExist("doesnotexist".into()).into();
        assert!(matches!(e, RequestError::NodeDoesNotExist(id) if id == "doesnotexist"));
    }
}
