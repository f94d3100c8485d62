//! Query descriptors and the query path sent to a node's `sync` endpoint.
//!
//! A VAMDC node accepts a query as four URL parameters appended to its sync
//! endpoint:
//!
//! ```text
//! REQUEST=doQuery&LANG=VSS2&FORMAT=XSAMS&QUERY=SELECT%20SPECIES
//! └── op ───────┘ └─ lang ┘ └─ format ─┘ └─ percent-encoded body ─┘
//! ```
//!
//! Only the query body is percent-encoded; the other three fields are
//! protocol keywords and are written as-is.

use serde::{Deserialize, Serialize};
use urlencoding::encode;

/// Default operation keyword.
pub const DEFAULT_REQUEST: &str = "doQuery";
/// Default query language tag.
pub const DEFAULT_LANG: &str = "VSS2";
/// Default output format tag.
pub const DEFAULT_FORMAT: &str = "XSAMS";

/// Lists every species on a node. The InChIKey stub `UGFAIRIUMAVXCW` is a
/// placeholder some nodes publish and is excluded by convention.
pub const SPECIES_QUERY: &str = "SELECT SPECIES WHERE ((InchiKey != 'UGFAIRIUMAVXCW'))";

/// A normalised protocol query: operation, language, output format, body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueryDescriptor {
    pub request: String,
    pub lang: String,
    pub format: String,
    pub query: String,
}

impl QueryDescriptor {
    /// A descriptor for `query` with the default operation, language and format.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            request: DEFAULT_REQUEST.to_string(),
            lang: DEFAULT_LANG.to_string(),
            format: DEFAULT_FORMAT.to_string(),
            query: query.into(),
        }
    }

    pub fn with_request(mut self, request: impl Into<String>) -> Self {
        self.request = request.into();
        self
    }

    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = lang.into();
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    /// `REQUEST=<op>&LANG=<lang>&FORMAT=<fmt>&QUERY=<encoded body>`
    ///
    /// Returns `None` when the body is empty: there is nothing to transmit.
    /// The body is percent-encoded except for unreserved characters and `/`.
    pub fn query_path(&self) -> Option<String> {
        if self.query.trim().is_empty() {
            return None;
        }
        Some(format!(
            "REQUEST={}&LANG={}&FORMAT={}&QUERY={}",
            self.request,
            self.lang,
            self.format,
            encode_body(&self.query)
        ))
    }
}

fn encode_body(body: &str) -> String {
    body.split('/').map(encode).collect::<Vec<_>>().join("/")
}

/// What a caller may hand to a request session as its query.
///
/// Plain text is promoted to a [`QueryDescriptor`] with default operation,
/// language and format the moment it is assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    Text(String),
    Descriptor(QueryDescriptor),
}

impl Query {
    pub fn into_descriptor(self) -> QueryDescriptor {
        match self {
            Query::Text(text) => QueryDescriptor::new(text),
            Query::Descriptor(descriptor) => descriptor,
        }
    }
}

impl From<&str> for Query {
    fn from(s: &str) -> Self {
        Query::Text(s.to_string())
    }
}

impl From<String> for Query {
    fn from(s: String) -> Self {
        Query::Text(s)
    }
}

impl From<QueryDescriptor> for Query {
    fn from(d: QueryDescriptor) -> Self {
        Query::Descriptor(d)
    }
}

/// `SELECT RadiativeTransitions WHERE SpeciesID = <id>`
pub fn transitions_query(species_id: i64) -> String {
    format!("SELECT RadiativeTransitions WHERE SpeciesID = {species_id}")
}

/// `SELECT ALL WHERE SpeciesID=<id>` — `id` is the node-local identifier
/// with any database prefix already removed.
pub fn species_data_query(species_id: &str) -> String {
    format!("SELECT ALL WHERE SpeciesID={species_id}")
}

/// `SELECT ALL WHERE VAMDCSpeciesID='<id>'`
pub fn vamdc_species_data_query(vamdc_species_id: &str) -> String {
    format!("SELECT ALL WHERE VAMDCSpeciesID='{vamdc_species_id}'")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_query_gets_protocol_defaults() {
        let d = Query::from("SELECT SPECIES").into_descriptor();
        assert_eq!(d.request, "doQuery");
        assert_eq!(d.lang, "VSS2");
        assert_eq!(d.format, "XSAMS");
        assert_eq!(d.query, "SELECT SPECIES");
    }

    #[test]
    fn query_path_encodes_only_the_body() {
        let path = QueryDescriptor::new("SELECT ALL WHERE SpeciesID=7")
            .query_path()
            .unwrap();
        assert_eq!(
            path,
            "REQUEST=doQuery&LANG=VSS2&FORMAT=XSAMS&QUERY=SELECT%20ALL%20WHERE%20SpeciesID%3D7"
        );
    }

    #[test]
    fn query_path_uses_custom_fields_verbatim() {
        let path = QueryDescriptor::new("x")
            .with_request("doQuery")
            .with_lang("VSS1")
            .with_format("XSAMS-2")
            .query_path()
            .unwrap();
        assert!(path.starts_with("REQUEST=doQuery&LANG=VSS1&FORMAT=XSAMS-2&QUERY="));
    }

    #[test]
    fn species_query_encodes_quotes_and_parens() {
        let path = QueryDescriptor::new(SPECIES_QUERY).query_path().unwrap();
        assert!(path.ends_with(
            "QUERY=SELECT%20SPECIES%20WHERE%20%28%28InchiKey%20%21%3D%20%27UGFAIRIUMAVXCW%27%29%29"
        ));
    }

    #[test]
    fn slashes_in_the_body_stay_literal() {
        let path = QueryDescriptor::new("SELECT ALL WHERE Reference = 'a/b'")
            .query_path()
            .unwrap();
        assert!(path.ends_with("QUERY=SELECT%20ALL%20WHERE%20Reference%20%3D%20%27a/b%27"));
    }

    #[test]
    fn empty_body_has_no_path() {
        assert_eq!(QueryDescriptor::new("").query_path(), None);
        assert_eq!(QueryDescriptor::new("   ").query_path(), None);
    }

    #[test]
    fn species_listing_excludes_placeholder_key() {
        assert!(SPECIES_QUERY.contains("!= 'UGFAIRIUMAVXCW'"));
    }

    #[test]
    fn helper_query_texts() {
        assert_eq!(
            transitions_query(42),
            "SELECT RadiativeTransitions WHERE SpeciesID = 42"
        );
        assert_eq!(species_data_query("123"), "SELECT ALL WHERE SpeciesID=123");
        assert_eq!(
            vamdc_species_data_query("XYZ"),
            "SELECT ALL WHERE VAMDCSpeciesID='XYZ'"
        );
    }
}
