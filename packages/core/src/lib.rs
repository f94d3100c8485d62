//! Pure-logic building blocks for querying VAMDC database nodes.
//!
//! This crate has **no I/O**. It turns what a caller knows (a node, a query,
//! a species id) into the strings a node expects, and turns the headers a
//! node sends back into typed metadata. The blocking HTTP engine lives in
//! `vamdc-client`.
//!
//! # Crate layout
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`query`] | [`QueryDescriptor`], the [`Query`] input type, and the fixed query texts |
//! | [`node`] | [`Node`] references and sync endpoint normalisation |
//! | [`species`] | [`SpeciesRef`] and database-prefix stripping |
//! | [`headers`] | [`ResponseHeaders`], the `vamdc-*` header names, date parsing |
//!
//! # Example
//!
//! ```rust
//! use vamdc::{Node, QueryDescriptor};
//!
//! let node = Node::new("ivo://vamdc/cdms", "https://cdms.example.org/tap");
//! let path = QueryDescriptor::new("SELECT SPECIES").query_path().unwrap();
//! let url = format!("{}{}", node.sync_endpoint().unwrap(), path);
//! assert_eq!(
//!     url,
//!     "https://cdms.example.org/tap/sync?REQUEST=doQuery&LANG=VSS2&FORMAT=XSAMS&QUERY=SELECT%20SPECIES"
//! );
//! ```

pub mod headers;
pub mod node;
pub mod query;
pub mod species;

pub use headers::{parse_http_timestamp, DateParseError, ResponseHeaders, METADATA_KEYS};
pub use node::{sync_endpoint, Node};
pub use query::{Query, QueryDescriptor, SPECIES_QUERY};
pub use species::{strip_database_prefix, SpeciesIdError, SpeciesRef};
