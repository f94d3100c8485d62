//! Blocking request engine for VAMDC database nodes.
//!
//! A VAMDC node answers queries on its `sync` endpoint with an XSAMS
//! document, and answers `HEAD` requests with statistics about that
//! document. This crate sends those requests and classifies the answers:
//!
//! | Outcome | Returned as |
//! |---------|-------------|
//! | 200 | `Ok(Some(QueryResult))` |
//! | 400 to a `POST` | retried once as `GET` |
//! | transport timeout | `Err(RequestError::Timeout)`, status 408 |
//! | anything else | `Ok(None)`, details on `Request::status` / `Request::reason` |
//!
//! # Quick start
//!
//! ```rust,no_run
//! use vamdc::Node;
//! use vamdc_client::{ClientConfig, Request, RequestOptions};
//!
//! let mut request = Request::new(&ClientConfig::default());
//! request.set_node(&Node::new("ivo://vamdc/cdms", "https://cdms.example.org/tap/"));
//! request.set_query("SELECT SPECIES");
//!
//! match request.execute(RequestOptions::default())? {
//!     Some(result) => println!("{} bytes", result.content.len()),
//!     None => eprintln!("no data: {} {}", request.status(), request.reason()),
//! }
//! # Ok::<(), vamdc_client::RequestError>(())
//! ```

pub mod client;
pub mod config;
pub mod document;
pub mod error;
pub mod helpers;
pub mod registry;
pub mod request;

pub use client::{Client, NodeSpec};
pub use config::{ClientConfig, ConfigError};
pub use document::{DocumentParser, ParseError, QueryResult, XmlText};
pub use error::RequestError;
pub use helpers::{get_species_data, get_transitions};
pub use registry::{NodeRegistry, RegistryError, StaticRegistry};
pub use request::{Request, RequestOptions};

pub use reqwest::Method;
