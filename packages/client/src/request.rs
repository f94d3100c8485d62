//! Request sessions against a single VAMDC node.
//!
//! A [`Request`] owns one HTTP transaction at a time. The caller points it at
//! a node, assigns a query, and executes; the session records the outcome
//! (status code, reason, body, headers) so that a `None` result can still be
//! diagnosed afterwards.
//!
//! # Lifecycle
//!
//! ```text
//! Request::new ──► set_node / set_base_url ──► set_query ──► execute ─┐
//!                        ▲                        ▲                  │
//!                        └──── reassign (resets status to 0) ◄───────┘
//! ```
//!
//! Assigning a node, a base url or a query resets the status to `0` /
//! `"INIT"`. The session can be re-executed with new queries any number of
//! times.
//!
//! # POST→GET fallback
//!
//! Queries are sent with `POST` by default. Some nodes reject the `POST`
//! form with HTTP 400; in that case the same query path is sent once more
//! with `GET`. A 400 to a `GET` is final.
//!
//! # Transactions
//!
//! Every transaction builds its own blocking HTTP client and connection.
//! Nothing is pooled between calls.

use std::time::Duration;

use chrono::{DateTime, Utc};
use hyper::ext::ReasonPhrase;
use reqwest::blocking::{Client, Response};
use reqwest::{redirect, Method, Url};
use tracing::{debug, info, warn};
use vamdc::{parse_http_timestamp, sync_endpoint, Node, Query, QueryDescriptor, ResponseHeaders};

use crate::config::ClientConfig;
use crate::document::{DocumentParser, QueryResult, XmlText};
use crate::error::RequestError;
use crate::registry::NodeRegistry;

/// Reason recorded when the transport times out.
pub const TIMEOUT_REASON: &str = "Socket timeout";

// ---------------------------------------------------------------------------
// RequestOptions
// ---------------------------------------------------------------------------

/// Per-call options for [`Request::execute`].
#[derive(Debug, Clone)]
pub struct RequestOptions {
    /// HTTP method of the first attempt. Default: `POST`.
    pub method: Method,

    /// Overrides the session timeout for this call.
    pub timeout: Option<Duration>,

    /// Run the document parser on a 200 body. Default: `true`.
    pub parse_content: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            method: Method::POST,
            timeout: None,
            parse_content: true,
        }
    }
}

impl RequestOptions {
    /// Options that skip document parsing and return the raw body only.
    pub fn raw() -> Self {
        Self {
            parse_content: false,
            ..Self::default()
        }
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// A request session against one node.
///
/// Not meant to be shared between threads: every transaction mutates the
/// recorded status, reason and body in place.
#[derive(Debug)]
pub struct Request<P = XmlText> {
    status: u16,
    reason: String,
    verify_https: bool,
    timeout: Duration,
    pub(crate) strict_species_lookup: bool,

    /// Normalised sync endpoint, always ending in `sync?`.
    base_url: Option<String>,
    query_path: Option<String>,

    node: Option<Node>,
    query: Option<QueryDescriptor>,

    xml: Option<Vec<u8>>,
    headers: Option<ResponseHeaders>,
    last_modified: Option<DateTime<Utc>>,

    parser: P,
}

impl Request<XmlText> {
    /// A session that parses documents as UTF-8 text.
    pub fn new(config: &ClientConfig) -> Self {
        Self::with_parser(config, XmlText)
    }
}

impl<P: DocumentParser> Request<P> {
    /// A session that hands 200 bodies to `parser`.
    pub fn with_parser(config: &ClientConfig, parser: P) -> Self {
        Self {
            status: 0,
            reason: "INIT".to_string(),
            verify_https: config.verify_https,
            timeout: config.timeout,
            strict_species_lookup: config.strict_species_lookup,
            base_url: None,
            query_path: None,
            node: None,
            query: None,
            xml: None,
            headers: None,
            last_modified: None,
            parser,
        }
    }

    // ── Configuration ─────────────────────────────────────────────────────────

    /// Point the session at `node`.
    ///
    /// A node without a url clears the base address; executing afterwards
    /// fails with [`RequestError::MissingBaseUrl`] instead of sending.
    pub fn set_node(&mut self, node: &Node) {
        self.reset_status();
        self.base_url = node.sync_endpoint();
        if self.base_url.is_none() {
            warn!("request: url of node {} is empty", node.identifier);
        }
        self.node = Some(node.clone());
    }

    /// Resolve `identifier` through `registry` and point the session at it.
    pub fn set_node_id(
        &mut self,
        registry: &dyn NodeRegistry,
        identifier: &str,
    ) -> Result<(), RequestError> {
        let node = registry.find_node(identifier)?;
        self.set_node(&node);
        Ok(())
    }

    /// Set the base address directly, for nodes that are not registered.
    pub fn set_base_url(&mut self, base_url: &str) {
        self.reset_status();
        self.base_url = if base_url.is_empty() {
            None
        } else {
            Some(sync_endpoint(base_url))
        };
    }

    /// Assign the query for subsequent executions.
    ///
    /// A query with an empty body is ignored: no path can be built from it,
    /// and the previous query and path stay in place.
    pub fn set_query(&mut self, query: impl Into<Query>) {
        self.reset_status();
        let descriptor = query.into().into_descriptor();
        match descriptor.query_path() {
            Some(path) => {
                self.query_path = Some(path);
                self.query = Some(descriptor);
            }
            None => debug!("request: ignoring query with empty body"),
        }
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    pub fn set_verify_https(&mut self, verify: bool) {
        self.verify_https = verify;
    }

    fn reset_status(&mut self) {
        self.status = 0;
        self.reason = "INIT".to_string();
    }

    // ── Accessors ─────────────────────────────────────────────────────────────

    /// HTTP status of the last transaction; `0` before the first one.
    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    pub fn query_path(&self) -> Option<&str> {
        self.query_path.as_deref()
    }

    /// `<base_url><query_path>` once both are known.
    pub fn url(&self) -> Option<String> {
        Some(format!("{}{}", self.base_url.as_ref()?, self.query_path.as_ref()?))
    }

    pub fn node(&self) -> Option<&Node> {
        self.node.as_ref()
    }

    pub fn query(&self) -> Option<&QueryDescriptor> {
        self.query.as_ref()
    }

    /// Body of the last successful query.
    pub fn xml(&self) -> Option<&[u8]> {
        self.xml.as_deref()
    }

    /// Headers of the last 200 response, or the metadata from the last
    /// [`head_request`](Self::head_request).
    pub fn headers(&self) -> Option<&ResponseHeaders> {
        self.headers.as_ref()
    }

    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.last_modified
    }

    pub fn verify_https(&self) -> bool {
        self.verify_https
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    // ── Execution ─────────────────────────────────────────────────────────────

    /// Send the query and classify the response.
    ///
    /// - `200`: the body is wrapped in a [`QueryResult`], populated by the
    ///   parser when `parse_content` is set.
    /// - `400` to a `POST`: retried once with `GET`.
    /// - anything else: `Ok(None)`; see [`status`](Self::status) and
    ///   [`reason`](Self::reason).
    ///
    /// A transport timeout sets the status to 408 and returns
    /// [`RequestError::Timeout`].
    pub fn execute(
        &mut self,
        options: RequestOptions,
    ) -> Result<Option<QueryResult<P::Document>>, RequestError> {
        self.xml = None;
        let timeout = options.timeout.unwrap_or(self.timeout);

        let fallback = [Method::POST, Method::GET];
        let methods = if options.method == Method::POST {
            &fallback[..]
        } else {
            std::slice::from_ref(&options.method)
        };

        for method in methods {
            let Some(response) = self.transmit(method, timeout)? else {
                return Ok(None);
            };
            match self.status {
                200 => return self.assemble(response, options.parse_content),
                400 if *method == Method::POST => {
                    info!("request: node rejected POST with 400, retrying with GET");
                }
                status => {
                    debug!("request: {method} returned {status} {}", self.reason);
                    return Ok(None);
                }
            }
        }

        Ok(None)
    }

    /// Fetch the node's statistics for the current query with `HEAD`.
    ///
    /// On 200 the response headers are stored verbatim. Any other outcome
    /// short of a timeout stores the eight `vamdc-*` counts as `"0"`.
    pub fn head_request(
        &mut self,
        timeout: Option<Duration>,
    ) -> Result<&ResponseHeaders, RequestError> {
        let timeout = timeout.unwrap_or(self.timeout);

        let headers = match self.transmit(&Method::HEAD, timeout)? {
            Some(response) if self.status == 200 => capture_headers(&response),
            Some(_) => {
                match self.status {
                    204 => debug!("request: node has no content for this query"),
                    408 => warn!("request: node reported a timeout"),
                    status => warn!("request: HEAD returned status {status}"),
                }
                ResponseHeaders::zeroed()
            }
            None => ResponseHeaders::zeroed(),
        };

        Ok(&*self.headers.insert(headers))
    }

    /// The `last-modified` time of the current query's document.
    ///
    /// Refreshes the headers with [`head_request`](Self::head_request)
    /// unless the last transaction returned 200. Returns `Ok(None)` when the
    /// node does not say, and [`RequestError::NoContent`] when the node
    /// answered 204.
    pub fn get_last_modified(&mut self) -> Result<Option<DateTime<Utc>>, RequestError> {
        if self.status != 200 {
            self.head_request(None)?;
        }

        let value = self
            .headers
            .as_ref()
            .and_then(|h| h.last_modified())
            .map(str::to_string);

        self.last_modified = match value {
            Some(value) => match parse_http_timestamp(&value) {
                Ok(t) => Some(t),
                Err(e) => {
                    warn!("request: could not parse last-modified: {e}");
                    None
                }
            },
            None if self.status == 204 => return Err(RequestError::NoContent),
            None => None,
        };

        Ok(self.last_modified)
    }

    // ── Transport ─────────────────────────────────────────────────────────────

    /// Send one transaction and record its status.
    ///
    /// `Ok(None)` means no response was obtained for a reason other than a
    /// timeout; the reason text holds the transport error.
    fn transmit(
        &mut self,
        method: &Method,
        timeout: Duration,
    ) -> Result<Option<Response>, RequestError> {
        let base_url = self.base_url.as_deref().ok_or(RequestError::MissingBaseUrl)?;
        let query_path = self.query_path.as_deref().ok_or(RequestError::MissingQuery)?;
        let raw = format!("{base_url}{query_path}");
        let url = Url::parse(&raw).map_err(|e| RequestError::InvalidUrl {
            url: raw.clone(),
            message: e.to_string(),
        })?;

        let client = match Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(!self.verify_https)
            .redirect(redirect::Policy::none())
            .build()
        {
            Ok(c) => c,
            Err(e) => {
                self.status = 0;
                self.reason = format!("failed to build HTTP client: {e}");
                warn!("request: {}", self.reason);
                return Ok(None);
            }
        };

        debug!("request: {method} {url}");
        match client.request(method.clone(), url).send() {
            Ok(response) => {
                let status = response.status();
                self.status = status.as_u16();
                self.reason = reason_of(&response);
                Ok(Some(response))
            }
            Err(e) if e.is_timeout() => Err(self.timed_out(timeout)),
            Err(e) => {
                self.status = 0;
                self.reason = e.to_string();
                warn!("request: {method} to {} failed: {e}", endpoint_of(&raw));
                Ok(None)
            }
        }
    }

    fn timed_out(&mut self, timeout: Duration) -> RequestError {
        self.status = 408;
        self.reason = TIMEOUT_REASON.to_string();
        warn!("request: no response within {timeout:?}");
        RequestError::Timeout
    }

    /// Read a 200 body and wrap it for the caller.
    fn assemble(
        &mut self,
        response: Response,
        parse_content: bool,
    ) -> Result<Option<QueryResult<P::Document>>, RequestError> {
        self.headers = Some(capture_headers(&response));

        let body = match response.bytes() {
            Ok(bytes) => bytes.to_vec(),
            Err(e) if e.is_timeout() => return Err(self.timed_out(self.timeout)),
            Err(e) => {
                self.reason = format!("failed to read response body: {e}");
                warn!("request: {}", self.reason);
                return Ok(None);
            }
        };
        self.xml = Some(body.clone());

        let result = if parse_content {
            QueryResult::populate(body, &self.parser)?
        } else {
            QueryResult::raw(body)
        };
        Ok(Some(result))
    }
}

fn capture_headers(response: &Response) -> ResponseHeaders {
    ResponseHeaders::from_pairs(response.headers().iter().map(|(name, value)| {
        (
            name.as_str().to_string(),
            String::from_utf8_lossy(value.as_bytes()).into_owned(),
        )
    }))
}

/// The node's own reason line, falling back to the canonical phrase. hyper
/// only keeps the received phrase when it differs from the canonical one.
fn reason_of(response: &Response) -> String {
    match response.extensions().get::<ReasonPhrase>() {
        Some(reason) => String::from_utf8_lossy(reason.as_bytes()).into_owned(),
        None => response
            .status()
            .canonical_reason()
            .unwrap_or_default()
            .to_string(),
    }
}

fn endpoint_of(url: &str) -> &str {
    url.split_once('?').map(|(endpoint, _)| endpoint).unwrap_or(url)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::StaticRegistry;

    fn request() -> Request {
        Request::new(&ClientConfig::default())
    }

    #[test]
    fn new_session_is_uninitialised() {
        let r = request();
        assert_eq!(r.status(), 0);
        assert_eq!(r.reason(), "INIT");
        assert!(r.url().is_none());
        assert!(r.verify_https());
    }

    #[test]
    fn base_url_suffix_survives_reassignment() {
        let mut r = request();
        for base in ["http://a.example/tap", "http://b.example/tap/", "http://a.example/tap"] {
            r.set_node(&Node::new("ivo://x", base));
            r.set_query("SELECT SPECIES");
            r.set_query(QueryDescriptor::new("SELECT ALL"));
            let url = r.base_url().unwrap();
            assert!(url.ends_with("/sync?"), "{url}");
            assert!(!url.ends_with("//sync?"), "{url}");
        }
    }

    #[test]
    fn set_base_url_normalises() {
        let mut r = request();
        r.set_base_url("https://node.example/tap/");
        assert_eq!(r.base_url(), Some("https://node.example/tap/sync?"));
        r.set_base_url("https://node.example/tap");
        assert_eq!(r.base_url(), Some("https://node.example/tap/sync?"));
    }

    #[test]
    fn url_joins_endpoint_and_query_path() {
        let mut r = request();
        r.set_node(&Node::new("ivo://x", "http://node.example/tap"));
        r.set_query("SELECT SPECIES");
        assert_eq!(
            r.url().unwrap(),
            "http://node.example/tap/sync?REQUEST=doQuery&LANG=VSS2&FORMAT=XSAMS&QUERY=SELECT%20SPECIES"
        );
    }

    #[test]
    fn empty_query_keeps_previous_path() {
        let mut r = request();
        r.set_query("SELECT SPECIES");
        let before = r.query_path().unwrap().to_string();
        r.set_query("");
        assert_eq!(r.query_path(), Some(before.as_str()));
        assert_eq!(r.query().unwrap().query, "SELECT SPECIES");
    }

    #[test]
    fn node_without_url_cannot_be_sent() {
        let mut r = request();
        r.set_node(&Node::new("ivo://x", "http://node.example/tap"));
        r.set_node(&Node {
            identifier: "ivo://offline".into(),
            name: None,
            url: Some(String::new()),
        });
        r.set_query("SELECT SPECIES");
        assert!(r.base_url().is_none());
        assert!(matches!(
            r.execute(RequestOptions::default()),
            Err(RequestError::MissingBaseUrl)
        ));
        assert_eq!(r.status(), 0);
    }

    #[test]
    fn missing_query_is_refused() {
        let mut r = request();
        r.set_base_url("http://node.example/tap");
        assert!(matches!(r.head_request(None), Err(RequestError::MissingQuery)));
    }

    #[test]
    fn unknown_node_id_is_node_does_not_exist() {
        let mut r = request();
        let registry = StaticRegistry::default();
        assert!(matches!(
            r.set_node_id(&registry, "doesnotexist"),
            Err(RequestError::NodeDoesNotExist(id)) if id == "doesnotexist"
        ));
    }

    #[test]
    fn node_id_resolves_through_registry() {
        let mut r = request();
        let registry = StaticRegistry::new(vec![Node::new("ivo://vamdc/vald", "http://vald.example/tap")]);
        r.set_node_id(&registry, "ivo://vamdc/vald").unwrap();
        assert_eq!(r.base_url(), Some("http://vald.example/tap/sync?"));
        assert_eq!(r.node().unwrap().identifier, "ivo://vamdc/vald");
    }

    #[test]
    fn malformed_base_url_is_an_error() {
        let mut r = request();
        r.set_base_url("not a url");
        r.set_query("SELECT SPECIES");
        assert!(matches!(
            r.execute(RequestOptions::default()),
            Err(RequestError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn raw_options_skip_parsing() {
        let options = RequestOptions::raw().with_method(Method::GET);
        assert!(!options.parse_content);
        assert_eq!(options.method, Method::GET);
        assert!(options.timeout.is_none());
    }
}
