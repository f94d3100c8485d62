//! Shared helpers for the VAMDC request engine conformance suite.
//!
//! Provides [`MockNode`]: an in-process HTTP server bound to an ephemeral
//! port that records every request it receives and answers with whatever a
//! test-supplied behaviour returns. The server runs on its own tokio runtime
//! in a background thread, so tests can drive it with the blocking client
//! from plain `#[test]` functions. [`MockNode::spawn_tls`] serves the same
//! behaviour over HTTPS with a freshly generated self-signed certificate.

use std::net::SocketAddr;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use axum_server::tls_rustls::RustlsConfig;
use hyper::ext::ReasonPhrase;
use vamdc::Node;

// ---------------------------------------------------------------------------
// Recorded requests
// ---------------------------------------------------------------------------

/// One request as seen by the mock node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    /// Raw (still percent-encoded) query string.
    pub query: String,
}

impl Recorded {
    /// The decoded `QUERY=` parameter, or `""` if absent.
    pub fn query_text(&self) -> String {
        self.param("QUERY")
            .and_then(|q| urlencoding::decode(q).ok())
            .map(|q| q.into_owned())
            .unwrap_or_default()
    }

    /// A raw query-string parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.query.split('&').find_map(|pair| {
            let (k, v) = pair.split_once('=')?;
            (k == name).then_some(v)
        })
    }
}

/// Requests received by a [`MockNode`], in arrival order.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<Recorded>>>);

impl CallLog {
    pub fn calls(&self) -> Vec<Recorded> {
        self.0.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn methods(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.method).collect()
    }

    pub fn len(&self) -> usize {
        self.calls().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&self, call: Recorded) {
        if let Ok(mut calls) = self.0.lock() {
            calls.push(call);
        }
    }
}

// ---------------------------------------------------------------------------
// Replies
// ---------------------------------------------------------------------------

/// What the mock node answers with.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    /// Reason line to send instead of the canonical phrase.
    pub reason: Option<String>,
    /// Sleep this long before answering.
    pub delay: Option<Duration>,
}

impl Reply {
    pub fn status(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
            reason: None,
            delay: None,
        }
    }

    /// 200 with an XML body.
    pub fn xml(body: impl Into<Vec<u8>>) -> Self {
        Self::status(200)
            .header("content-type", "text/xml")
            .body(body)
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

// ---------------------------------------------------------------------------
// MockNode
// ---------------------------------------------------------------------------

type Behaviour = dyn Fn(&Recorded) -> Reply + Send + Sync;

#[derive(Clone)]
struct MockState {
    log: CallLog,
    behaviour: Arc<Behaviour>,
}

/// A running mock node.
pub struct MockNode {
    /// Base address of the node, e.g. `http://127.0.0.1:51234/tap`.
    pub base_url: String,
    pub log: CallLog,
}

impl MockNode {
    /// Start a node that answers every request with `behaviour(&request)`.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound or the server fails to start.
    pub fn spawn<F>(behaviour: F) -> Self
    where
        F: Fn(&Recorded) -> Reply + Send + Sync + 'static,
    {
        let (router, log) = mock_router(behaviour);
        let base_url = format!("{}/tap", spawn_node(router));
        Self { base_url, log }
    }

    /// Like [`spawn`](Self::spawn), but over HTTPS with a self-signed
    /// certificate for `localhost` / `127.0.0.1`.
    ///
    /// # Panics
    ///
    /// Panics if the certificate cannot be generated or the server fails to
    /// start.
    pub fn spawn_tls<F>(behaviour: F) -> Self
    where
        F: Fn(&Recorded) -> Reply + Send + Sync + 'static,
    {
        let (router, log) = mock_router(behaviour);
        let base_url = format!("{}/tap", spawn_tls_node(router));
        Self { base_url, log }
    }

    /// A node reference pointing at this mock.
    pub fn node(&self) -> Node {
        Node::new("ivo://vamdc/mock", &self.base_url).with_name("mock")
    }
}

fn mock_router<F>(behaviour: F) -> (Router, CallLog)
where
    F: Fn(&Recorded) -> Reply + Send + Sync + 'static,
{
    let log = CallLog::default();
    let state = MockState {
        log: log.clone(),
        behaviour: Arc::new(behaviour),
    };
    (Router::new().fallback(handle).with_state(state), log)
}

async fn handle(State(state): State<MockState>, method: Method, uri: Uri) -> Response {
    let call = Recorded {
        method: method.as_str().to_string(),
        path: uri.path().to_string(),
        query: uri.query().unwrap_or_default().to_string(),
    };
    state.log.push(call.clone());
    let reply = (state.behaviour)(&call);

    if let Some(delay) = reply.delay {
        tokio::time::sleep(delay).await;
    }

    let mut builder = axum::http::Response::builder().status(reply.status);
    for (name, value) in &reply.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    if let Some(reason) = reply.reason.and_then(|r| ReasonPhrase::try_from(r).ok()) {
        builder = builder.extension(reason);
    }
    builder
        .body(Body::from(reply.body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

/// Serve `router` on an ephemeral `127.0.0.1` port and return
/// `http://127.0.0.1:PORT`.
///
/// The server gets its own runtime on a background thread; blocking HTTP
/// clients must not run inside a tokio runtime.
///
/// # Panics
///
/// Panics if the listener cannot be bound or the runtime cannot be built.
pub fn spawn_node(router: Router) -> String {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .expect("build mock node runtime");
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
                .await
                .expect("bind ephemeral port");
            tx.send(listener.local_addr().expect("get local addr"))
                .expect("report mock node address");
            axum::serve(listener, router).await.expect("mock node error");
        });
    });
    let addr = rx.recv().expect("mock node failed to start");
    format!("http://{addr}")
}

/// Serve `router` over HTTPS on an ephemeral `127.0.0.1` port and return
/// `https://127.0.0.1:PORT`.
///
/// # Panics
///
/// Panics if the certificate cannot be generated, or the listener cannot be
/// bound.
pub fn spawn_tls_node(router: Router) -> String {
    let cert = rcgen::generate_simple_self_signed(vec![
        "localhost".to_string(),
        "127.0.0.1".to_string(),
    ])
    .expect("generate self-signed certificate");
    let cert_pem = cert.cert.pem().into_bytes();
    let key_pem = cert.key_pair.serialize_pem().into_bytes();

    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()
            .expect("build mock node runtime");
        runtime.block_on(async move {
            let tls = RustlsConfig::from_pem(cert_pem, key_pem)
                .await
                .expect("load mock node certificate");
            let handle = axum_server::Handle::new();
            let server = axum_server::bind_rustls(SocketAddr::from(([127, 0, 0, 1], 0)), tls)
                .handle(handle.clone())
                .serve(router.into_make_service());
            let serving = tokio::spawn(server);
            let addr = handle.listening().await.expect("mock node failed to listen");
            tx.send(addr).expect("report mock node address");
            serving
                .await
                .expect("mock node task panicked")
                .expect("mock node error");
        });
    });
    let addr = rx.recv().expect("mock node failed to start");
    format!("https://{addr}")
}
