//! Scoped bearer injection for the transfer widget's outgoing requests.
//!
//! The widget talks to the transfer service through a transport seam. For
//! the duration of a transfer operation, the widget installs an injecting
//! wrapper into its transport slot; the wrapper adds the bearer header to
//! requests bound for the provider's hosts and leaves everything else
//! untouched. Dropping the guard restores the original transport.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use beamline_domain::{BeamlineError, Result};
use tracing::{debug, trace};
use url::Url;

const AUTHORIZATION: &str = "authorization";

/// Hosts that receive the bearer header. Fixed, not configurable: tokens
/// must never leak to third-party endpoints the widget also calls.
const ALLOWED_HOST_SUFFIX: &str = "globus.org";

/// One outgoing request, transport-agnostic.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: String,
    pub url: Url,
    /// Header names are stored lowercased.
    pub headers: BTreeMap<String, String>,
    pub body: Option<Vec<u8>>,
}

impl OutboundRequest {
    #[must_use]
    pub fn get(url: Url) -> Self {
        Self { method: "GET".to_string(), url, headers: BTreeMap::new(), body: None }
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.to_string());
        self
    }
}

/// Status and body of a completed request.
#[derive(Debug, Clone)]
pub struct OutboundResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// The transport seam the widget sends through.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn execute(&self, request: OutboundRequest) -> Result<OutboundResponse>;
}

/// [`HttpTransport`] backed by a shared `reqwest` client.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn execute(&self, request: OutboundRequest) -> Result<OutboundResponse> {
        let method = reqwest::Method::from_bytes(request.method.as_bytes())
            .map_err(|err| BeamlineError::InvalidInput(err.to_string()))?;

        let mut builder = self.client.request(method, request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|err| BeamlineError::Network(err.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|err| BeamlineError::Network(err.to_string()))?
            .to_vec();
        Ok(OutboundResponse { status, body })
    }
}

/// Wraps an inner transport and injects `Authorization: Bearer …` into
/// requests bound for allow-listed hosts, unless the caller already set
/// the header.
pub struct TransportAuthInjector {
    inner: Arc<dyn HttpTransport>,
    access_token: String,
}

impl TransportAuthInjector {
    #[must_use]
    pub fn new(inner: Arc<dyn HttpTransport>, access_token: impl Into<String>) -> Self {
        Self { inner, access_token: access_token.into() }
    }

    fn host_allowed(url: &Url) -> bool {
        let Some(host) = url.host_str() else { return false };
        host == ALLOWED_HOST_SUFFIX || host.ends_with(&format!(".{ALLOWED_HOST_SUFFIX}"))
    }
}

#[async_trait]
impl HttpTransport for TransportAuthInjector {
    async fn execute(&self, mut request: OutboundRequest) -> Result<OutboundResponse> {
        if Self::host_allowed(&request.url) && !request.headers.contains_key(AUTHORIZATION) {
            trace!(host = ?request.url.host_str(), "injecting bearer header");
            request
                .headers
                .insert(AUTHORIZATION.to_string(), format!("Bearer {}", self.access_token));
        }
        self.inner.execute(request).await
    }
}

/// Component-scoped slot holding the transport the widget currently sends
/// through.
#[derive(Clone)]
pub struct TransportSlot {
    current: Arc<Mutex<Arc<dyn HttpTransport>>>,
}

impl TransportSlot {
    #[must_use]
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { current: Arc::new(Mutex::new(transport)) }
    }

    /// The transport currently installed.
    #[must_use]
    pub fn current(&self) -> Arc<dyn HttpTransport> {
        Arc::clone(&lock_recovering(&self.current))
    }

    /// Install an injecting wrapper for the scope of the returned guard.
    ///
    /// The original transport is restored when the guard drops, on every
    /// exit path of the calling operation.
    #[must_use]
    pub fn install_bearer(&self, access_token: &str) -> TransportGuard {
        let original = {
            let mut slot = lock_recovering(&self.current);
            let original = Arc::clone(&slot);
            *slot = Arc::new(TransportAuthInjector::new(Arc::clone(&original), access_token));
            original
        };
        debug!("bearer-injecting transport installed");
        TransportGuard { slot: Arc::clone(&self.current), original }
    }
}

/// Restores the slot's original transport on drop.
pub struct TransportGuard {
    slot: Arc<Mutex<Arc<dyn HttpTransport>>>,
    original: Arc<dyn HttpTransport>,
}

impl Drop for TransportGuard {
    fn drop(&mut self) {
        *lock_recovering(&self.slot) = Arc::clone(&self.original);
        debug!("original transport restored");
    }
}

fn lock_recovering<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
