//! HTTP transport seam
//!
//! `FragmentsClient` builds plain request values and hands them to a
//! [`Transport`]. The production implementation wraps reqwest; tests swap in
//! an in-memory one.

use std::sync::Arc;

use reqwest::header::{AsHeaderName, HeaderMap};
use reqwest::{Client as ReqwestClient, Method, StatusCode, Url};

/// A fully built request, independent of any HTTP library
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

/// A completed response with its body already read
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TransportResponse {
    /// A header value as a string, if present and visible ASCII
    pub fn header<K: AsHeaderName>(&self, name: K) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// The request never produced a response
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Io(String),
}

/// Performs one request/response round trip
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}

#[async_trait::async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        (**self).send(request).await
    }
}

/// reqwest-backed transport
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    http_client: Arc<ReqwestClient>,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::with_client(ReqwestClient::new())
    }

    /// Use a preconfigured reqwest client (proxies, TLS roots, ...)
    pub fn with_client(client: ReqwestClient) -> Self {
        Self {
            http_client: Arc::new(client),
        }
    }
}

#[async_trait::async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let mut builder = self
            .http_client
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();

        Ok(TransportResponse {
            status,
            headers,
            body,
        })
    }
}
