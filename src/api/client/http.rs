//! HTTP client for the fragments service
//!
//! Every operation is one request/response cycle: build the request, send it
//! through the [`Transport`], treat any non-2xx status as a failure, then
//! decode the body. Nothing is cached or retried.

use std::fmt;
use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE, LOCATION};
use reqwest::{Method, Url};
use serde_json::Value;

use super::auth::AuthProvider;
use super::transport::{
    ReqwestTransport, Transport, TransportError, TransportRequest, TransportResponse,
};
use crate::models::{CreatedFragment, FragmentBody};

/// Base URL used when nothing is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Environment variable selecting the service base URL
pub const API_URL_ENV: &str = "API_URL";

/// API client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    /// Reads `API_URL`, falling back to the default when unset or blank
    pub fn from_env() -> Self {
        Self::from_env_value(std::env::var(API_URL_ENV).ok())
    }

    fn from_env_value(value: Option<String>) -> Self {
        match value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
        {
            Some(base_url) => Self { base_url },
            None => Self::default(),
        }
    }
}

/// The client operation a request or error belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ListFragments,
    GetFragment,
    CreateTypedFragment,
    CreateFileFragment,
    UpdateFragment,
    DeleteFragment,
}

impl Operation {
    pub fn name(&self) -> &'static str {
        match self {
            Operation::ListFragments => "list_fragments",
            Operation::GetFragment => "get_fragment",
            Operation::CreateTypedFragment => "create_typed_fragment",
            Operation::CreateFileFragment => "create_file_fragment",
            Operation::UpdateFragment => "update_fragment",
            Operation::DeleteFragment => "delete_fragment",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Client errors
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The server answered with a non-2xx status
    #[error("{operation} failed: {status} {status_text}")]
    Status {
        operation: Operation,
        status: u16,
        status_text: String,
    },

    /// The request never completed
    #[error("{operation} failed: {source}")]
    Transport {
        operation: Operation,
        #[source]
        source: TransportError,
    },

    /// A successful response carried a body that is not the expected JSON
    #[error("{operation} returned an unreadable body: {source}")]
    Decode {
        operation: Operation,
        #[source]
        source: serde_json::Error,
    },

    /// The request was refused locally and never sent
    #[error("{operation} rejected: {reason}")]
    InvalidArgument { operation: Operation, reason: String },

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

impl ClientError {
    /// HTTP status, only for errors the server responded with
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn operation(&self) -> Option<Operation> {
        match self {
            ClientError::Status { operation, .. }
            | ClientError::Transport { operation, .. }
            | ClientError::Decode { operation, .. }
            | ClientError::InvalidArgument { operation, .. } => Some(*operation),
            ClientError::InvalidBaseUrl { .. } => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport { .. })
    }
}

/// Client for the `/v1/fragments` API
///
/// Cloning is cheap and clones share the underlying transport. The client has
/// no mutable state, so one instance can serve any number of concurrent calls.
#[derive(Clone)]
pub struct FragmentsClient {
    transport: Arc<dyn Transport>,
    base_url: Url,
}

impl fmt::Debug for FragmentsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FragmentsClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl FragmentsClient {
    /// Create a client configured from the environment
    pub fn new() -> Result<Self, ClientError> {
        Self::with_config(ClientConfig::from_env())
    }

    /// Create a client with custom configuration over reqwest
    pub fn with_config(config: ClientConfig) -> Result<Self, ClientError> {
        Self::with_transport(config, ReqwestTransport::new())
    }

    /// Create a client over any transport
    pub fn with_transport(
        config: ClientConfig,
        transport: impl Transport + 'static,
    ) -> Result<Self, ClientError> {
        Ok(Self {
            transport: Arc::new(transport),
            base_url: parse_base_url(&config.base_url)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `GET /v1/fragments`
    pub async fn list_fragments(&self, auth: &dyn AuthProvider) -> Result<Value, ClientError> {
        self.list(auth, false).await
    }

    /// `GET /v1/fragments?expand=1` when `expand` is set, otherwise the plain list
    pub async fn list_fragments_expanded(
        &self,
        auth: &dyn AuthProvider,
        expand: bool,
    ) -> Result<Value, ClientError> {
        self.list(auth, expand).await
    }

    async fn list(&self, auth: &dyn AuthProvider, expand: bool) -> Result<Value, ClientError> {
        let operation = Operation::ListFragments;
        let mut url = self.endpoint(None)?;
        if expand {
            url.query_pairs_mut().append_pair("expand", "1");
        }

        let request = TransportRequest {
            method: Method::GET,
            url,
            headers: auth.authorization_headers().await,
            body: None,
        };
        let response = self.execute(operation, request).await?;
        let data = decode_json(operation, &response.body)?;

        tracing::info!(%operation, expand, "Retrieved user fragments");
        Ok(data)
    }

    /// `GET /v1/fragments/{id}`
    ///
    /// Only the `Authorization` header is forwarded. The body comes back as
    /// JSON or raw content depending on the response content type.
    pub async fn get_fragment(
        &self,
        auth: &dyn AuthProvider,
        id: &str,
    ) -> Result<FragmentBody, ClientError> {
        let operation = Operation::GetFragment;
        let url = self.endpoint(Some(fragment_id(operation, id)?))?;

        let request = TransportRequest {
            method: Method::GET,
            url,
            headers: authorization_only(auth.authorization_headers().await),
            body: None,
        };
        let response = self.execute(operation, request).await?;
        negotiate(operation, response)
    }

    /// `POST /v1/fragments` with a text body of the given MIME type
    pub async fn create_typed_fragment(
        &self,
        auth: &dyn AuthProvider,
        text: &str,
        mime_type: &str,
    ) -> Result<CreatedFragment, ClientError> {
        self.create(
            Operation::CreateTypedFragment,
            auth,
            text.as_bytes().to_vec(),
            mime_type,
        )
        .await
    }

    /// `POST /v1/fragments` with a raw binary body of the given MIME type
    pub async fn create_file_fragment(
        &self,
        auth: &dyn AuthProvider,
        bytes: impl Into<Vec<u8>>,
        mime_type: &str,
    ) -> Result<CreatedFragment, ClientError> {
        self.create(Operation::CreateFileFragment, auth, bytes.into(), mime_type)
            .await
    }

    async fn create(
        &self,
        operation: Operation,
        auth: &dyn AuthProvider,
        body: Vec<u8>,
        mime_type: &str,
    ) -> Result<CreatedFragment, ClientError> {
        let content_type = content_type(operation, mime_type)?;
        let url = self.endpoint(None)?;

        let mut headers = auth.authorization_headers().await;
        headers.insert(CONTENT_TYPE, content_type);

        let request = TransportRequest {
            method: Method::POST,
            url,
            headers,
            body: Some(body),
        };
        let response = self.execute(operation, request).await?;

        let location = response.header(LOCATION).map(str::to_owned);
        if location.is_none() {
            tracing::warn!(%operation, "Location header is missing in the response");
        }

        let data = decode_json(operation, &response.body)?;
        tracing::info!(%operation, location = location.as_deref(), "Fragment posted");
        Ok(CreatedFragment { data, location })
    }

    /// `PUT /v1/fragments/{id}` replacing the fragment's content
    pub async fn update_fragment(
        &self,
        auth: &dyn AuthProvider,
        id: &str,
        text: &str,
    ) -> Result<FragmentBody, ClientError> {
        let operation = Operation::UpdateFragment;
        let url = self.endpoint(Some(fragment_id(operation, id)?))?;

        let request = TransportRequest {
            method: Method::PUT,
            url,
            headers: auth.authorization_headers().await,
            body: Some(text.as_bytes().to_vec()),
        };
        let response = self.execute(operation, request).await?;
        negotiate(operation, response)
    }

    /// `DELETE /v1/fragments/{id}`
    pub async fn delete_fragment(&self, auth: &dyn AuthProvider, id: &str) -> Result<(), ClientError> {
        let operation = Operation::DeleteFragment;
        let url = self.endpoint(Some(fragment_id(operation, id)?))?;

        let request = TransportRequest {
            method: Method::DELETE,
            url,
            headers: auth.authorization_headers().await,
            body: None,
        };
        self.execute(operation, request).await?;

        tracing::info!(%operation, id, "Fragment deleted");
        Ok(())
    }

    /// Sends one request and applies the status rule shared by all operations
    async fn execute(
        &self,
        operation: Operation,
        request: TransportRequest,
    ) -> Result<TransportResponse, ClientError> {
        tracing::info!(
            %operation,
            method = %request.method,
            url = %request.url,
            "Sending fragments request"
        );

        let response = self.transport.send(request).await.map_err(|source| {
            tracing::error!(%operation, error = %source, "Fragments request did not complete");
            ClientError::Transport { operation, source }
        })?;

        if !response.status.is_success() {
            let status = response.status.as_u16();
            let status_text = response
                .status
                .canonical_reason()
                .unwrap_or_default()
                .to_string();
            tracing::error!(%operation, status, %status_text, "Fragments request failed");
            return Err(ClientError::Status {
                operation,
                status,
                status_text,
            });
        }

        tracing::debug!(%operation, status = response.status.as_u16(), "Fragments request succeeded");
        Ok(response)
    }

    fn endpoint(&self, id: Option<&str>) -> Result<Url, ClientError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| ClientError::InvalidBaseUrl {
                url: self.base_url.to_string(),
                reason: "URL cannot be a base".to_string(),
            })?;
            segments.pop_if_empty().extend(["v1", "fragments"]);
            if let Some(id) = id {
                segments.push(id);
            }
        }
        Ok(url)
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ClientError> {
    let invalid = |reason: String| ClientError::InvalidBaseUrl {
        url: raw.to_string(),
        reason,
    };

    let url = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("expected an http or https URL".to_string()));
    }
    Ok(url)
}

fn reject(operation: Operation, reason: &str) -> ClientError {
    tracing::error!(%operation, reason, "Fragments request rejected");
    ClientError::InvalidArgument {
        operation,
        reason: reason.to_string(),
    }
}

/// Path segments `.` and `..` would be collapsed away, so they are refused too
fn fragment_id(operation: Operation, id: &str) -> Result<&str, ClientError> {
    match id {
        "" => Err(reject(operation, "fragment id must not be empty")),
        "." | ".." => Err(reject(operation, "fragment id must not be a dot segment")),
        id => Ok(id),
    }
}

fn content_type(operation: Operation, mime_type: &str) -> Result<HeaderValue, ClientError> {
    if mime_type.trim().is_empty() {
        return Err(reject(operation, "MIME type must not be empty"));
    }
    HeaderValue::from_str(mime_type)
        .map_err(|_| reject(operation, "MIME type is not a valid header value"))
}

fn authorization_only(headers: HeaderMap) -> HeaderMap {
    let mut only = HeaderMap::new();
    if let Some(value) = headers.get(AUTHORIZATION) {
        only.insert(AUTHORIZATION, value.clone());
    }
    only
}

fn decode_json(operation: Operation, body: &[u8]) -> Result<Value, ClientError> {
    serde_json::from_slice(body).map_err(|source| {
        tracing::error!(%operation, error = %source, "Response body is not valid JSON");
        ClientError::Decode { operation, source }
    })
}

fn negotiate(operation: Operation, response: TransportResponse) -> Result<FragmentBody, ClientError> {
    let TransportResponse { headers, body, .. } = response;
    let content_type = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok());

    FragmentBody::negotiate(content_type, body).map_err(|source| {
        tracing::error!(%operation, error = %source, "Response body is not valid JSON");
        ClientError::Decode { operation, source }
    })
}
