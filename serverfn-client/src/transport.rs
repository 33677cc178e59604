use async_trait::async_trait;
use bytes::Bytes;
use http::{header, HeaderMap, Method};
use serde_json::Value;
use serverfn_core::FormPayload;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to build transport: {0}")]
    Setup(String),
    #[error("request failed: {0}")]
    Request(String),
    #[error("failed to read response body: {0}")]
    Body(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// The body of a resolved request.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// A string produced by the wire serializer (or plain JSON on the
    /// positional path).
    Serialized(String),
    /// A form container; the transport encodes it as multipart and owns the
    /// boundary.
    Form(FormPayload),
}

/// A fully resolved request, ready for the transport. GET requests never
/// carry a body; their payload rides in the URL's query string.
#[derive(Debug, Clone)]
pub struct RequestSpec {
    pub url: String,
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<RequestBody>,
}

/// Response surface the marshaler needs: success flag, headers, and a body
/// that was read exactly once by the transport.
#[derive(Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(header::CONTENT_TYPE)?.to_str().ok()
    }

    pub fn json(&self) -> Result<Value, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Transport capability: sends one resolved request and returns the raw
/// response. Cancellation and timeouts live here, not in the marshaler.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: RequestSpec) -> Result<HttpResponse, TransportError>;
}

#[async_trait]
impl<'a, T: Transport + ?Sized> Transport for &'a T {
    async fn send(&self, request: RequestSpec) -> Result<HttpResponse, TransportError> {
        (**self).send(request).await
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    async fn send(&self, request: RequestSpec) -> Result<HttpResponse, TransportError> {
        (**self).send(request).await
    }
}
