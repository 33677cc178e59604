use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart;
use serverfn_core::FormEntry;
use tracing::debug;

use crate::transport::{HttpResponse, RequestBody, RequestSpec, Transport, TransportError};

/// Configuration for the reqwest-backed transport.
#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for HttpTransportConfig {
    fn default() -> Self {
        Self { timeout_ms: 30000 }
    }
}

/// Transport capability backed by a shared reqwest client. Form bodies are
/// sent as multipart, with reqwest owning the boundary.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(config: HttpTransportConfig) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| TransportError::Setup(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: RequestSpec) -> Result<HttpResponse, TransportError> {
        let RequestSpec {
            url,
            method,
            headers,
            body,
        } = request;

        debug!(%method, %url, "sending server function request");

        let mut builder = self.client.request(method, &url).headers(headers);

        match body {
            Some(RequestBody::Serialized(body)) => {
                builder = builder.body(body);
            }
            Some(RequestBody::Form(form)) => {
                let mut multipart_form = multipart::Form::new();
                for (name, entry) in form.entries() {
                    multipart_form = match entry {
                        FormEntry::Text(text) => {
                            multipart_form.text(name.to_string(), text.clone())
                        }
                        FormEntry::Blob(bytes) => multipart_form
                            .part(name.to_string(), multipart::Part::bytes(bytes.to_vec())),
                        FormEntry::File {
                            name: file_name,
                            content_type,
                            content,
                        } => {
                            let mut part = multipart::Part::bytes(content.to_vec())
                                .file_name(file_name.clone());
                            if let Some(ct) = content_type {
                                part = part
                                    .mime_str(ct)
                                    .map_err(|e| TransportError::Request(e.to_string()))?;
                            }
                            multipart_form.part(name.to_string(), part)
                        }
                    };
                }
                builder = builder.multipart(multipart_form);
            }
            None => {}
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
