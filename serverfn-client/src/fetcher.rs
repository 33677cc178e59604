use http::{header, HeaderMap, HeaderValue, Method};
use serde_json::Value;
use serverfn_core::{
    contains_binary, CallDescriptor, CallShape, CallValue, JsonSerializer, PayloadKind,
    Serializer, STRUCTURED_CALL_MARKER,
};
use tracing::{debug, trace};

use crate::encode::{append_raw_query, encode_body, payload_query};
use crate::error::FetchError;
use crate::response::{normalize, FetchOutcome};
use crate::transport::{RequestBody, RequestSpec, Transport};

/// Client-side invocation marshaler for server functions.
///
/// Reconciles the two calling conventions into one wire protocol: a
/// structured call descriptor becomes a request with an explicit method and
/// an encoded payload, while a plain argument list is proxied verbatim as a
/// JSON POST. Both paths feed the shared response normalizer.
#[derive(Debug)]
pub struct Fetcher<T, S = JsonSerializer> {
    transport: T,
    serializer: S,
}

impl<T: Transport> Fetcher<T> {
    pub fn new(transport: T) -> Self {
        Fetcher {
            transport,
            serializer: JsonSerializer,
        }
    }
}

impl<T: Transport, S: Serializer> Fetcher<T, S> {
    pub fn with_serializer(transport: T, serializer: S) -> Self {
        Fetcher {
            transport,
            serializer,
        }
    }

    /// Invoke a server function. Classifies `args` once at the boundary and
    /// dispatches to the matching convention.
    pub async fn invoke(&self, url: &str, args: Vec<CallValue>) -> Result<FetchOutcome, FetchError> {
        match CallShape::classify(args)? {
            CallShape::Structured(descriptor) => self.invoke_structured(url, descriptor).await,
            CallShape::Positional(args) => self.invoke_positional(url, args).await,
        }
    }

    /// The structured path: encode the descriptor's payload (query string
    /// for GET, body otherwise), tag the URL with the structured-call
    /// marker, and normalize the response.
    pub async fn invoke_structured(
        &self,
        url: &str,
        descriptor: CallDescriptor,
    ) -> Result<FetchOutcome, FetchError> {
        let kind = descriptor.payload_kind();
        let mut url = url.to_string();
        let headers = build_headers(&descriptor, kind);

        let body = if descriptor.method == Method::GET {
            // Binary payloads cannot travel in a query string.
            if descriptor.data.as_ref().is_some_and(contains_binary) {
                return Err(FetchError::BinaryInGet);
            }
            let serialized = self.serializer.stringify(&descriptor.envelope()?)?;
            append_raw_query(&mut url, &payload_query(&serialized));
            None
        } else {
            if kind == PayloadKind::PlainObject
                && descriptor.data.as_ref().is_some_and(contains_binary)
            {
                return Err(FetchError::BinaryInObject);
            }
            Some(encode_body(&descriptor, &self.serializer)?)
        };

        append_raw_query(&mut url, STRUCTURED_CALL_MARKER);

        debug!(method = %descriptor.method, %url, "invoking structured server function");

        let response = self
            .transport
            .send(RequestSpec {
                url,
                method: descriptor.method.clone(),
                headers,
                body,
            })
            .await?;

        normalize(response, &self.serializer)
    }

    /// The positional path: proxy the whole argument list as a JSON POST.
    /// Assumes plain JSON-compatible values; there is no binary handling and
    /// no custom serializer on the request side.
    pub async fn invoke_positional(
        &self,
        url: &str,
        args: Vec<CallValue>,
    ) -> Result<FetchOutcome, FetchError> {
        let mut items = Vec::with_capacity(args.len());
        for arg in &args {
            items.push(arg.to_json()?);
        }
        let body = serde_json::to_string(&Value::Array(items))?;

        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );

        debug!(%url, args = args.len(), "proxying positional server function call");
        trace!(%body, "positional request body");

        let response = self
            .transport
            .send(RequestSpec {
                url: url.to_string(),
                method: Method::POST,
                headers,
                body: Some(RequestBody::Serialized(body)),
            })
            .await?;

        // Positional callers get text for non-JSON responses instead of the
        // raw response object.
        match normalize(response, &self.serializer)? {
            FetchOutcome::Response(raw) => Ok(FetchOutcome::Text(raw.text())),
            outcome => Ok(outcome),
        }
    }
}

/// Default JSON headers apply only to plain-object payloads; form payloads
/// leave the content type to the transport's multipart boundary. Caller
/// headers win on conflicts.
fn build_headers(descriptor: &CallDescriptor, kind: PayloadKind) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if kind == PayloadKind::PlainObject {
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
    }
    for (name, value) in &descriptor.headers {
        headers.insert(name.clone(), value.clone());
    }
    headers
}
