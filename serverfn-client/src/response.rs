use serde_json::Value;
use serverfn_core::{ControlSignal, Serializer};
use tracing::trace;

use crate::error::FetchError;
use crate::transport::HttpResponse;

/// Coarse classification of a response content type. Decided in one place
/// instead of substring checks scattered across components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Json,
    Text,
    Opaque,
}

impl ContentKind {
    pub fn classify(content_type: Option<&str>) -> ContentKind {
        match content_type {
            Some(ct) if ct.contains("application/json") => ContentKind::Json,
            Some(ct) if ct.starts_with("text/") => ContentKind::Text,
            _ => ContentKind::Opaque,
        }
    }
}

/// What an invocation yields when it does not raise.
#[derive(Debug)]
pub enum FetchOutcome {
    /// A decoded JSON result.
    Value(Value),
    /// The body text, for positional calls with non-JSON responses.
    Text(String),
    /// The raw response, passed through unmodified for non-JSON structured
    /// results.
    Response(HttpResponse),
}

/// Interpret a raw response. Non-success statuses raise their decoded body;
/// successful JSON bodies are decoded through the serializer and checked for
/// embedded control signals; anything else passes through raw.
pub fn normalize<S: Serializer>(
    response: HttpResponse,
    serializer: &S,
) -> Result<FetchOutcome, FetchError> {
    let kind = ContentKind::classify(response.content_type());

    if !response.ok() {
        return Err(match kind {
            ContentKind::Json => FetchError::Status {
                status: response.status,
                error: serializer.decode(response.json()?)?,
            },
            ContentKind::Text | ContentKind::Opaque => FetchError::StatusText {
                status: response.status,
                message: response.text(),
            },
        });
    }

    if kind == ContentKind::Json {
        let decoded = serializer.decode(response.json()?)?;
        if let Some(signal) = ControlSignal::from_value(&decoded) {
            trace!(?signal, "raising control signal from response");
            return Err(signal.into());
        }
        return Ok(FetchOutcome::Value(decoded));
    }

    Ok(FetchOutcome::Response(response))
}
