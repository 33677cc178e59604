use http::{HeaderMap, HeaderName, HeaderValue, Method};
use indexmap::IndexMap;
use serde_json::{json, Value};
use thiserror::Error;

use crate::value::{CallValue, ValueError};

#[derive(Debug, Error)]
pub enum CallError {
    #[error("invoke requires at least one argument")]
    EmptyArgs,
    #[error("call descriptor is missing a usable method field")]
    MissingMethod,
    #[error("call context must be plain JSON: {0}")]
    Context(#[from] ValueError),
    #[error("invalid header {name}: {reason}")]
    InvalidHeader { name: String, reason: String },
    #[error("call descriptor headers must map names to strings")]
    HeaderShape,
}

/// How a structured payload travels on the wire. Computed once at the
/// dispatcher boundary instead of re-tested at each step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    /// The payload is a form container; the transport owns the content type
    /// (multipart boundary and all).
    FormLike,
    /// Anything else: the payload is serialized into a JSON envelope.
    PlainObject,
}

/// A structured remote call: explicit HTTP method, optional data payload,
/// and an auxiliary context value that travels alongside it.
#[derive(Debug, Clone)]
pub struct CallDescriptor {
    pub method: Method,
    pub data: Option<CallValue>,
    pub context: Value,
    pub headers: HeaderMap,
}

impl CallDescriptor {
    pub fn new(method: Method) -> Self {
        CallDescriptor {
            method,
            data: None,
            context: Value::Null,
            headers: HeaderMap::new(),
        }
    }

    pub fn with_data(mut self, data: impl Into<CallValue>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn with_context(mut self, context: Value) -> Self {
        self.context = context;
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn payload_kind(&self) -> PayloadKind {
        match &self.data {
            Some(CallValue::Form(_)) => PayloadKind::FormLike,
            _ => PayloadKind::PlainObject,
        }
    }

    /// The wire envelope for JSON payloads: `{"data": <value-or-null>,
    /// "context": <value>}`.
    pub fn envelope(&self) -> Result<Value, ValueError> {
        let data = match &self.data {
            Some(value) => value.to_json()?,
            None => Value::Null,
        };
        Ok(json!({ "data": data, "context": self.context }))
    }

    /// Build a descriptor from the fields of a dynamically shaped object,
    /// the way a proxied argument list carries one.
    pub fn from_fields(mut fields: IndexMap<String, CallValue>) -> Result<Self, CallError> {
        let method = match fields.shift_remove("method") {
            Some(CallValue::String(m)) => {
                Method::from_bytes(m.as_bytes()).map_err(|_| CallError::MissingMethod)?
            }
            _ => return Err(CallError::MissingMethod),
        };
        let data = fields.shift_remove("data");
        let context = match fields.shift_remove("context") {
            Some(value) => value.to_json()?,
            None => Value::Null,
        };
        let headers = match fields.shift_remove("headers") {
            Some(CallValue::Object(map)) => {
                let mut pairs = Vec::with_capacity(map.len());
                for (name, value) in &map {
                    match value {
                        CallValue::String(v) => pairs.push((name.as_str(), v.as_str())),
                        _ => return Err(CallError::HeaderShape),
                    }
                }
                normalize_headers(pairs)?
            }
            Some(_) => return Err(CallError::HeaderShape),
            None => HeaderMap::new(),
        };
        Ok(CallDescriptor {
            method,
            data,
            context,
            headers,
        })
    }
}

/// The two calling conventions. Exactly one shape describes a given call.
#[derive(Debug, Clone)]
pub enum CallShape {
    Structured(CallDescriptor),
    Positional(Vec<CallValue>),
}

impl CallShape {
    /// Structural classification, decided once: a first argument shaped like
    /// an object carrying a parseable `method` field selects the structured
    /// convention; anything else proxies the whole argument list verbatim.
    pub fn classify(mut args: Vec<CallValue>) -> Result<CallShape, CallError> {
        if args.is_empty() {
            return Err(CallError::EmptyArgs);
        }
        let first = args.remove(0);
        match first {
            CallValue::Object(map) if descriptor_method(&map).is_some() => {
                Ok(CallShape::Structured(CallDescriptor::from_fields(map)?))
            }
            other => {
                args.insert(0, other);
                Ok(CallShape::Positional(args))
            }
        }
    }
}

fn descriptor_method(fields: &IndexMap<String, CallValue>) -> Option<Method> {
    match fields.get("method")? {
        CallValue::String(m) => Method::from_bytes(m.as_bytes()).ok(),
        _ => None,
    }
}

/// Fold plain name/value string pairs into a canonical case-insensitive
/// header map.
pub fn normalize_headers<'a, I>(pairs: I) -> Result<HeaderMap, CallError>
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut headers = HeaderMap::new();
    for (name, value) in pairs {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| CallError::InvalidHeader {
                name: name.to_string(),
                reason: e.to_string(),
            })?;
        let header_value = HeaderValue::from_str(value).map_err(|e| CallError::InvalidHeader {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
        headers.insert(header_name, header_value);
    }
    Ok(headers)
}
