use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Marker key identifying a redirect in a decoded response value.
const REDIRECT_MARKER: &str = "isRedirect";
/// Marker key identifying a not-found in a decoded response value.
const NOT_FOUND_MARKER: &str = "isNotFound";
/// Key carried by error values revived by the wire serializer.
const ERROR_MARKER: &str = "$error";

/// Router redirect decoded out of a successful response. Raised, never
/// returned, so a routing layer can act on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Redirect {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    /// Headers the server attached to the redirect (e.g. set-cookie), for
    /// the routing layer to apply.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub headers: IndexMap<String, String>,
}

impl Redirect {
    /// The redirect target, preferring the resolved href over the raw `to`.
    pub fn location(&self) -> Option<&str> {
        self.href.as_deref().or(self.to.as_deref())
    }
}

impl fmt::Display for Redirect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "redirect to {}", self.location().unwrap_or("<unspecified>"))
    }
}

/// Router not-found decoded out of a successful response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotFound {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl fmt::Display for NotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "not found")
    }
}

/// A decoded response value that must be raised as control flow rather than
/// returned as data.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlSignal {
    Redirect(Redirect),
    NotFound(NotFound),
    /// An error-shaped value revived by the serializer.
    Error(Value),
}

impl ControlSignal {
    /// Classify a decoded JSON value. Returns `None` for plain data results.
    pub fn from_value(value: &Value) -> Option<ControlSignal> {
        let object = value.as_object()?;

        if object.get(REDIRECT_MARKER).and_then(Value::as_bool) == Some(true) {
            if let Ok(redirect) = serde_json::from_value::<Redirect>(value.clone()) {
                return Some(ControlSignal::Redirect(redirect));
            }
        }

        if object.get(NOT_FOUND_MARKER).and_then(Value::as_bool) == Some(true) {
            return Some(ControlSignal::NotFound(NotFound {
                data: object.get("data").cloned(),
            }));
        }

        if object.contains_key(ERROR_MARKER) {
            return Some(ControlSignal::Error(value.clone()));
        }

        None
    }
}
