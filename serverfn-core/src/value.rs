use bytes::Bytes;
use indexmap::IndexMap;
use serde_json::Value;
use thiserror::Error;

/// Raised when a call value has no plain-JSON representation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    #[error("binary data has no JSON representation")]
    Binary,
    #[error("form payloads have no JSON representation")]
    Form,
}

/// A single value inside a form payload entry.
#[derive(Debug, Clone, PartialEq)]
pub enum FormEntry {
    Text(String),
    Blob(Bytes),
    File {
        name: String,
        content_type: Option<String>,
        content: Bytes,
    },
}

impl FormEntry {
    pub fn is_binary(&self) -> bool {
        matches!(self, FormEntry::Blob(_) | FormEntry::File { .. })
    }
}

/// Ordered multi-value form container. Entries keep insertion order and a
/// name may appear more than once, matching form-data semantics.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormPayload {
    entries: Vec<(String, FormEntry)>,
}

impl FormPayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry, keeping any existing entries under the same name.
    pub fn append(&mut self, name: impl Into<String>, entry: FormEntry) {
        self.entries.push((name.into(), entry));
    }

    /// Replace every entry under `name` with a single text entry, appending
    /// if the name was absent (form-data `set` semantics).
    pub fn set_text(&mut self, name: &str, value: impl Into<String>) {
        let entry = FormEntry::Text(value.into());
        match self.entries.iter().position(|(n, _)| n == name) {
            Some(index) => {
                self.entries[index].1 = entry;
                let mut i = index + 1;
                while i < self.entries.len() {
                    if self.entries[i].0 == name {
                        self.entries.remove(i);
                    } else {
                        i += 1;
                    }
                }
            }
            None => self.entries.push((name.to_string(), entry)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FormEntry> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, entry)| entry)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &FormEntry)> {
        self.entries.iter().map(|(n, e)| (n.as_str(), e))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A call argument value. Closed tree over JSON scalars, containers, binary
/// leaves, and form payloads. Ownership makes the tree acyclic by
/// construction, so recursive walks always terminate.
#[derive(Debug, Clone, PartialEq)]
pub enum CallValue {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
    Array(Vec<CallValue>),
    Object(IndexMap<String, CallValue>),
    Blob(Bytes),
    File {
        name: String,
        content_type: Option<String>,
        content: Bytes,
    },
    Form(FormPayload),
}

impl CallValue {
    /// Convert into plain JSON. Fails on binary leaves and form payloads,
    /// which have no JSON representation.
    pub fn to_json(&self) -> Result<Value, ValueError> {
        match self {
            CallValue::Null => Ok(Value::Null),
            CallValue::Bool(b) => Ok(Value::Bool(*b)),
            CallValue::Number(n) => Ok(Value::Number(n.clone())),
            CallValue::String(s) => Ok(Value::String(s.clone())),
            CallValue::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(item.to_json()?);
                }
                Ok(Value::Array(out))
            }
            CallValue::Object(map) => {
                let mut out = serde_json::Map::with_capacity(map.len());
                for (key, value) in map {
                    out.insert(key.clone(), value.to_json()?);
                }
                Ok(Value::Object(out))
            }
            CallValue::Blob(_) | CallValue::File { .. } => Err(ValueError::Binary),
            CallValue::Form(_) => Err(ValueError::Form),
        }
    }
}

impl From<Value> for CallValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => CallValue::Null,
            Value::Bool(b) => CallValue::Bool(b),
            Value::Number(n) => CallValue::Number(n),
            Value::String(s) => CallValue::String(s),
            Value::Array(items) => {
                CallValue::Array(items.into_iter().map(CallValue::from).collect())
            }
            Value::Object(map) => CallValue::Object(
                map.into_iter()
                    .map(|(k, v)| (k, CallValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<FormPayload> for CallValue {
    fn from(form: FormPayload) -> Self {
        CallValue::Form(form)
    }
}

impl From<Bytes> for CallValue {
    fn from(bytes: Bytes) -> Self {
        CallValue::Blob(bytes)
    }
}
