use crate::value::CallValue;

/// Reports whether a value carries binary content (a blob or file leaf) at
/// any nesting depth. Pure recursion over the closed node set; the owned
/// tree cannot be cyclic, so this always terminates.
pub fn contains_binary(value: &CallValue) -> bool {
    match value {
        CallValue::Blob(_) | CallValue::File { .. } => true,
        CallValue::Form(form) => form.entries().any(|(_, entry)| entry.is_binary()),
        CallValue::Array(items) => items.iter().any(contains_binary),
        CallValue::Object(map) => map.values().any(contains_binary),
        CallValue::Null | CallValue::Bool(_) | CallValue::Number(_) | CallValue::String(_) => false,
    }
}
