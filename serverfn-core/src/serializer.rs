use serde_json::Value;

/// The wire serializer seam. The serializer owns the string representation
/// of rich values; this crate only decides what travels through it.
pub trait Serializer: Send + Sync {
    /// Encode a JSON value into its wire string.
    fn stringify(&self, value: &Value) -> Result<String, serde_json::Error>;

    /// Rehydrate a parsed JSON body into its final value. The server may
    /// have transformed the payload, so even parsed JSON goes through here.
    fn decode(&self, raw: Value) -> Result<Value, serde_json::Error>;
}

/// Plain serde_json serializer: stringify is `to_string`, decode passes the
/// parsed value through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn stringify(&self, value: &Value) -> Result<String, serde_json::Error> {
        serde_json::to_string(value)
    }

    fn decode(&self, raw: Value) -> Result<Value, serde_json::Error> {
        Ok(raw)
    }
}
