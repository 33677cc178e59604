// Server-function protocol core
// Data model shared by the client-side invocation marshaler:
// - Call value tree (JSON scalars, containers, binary leaves, form payloads)
// - Binary payload scanning
// - Call-shape classification (structured descriptor vs positional args)
// - Control signals decoded out of responses (redirect / not-found / error)
// - The wire serializer seam

pub mod call;
pub mod scan;
pub mod serializer;
pub mod signal;
pub mod value;

pub use call::{normalize_headers, CallDescriptor, CallError, CallShape, PayloadKind};
pub use scan::contains_binary;
pub use serializer::{JsonSerializer, Serializer};
pub use signal::{ControlSignal, NotFound, Redirect};
pub use value::{CallValue, FormEntry, FormPayload, ValueError};

/// Marker query parameter appended to every structured call URL so the
/// receiving side can tell the two calling conventions apart.
pub const STRUCTURED_CALL_MARKER: &str = "createServerFn";

/// Query parameter carrying the serialized payload envelope on GET calls.
pub const PAYLOAD_PARAM: &str = "payload";

/// Reserved form field carrying the serialized context when the payload
/// travels as a form body instead of JSON.
pub const CONTEXT_FIELD: &str = "__TSR_CONTEXT";
