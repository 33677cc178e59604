// Server-function invocation client
// Implements the client side of the server-function wire protocol:
// - Structured call descriptors (explicit method, payload, context)
// - Positional argument proxying
// - Form payloads with the context riding alongside file fields
// - Control-signal aware response decoding (redirect / not-found / error)

pub mod encode;
pub mod error;
pub mod fetcher;
pub mod http_transport;
pub mod response;
pub mod transport;

pub use error::FetchError;
pub use fetcher::Fetcher;
pub use http_transport::{HttpTransportConfig, ReqwestTransport};
pub use response::{ContentKind, FetchOutcome};
pub use transport::{HttpResponse, RequestBody, RequestSpec, Transport, TransportError};
