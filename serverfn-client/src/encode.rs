use serverfn_core::{CallDescriptor, CallValue, Serializer, CONTEXT_FIELD, PAYLOAD_PARAM};

use crate::error::FetchError;
use crate::transport::RequestBody;

/// Append a raw query fragment, using `&` when the URL already carries a
/// query string and `?` otherwise.
///
/// Precondition: the base URL does not already carry a `payload` or
/// `createServerFn` parameter; collisions are not detected.
pub fn append_raw_query(url: &mut String, fragment: &str) {
    if url.contains('?') {
        url.push('&');
    } else {
        url.push('?');
    }
    url.push_str(fragment);
}

/// Encode a serialized payload envelope into a single `payload=` query pair.
pub fn payload_query(serialized: &str) -> String {
    form_urlencoded::Serializer::new(String::new())
        .append_pair(PAYLOAD_PARAM, serialized)
        .finish()
}

/// Build the request body for a non-GET structured call.
///
/// Form payloads keep the container as the body with the serialized context
/// riding alongside the file fields under the reserved entry; everything
/// else becomes the serialized `{data, context}` envelope.
pub fn encode_body<S: Serializer>(
    descriptor: &CallDescriptor,
    serializer: &S,
) -> Result<RequestBody, FetchError> {
    match &descriptor.data {
        Some(CallValue::Form(form)) => {
            let mut form = form.clone();
            form.set_text(CONTEXT_FIELD, serializer.stringify(&descriptor.context)?);
            Ok(RequestBody::Form(form))
        }
        _ => {
            let envelope = descriptor.envelope()?;
            Ok(RequestBody::Serialized(serializer.stringify(&envelope)?))
        }
    }
}
