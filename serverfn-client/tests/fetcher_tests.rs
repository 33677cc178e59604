// End-to-end tests for the invocation marshaler against a recording mock
// transport: both calling conventions, payload placement, and control-signal
// handling.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use http::{header, HeaderMap, HeaderValue, Method};
use serde_json::{json, Value};
use serverfn_client::{
    FetchError, FetchOutcome, Fetcher, HttpResponse, RequestBody, RequestSpec, Transport,
    TransportError,
};
use serverfn_core::{
    CallDescriptor, CallValue, FormEntry, FormPayload, JsonSerializer, Serializer, ValueError,
    CONTEXT_FIELD,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[derive(Debug, Default)]
struct MockTransport {
    requests: Mutex<Vec<RequestSpec>>,
    responses: Mutex<VecDeque<HttpResponse>>,
}

impl MockTransport {
    fn returning(response: HttpResponse) -> Self {
        let transport = MockTransport::default();
        transport.responses.lock().unwrap().push_back(response);
        transport
    }

    fn recorded(&self) -> Vec<RequestSpec> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: RequestSpec) -> Result<HttpResponse, TransportError> {
        self.requests.lock().unwrap().push(request);
        Ok(self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .expect("no mock response queued"))
    }
}

fn json_response(status: u16, body: &str) -> HttpResponse {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    HttpResponse {
        status,
        headers,
        body: Bytes::copy_from_slice(body.as_bytes()),
    }
}

fn text_response(status: u16, body: &str) -> HttpResponse {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
    HttpResponse {
        status,
        headers,
        body: Bytes::copy_from_slice(body.as_bytes()),
    }
}

fn file_value() -> CallValue {
    CallValue::File {
        name: "report.pdf".into(),
        content_type: Some("application/pdf".into()),
        content: Bytes::from_static(b"%PDF"),
    }
}

#[tokio::test]
async fn structured_post_sends_envelope_body_and_marker() {
    init_tracing();
    let transport = MockTransport::returning(json_response(200, r#"{"ok":true}"#));
    let fetcher = Fetcher::new(&transport);

    let descriptor = CallDescriptor::new(Method::POST)
        .with_data(CallValue::from(json!({"x": 1})))
        .with_context(json!({}));
    let outcome = fetcher
        .invoke_structured("/api/fn", descriptor)
        .await
        .unwrap();

    match outcome {
        FetchOutcome::Value(value) => assert_eq!(value, json!({"ok": true})),
        other => panic!("expected value, got {other:?}"),
    }

    let requests = transport.recorded();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.url, "/api/fn?createServerFn");
    assert_eq!(request.method, Method::POST);
    assert_eq!(
        request.headers.get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
    let Some(RequestBody::Serialized(body)) = &request.body else {
        panic!("expected serialized body");
    };
    assert_eq!(
        serde_json::from_str::<Value>(body).unwrap(),
        json!({"data": {"x": 1}, "context": {}})
    );
}

#[tokio::test]
async fn structured_get_moves_payload_into_the_query_string() {
    let transport = MockTransport::returning(json_response(200, "null"));
    let fetcher = Fetcher::new(&transport);

    let descriptor = CallDescriptor::new(Method::GET)
        .with_data(CallValue::from(json!({"x": 1})))
        .with_context(json!({}));
    fetcher
        .invoke_structured("/api/fn", descriptor)
        .await
        .unwrap();

    let requests = transport.recorded();
    let request = &requests[0];
    assert!(request.body.is_none());
    assert!(request.url.starts_with("/api/fn?payload="));
    assert!(request.url.ends_with("&createServerFn"));

    // The payload parameter round-trips back to the envelope.
    let query = request.url.split_once('?').unwrap().1;
    let (_, serialized) = form_urlencoded::parse(query.as_bytes())
        .find(|(k, _)| k == "payload")
        .unwrap();
    let envelope: Value = serde_json::from_str(&serialized).unwrap();
    assert_eq!(envelope, json!({"data": {"x": 1}, "context": {}}));
}

#[tokio::test]
async fn structured_get_joins_with_ampersand_on_existing_query() {
    let transport = MockTransport::returning(json_response(200, "null"));
    let fetcher = Fetcher::new(&transport);

    let descriptor = CallDescriptor::new(Method::GET).with_context(json!(null));
    fetcher
        .invoke_structured("/api/fn?v=2", descriptor)
        .await
        .unwrap();

    let url = &transport.recorded()[0].url;
    assert!(url.starts_with("/api/fn?v=2&payload="));
    assert!(url.ends_with("&createServerFn"));
}

#[tokio::test]
async fn binary_under_get_fails_before_the_transport() {
    let transport = MockTransport::default();
    let fetcher = Fetcher::new(&transport);

    let descriptor = CallDescriptor::new(Method::GET).with_data(nested_binary());
    let result = fetcher.invoke_structured("/api/fn", descriptor).await;

    assert!(matches!(result, Err(FetchError::BinaryInGet)));
    assert!(transport.recorded().is_empty());
}

// Binary leaf buried two levels deep.
fn nested_binary() -> CallValue {
    let mut inner = indexmap::IndexMap::new();
    inner.insert("upload".to_string(), file_value());
    CallValue::Array(vec![
        CallValue::from(json!({"a": 1})),
        CallValue::Object(inner),
    ])
}

#[tokio::test]
async fn text_only_form_under_get_fails_before_the_transport() {
    let transport = MockTransport::default();
    let fetcher = Fetcher::new(&transport);

    // No binary entries, so the scanner passes; the form still has no JSON
    // representation for the query-string envelope.
    let mut form = FormPayload::new();
    form.append("title", FormEntry::Text("hello".into()));
    let descriptor = CallDescriptor::new(Method::GET).with_data(form);

    let result = fetcher.invoke_structured("/api/fn", descriptor).await;
    assert!(matches!(result, Err(FetchError::Value(ValueError::Form))));
    assert!(transport.recorded().is_empty());
}

#[tokio::test]
async fn binary_in_plain_object_post_fails_before_the_transport() {
    let transport = MockTransport::default();
    let fetcher = Fetcher::new(&transport);

    let mut fields = indexmap::IndexMap::new();
    fields.insert("attachment".to_string(), file_value());
    let descriptor = CallDescriptor::new(Method::POST).with_data(CallValue::Object(fields));

    let result = fetcher.invoke_structured("/api/fn", descriptor).await;
    assert!(matches!(result, Err(FetchError::BinaryInObject)));
    assert!(transport.recorded().is_empty());
}

#[tokio::test]
async fn form_payload_travels_as_form_body_with_context_field() {
    let transport = MockTransport::returning(json_response(200, "null"));
    let fetcher = Fetcher::new(&transport);

    let mut form = FormPayload::new();
    form.append("title", FormEntry::Text("hello".into()));
    form.append(
        "upload",
        FormEntry::File {
            name: "a.bin".into(),
            content_type: None,
            content: Bytes::from_static(b"\x00\x01"),
        },
    );
    let descriptor = CallDescriptor::new(Method::POST)
        .with_data(form)
        .with_context(json!({"user": 7}));

    fetcher
        .invoke_structured("/api/fn", descriptor)
        .await
        .unwrap();

    let requests = transport.recorded();
    let request = &requests[0];
    // The transport owns the multipart boundary, so no preset content type.
    assert!(request.headers.get(header::CONTENT_TYPE).is_none());
    let Some(RequestBody::Form(form)) = &request.body else {
        panic!("expected form body");
    };
    assert_eq!(
        form.get(CONTEXT_FIELD),
        Some(&FormEntry::Text(r#"{"user":7}"#.into()))
    );
}

#[tokio::test]
async fn error_status_raises_the_decoded_error_body() {
    let transport = MockTransport::returning(json_response(500, r#"{"message":"boom"}"#));
    let fetcher = Fetcher::new(&transport);

    let descriptor = CallDescriptor::new(Method::POST).with_data(CallValue::from(json!({})));
    let result = fetcher.invoke_structured("/api/fn", descriptor).await;

    match result {
        Err(FetchError::Status { status, error }) => {
            assert_eq!(status, 500);
            assert_eq!(error, json!({"message": "boom"}));
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn redirect_signal_is_raised_to_the_caller() {
    let transport =
        MockTransport::returning(json_response(200, r#"{"isRedirect":true,"to":"/login"}"#));
    let fetcher = Fetcher::new(&transport);

    let descriptor = CallDescriptor::new(Method::POST);
    let result = fetcher.invoke_structured("/api/fn", descriptor).await;

    match result {
        Err(FetchError::Redirect(redirect)) => {
            assert_eq!(redirect.location(), Some("/login"));
        }
        other => panic!("expected redirect, got {other:?}"),
    }
}

#[tokio::test]
async fn positional_args_are_proxied_as_a_json_post() {
    init_tracing();
    let transport = MockTransport::returning(text_response(200, "ok"));
    let fetcher = Fetcher::new(&transport);

    let args = vec![
        CallValue::from(json!(1)),
        CallValue::from(json!(2)),
        CallValue::from(json!(3)),
    ];
    let outcome = fetcher.invoke("/fn", args).await.unwrap();

    match outcome {
        FetchOutcome::Text(text) => assert_eq!(text, "ok"),
        other => panic!("expected text, got {other:?}"),
    }

    let requests = transport.recorded();
    let request = &requests[0];
    assert_eq!(request.url, "/fn");
    assert_eq!(request.method, Method::POST);
    assert_eq!(
        request.headers.get(header::ACCEPT).unwrap(),
        "application/json"
    );
    assert_eq!(
        request.headers.get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
    let Some(RequestBody::Serialized(body)) = &request.body else {
        panic!("expected serialized body");
    };
    assert_eq!(serde_json::from_str::<Value>(body).unwrap(), json!([1, 2, 3]));
}

#[tokio::test]
async fn positional_json_response_is_decoded() {
    let transport = MockTransport::returning(json_response(200, r#"{"sum":6}"#));
    let fetcher = Fetcher::new(&transport);

    let outcome = fetcher
        .invoke("/fn", vec![CallValue::from(json!([1, 2, 3]))])
        .await
        .unwrap();
    match outcome {
        FetchOutcome::Value(value) => assert_eq!(value, json!({"sum": 6})),
        other => panic!("expected value, got {other:?}"),
    }
}

#[tokio::test]
async fn invoke_classifies_a_descriptor_shaped_first_argument() {
    let transport = MockTransport::returning(json_response(200, "null"));
    let fetcher = Fetcher::new(&transport);

    let mut fields = indexmap::IndexMap::new();
    fields.insert("method".to_string(), CallValue::String("POST".into()));
    fields.insert("data".to_string(), CallValue::from(json!({"x": 1})));
    fields.insert("context".to_string(), CallValue::from(json!({})));

    fetcher
        .invoke("/api/fn", vec![CallValue::Object(fields)])
        .await
        .unwrap();

    let request = &transport.recorded()[0];
    assert_eq!(request.url, "/api/fn?createServerFn");
    assert_eq!(request.method, Method::POST);
}

#[tokio::test]
async fn structured_non_json_success_passes_the_raw_response_through() {
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/octet-stream"),
    );
    let transport = MockTransport::returning(HttpResponse {
        status: 200,
        headers,
        body: Bytes::from_static(b"\x00\x01\x02"),
    });
    let fetcher = Fetcher::new(&transport);

    let outcome = fetcher
        .invoke_structured("/api/fn", CallDescriptor::new(Method::POST))
        .await
        .unwrap();
    match outcome {
        FetchOutcome::Response(raw) => assert_eq!(&raw.body[..], b"\x00\x01\x02"),
        other => panic!("expected raw response, got {other:?}"),
    }
}

mod round_trip {
    use super::*;
    use proptest::prelude::*;

    fn json_value() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| json!(n)),
            "[a-z]{0,8}".prop_map(Value::String),
        ];
        leaf.prop_recursive(3, 16, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        // Encoding the envelope and decoding it back yields the same data
        // and context.
        #[test]
        fn envelope_round_trips(data in json_value(), context in json_value()) {
            let descriptor = CallDescriptor::new(Method::POST)
                .with_data(CallValue::from(data.clone()))
                .with_context(context.clone());
            let wire = JsonSerializer
                .stringify(&descriptor.envelope().unwrap())
                .unwrap();
            let parsed: Value = serde_json::from_str(&wire).unwrap();
            let decoded = JsonSerializer.decode(parsed).unwrap();
            prop_assert_eq!(&decoded["data"], &data);
            prop_assert_eq!(&decoded["context"], &context);
        }
    }
}
