use serde_json::Value;
use serverfn_core::{CallError, ControlSignal, NotFound, Redirect, ValueError};
use thiserror::Error;

use crate::transport::TransportError;

/// Everything an invocation can raise. Nothing is retried or suppressed at
/// this layer; each failure terminates the call.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Binary data under a GET call, caught before the transport is reached.
    #[error("cannot send binary data to a GET server function; set the method to POST instead")]
    BinaryInGet,
    /// Binary data inside a non-form payload, caught before the transport.
    #[error("binary data cannot be sent inside a plain object payload; use a form payload instead")]
    BinaryInObject,
    /// Non-success status with a JSON body, decoded through the serializer
    /// to preserve any structured error the server sent.
    #[error("server function returned status {status}: {error}")]
    Status { status: u16, error: Value },
    /// Non-success status with a non-JSON body.
    #[error("server function returned status {status}: {message}")]
    StatusText { status: u16, message: String },
    /// Redirect signal embedded in a successful response; a routing layer is
    /// expected to catch this.
    #[error("{0}")]
    Redirect(Redirect),
    /// Not-found signal embedded in a successful response.
    #[error("{0}")]
    NotFound(NotFound),
    /// An error-shaped value embedded in a successful response.
    #[error("server function returned an error value: {0}")]
    ErrorValue(Value),
    #[error(transparent)]
    Call(#[from] CallError),
    #[error("payload cannot be encoded: {0}")]
    Value(#[from] ValueError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl From<ControlSignal> for FetchError {
    fn from(signal: ControlSignal) -> Self {
        match signal {
            ControlSignal::Redirect(redirect) => FetchError::Redirect(redirect),
            ControlSignal::NotFound(not_found) => FetchError::NotFound(not_found),
            ControlSignal::Error(value) => FetchError::ErrorValue(value),
        }
    }
}
