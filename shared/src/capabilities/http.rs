//! REST boundary to the safety API.
//!
//! Requests go out through `crux_http`. Responses are reduced to our own
//! serde types before they reach an [`Event`], so events stay plain data the
//! shell can serialize and tests can construct.

use crux_http::Http;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::event::Event;
use crate::model::IdempotencyKey;
use crate::{AppError, ErrorKind};

pub const INCIDENTS_PATH: &str = "/api/incidents";
pub const REGISTER_PATH: &str = "/api/users/register";
pub const LOGIN_PATH: &str = "/api/users/login";

pub const MAX_RESPONSE_BODY_SIZE: usize = 10 * 1024 * 1024;
pub const MAX_PAYLOAD_MESSAGE_LEN: usize = 300;

pub type HttpResponse = crux_http::Result<crux_http::Response<Vec<u8>>>;

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum ApiError {
    #[error("request failed: {message}")]
    Transport { message: String },

    #[error("HTTP error {status}")]
    Status {
        status: u16,
        #[serde(default)]
        message: Option<String>,
    },

    #[error("invalid response: {reason}")]
    InvalidResponse { reason: String },

    #[error("serialization error: {message}")]
    Serialization { message: String },
}

impl ApiError {
    /// Human readable text the server put in an error body, if any.
    #[must_use]
    pub fn payload_message(&self) -> Option<&str> {
        match self {
            Self::Status {
                message: Some(message),
                ..
            } => Some(message),
            _ => None,
        }
    }

    /// The payload message, or `fallback` for everything else.
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        self.payload_message().unwrap_or(fallback).to_string()
    }

    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport { .. } => ErrorKind::Network,
            Self::Status { status, .. } => ErrorKind::from_http_status(*status),
            Self::InvalidResponse { .. } | Self::Serialization { .. } => {
                ErrorKind::Deserialization
            }
        }
    }

    /// Builds a `Status` error, pulling a message out of the body when the
    /// server sent one.
    #[must_use]
    pub fn from_status(status: u16, body: &[u8]) -> Self {
        Self::Status {
            status,
            message: extract_message(body),
        }
    }
}

impl From<ApiError> for AppError {
    fn from(e: ApiError) -> Self {
        let mut error = AppError::new(e.kind(), e.to_string()).with_internal(e.to_string());
        if let Some(status) = e.status() {
            error = error.with_context("status", status.to_string());
        }
        error
    }
}

/// Accepts `"text"`, `{"detail": "text"}`, `{"detail": [{"msg": "text"}]}`,
/// `{"message": "text"}`, `{"error": "text"}` or a short plain-text body.
fn extract_message(body: &[u8]) -> Option<String> {
    let message = match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(serde_json::Value::String(text)) => Some(text),
        Ok(serde_json::Value::Object(map)) => ["detail", "message", "error"]
            .iter()
            .filter_map(|key| map.get(*key))
            .find_map(|value| match value {
                serde_json::Value::String(text) => Some(text.clone()),
                serde_json::Value::Array(items) => items
                    .iter()
                    .find_map(|item| item.get("msg")?.as_str().map(str::to_string)),
                _ => None,
            }),
        Ok(_) => None,
        Err(_) => std::str::from_utf8(body)
            .ok()
            .map(str::to_string)
            .filter(|text| text.len() <= MAX_PAYLOAD_MESSAGE_LEN),
    }?;

    let message = message.trim();
    (!message.is_empty()).then(|| message.to_string())
}

/// Status and body of a finished exchange, or a transport error.
pub fn read_response(result: HttpResponse) -> Result<(u16, Vec<u8>), ApiError> {
    let mut response = result.map_err(|e| ApiError::Transport {
        message: e.to_string(),
    })?;
    let status: u16 = response.status().into();
    let body = response.take_body().unwrap_or_default();
    Ok((status, body))
}

/// Decodes a 2xx JSON body into `T`; anything else becomes an [`ApiError`].
pub fn decode_body<T: DeserializeOwned>(status: u16, body: &[u8]) -> Result<T, ApiError> {
    if !(200..300).contains(&status) {
        return Err(ApiError::from_status(status, body));
    }
    if body.len() > MAX_RESPONSE_BODY_SIZE {
        return Err(ApiError::InvalidResponse {
            reason: format!(
                "body of {} bytes exceeds maximum of {MAX_RESPONSE_BODY_SIZE} bytes",
                body.len()
            ),
        });
    }
    serde_json::from_slice(body).map_err(|e| ApiError::InvalidResponse {
        reason: e.to_string(),
    })
}

/// Like [`decode_body`] but an empty or non-JSON 2xx body still counts as
/// success, yielding `None`.
pub fn decode_optional<T: DeserializeOwned>(status: u16, body: &[u8]) -> Result<Option<T>, ApiError> {
    if !(200..300).contains(&status) {
        return Err(ApiError::from_status(status, body));
    }
    Ok(serde_json::from_slice(body).ok())
}

pub fn decode_json<T: DeserializeOwned>(result: HttpResponse) -> Result<T, ApiError> {
    let (status, body) = read_response(result)?;
    decode_body(status, &body)
}

pub fn decode_json_optional<T: DeserializeOwned>(result: HttpResponse) -> Result<Option<T>, ApiError> {
    let (status, body) = read_response(result)?;
    decode_optional(status, &body)
}

/// POSTs `payload` as JSON.
pub fn post_json<T, F>(
    http: &Http<Event>,
    url: &str,
    payload: &T,
    idempotency_key: Option<&IdempotencyKey>,
    make_event: F,
) -> Result<(), ApiError>
where
    T: Serialize,
    F: FnOnce(HttpResponse) -> Event + Send + 'static,
{
    let mut builder = http
        .post(url)
        .header("Accept", "application/json")
        .body_json(payload)
        .map_err(|e| ApiError::Serialization {
            message: e.to_string(),
        })?;

    if let Some(key) = idempotency_key {
        builder = builder.header("Idempotency-Key", key.as_str());
    }

    builder.send(make_event);
    Ok(())
}

pub fn get_json<F>(http: &Http<Event>, url: &str, make_event: F)
where
    F: FnOnce(HttpResponse) -> Event + Send + 'static,
{
    http.get(url)
        .header("Accept", "application/json")
        .send(make_event);
}
