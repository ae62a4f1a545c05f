// SPDX-License-Identifier: PMPL-1.0-or-later
//! Wire-level request/response model shared by every simulator.
//!
//! Requests carry the percent-encoded path exactly as a real client would
//! send it; handlers decode individual captured segments with
//! [`decode_segment`] when they need the literal value (label names may
//! contain spaces, sent as `%20`).

use http::{Method, StatusCode};
use percent_encoding::percent_decode_str;
use serde_json::Value;

/// A single simulated HTTP request as seen by the dispatcher.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    /// Percent-encoded path, without scheme, host, or query string.
    pub path: String,
    /// Parsed JSON body, when the caller sent one.
    pub body: Option<Value>,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
        }
    }

    pub fn with_body(method: Method, path: impl Into<String>, body: Value) -> Self {
        Self {
            method,
            path: path.into(),
            body: Some(body),
        }
    }

    /// String field from the JSON body, if present.
    pub fn body_str(&self, field: &str) -> Option<&str> {
        self.body.as_ref()?.get(field)?.as_str()
    }

    /// Arbitrary field from the JSON body, if present.
    pub fn body_field(&self, field: &str) -> Option<&Value> {
        self.body.as_ref()?.get(field)
    }
}

/// Response payload. `Empty` is a bodyless success such as a 204.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Json(Value),
    Text(String),
    Empty,
}

/// A simulated HTTP response.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub body: Body,
}

impl Response {
    /// The JSON body, if this response carries one.
    pub fn json(&self) -> Option<&Value> {
        match &self.body {
            Body::Json(value) => Some(value),
            _ => None,
        }
    }

    /// The plain-text body, if this response carries one.
    pub fn text(&self) -> Option<&str> {
        match &self.body {
            Body::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// Decode a percent-encoded path segment captured from a route pattern.
pub fn decode_segment(raw: &str) -> String {
    percent_decode_str(raw).decode_utf8_lossy().into_owned()
}
