// SPDX-License-Identifier: PMPL-1.0-or-later
//! Error taxonomy for simulated API failures.
//!
//! Every failure a handler can legitimately produce is one of these
//! variants; the dispatcher converts them into the matching HTTP response.
//! Anything else that goes wrong inside a handler is a bug in the simulator
//! and is allowed to panic so tests fail loudly instead of masking it.

use http::StatusCode;
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

/// Machine-readable validation failure codes, spelled the way the real
/// service spells them in its error envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    AlreadyExists,
    Invalid,
}

/// A failure a simulated endpoint can return on the wire.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    /// Malformed or conflicting input, e.g. a duplicate label name or a
    /// color that is not six lowercase hex digits.
    #[error("validation failed: {resource} {field}")]
    Validation {
        resource: &'static str,
        code: ErrorCode,
        field: &'static str,
    },

    /// A repository, label, pull request, user, or issue that does not
    /// exist. The message is the human-readable sentence sent on the wire.
    #[error("{0}")]
    NotFound(String),

    /// Synthetic failure from the fault injector. Indistinguishable on the
    /// wire from a real 404; never produced by a handler.
    #[error("injected fault")]
    FaultInjected,
}

impl ApiError {
    /// Shorthand for a duplicate-resource validation failure.
    pub fn already_exists(resource: &'static str, field: &'static str) -> Self {
        Self::Validation {
            resource,
            code: ErrorCode::AlreadyExists,
            field,
        }
    }

    /// Shorthand for a malformed-field validation failure.
    pub fn invalid(resource: &'static str, field: &'static str) -> Self {
        Self::Validation {
            resource,
            code: ErrorCode::Invalid,
            field,
        }
    }

    /// The HTTP status this error maps to.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NotFound(_) | Self::FaultInjected => StatusCode::NOT_FOUND,
        }
    }

    /// The JSON error envelope sent as the response body.
    pub fn body(&self) -> Value {
        match self {
            Self::Validation {
                resource,
                code,
                field,
            } => json!({
                "message": "Validation Failed",
                "errors": [{"resource": resource, "code": code, "field": field}],
            }),
            Self::NotFound(message) => json!({ "message": message }),
            Self::FaultInjected => json!({ "message": "Not Found" }),
        }
    }
}
