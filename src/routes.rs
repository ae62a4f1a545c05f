// SPDX-License-Identifier: PMPL-1.0-or-later
//! Route registry and dispatcher.
//!
//! A simulator registers each endpoint explicitly: path pattern, HTTP
//! method, response kind, and a plain handler closure. The route table is
//! statically enumerable; there is no reflection or runtime scanning.
//!
//! Dispatch is synchronous and single-threaded: one logical client per
//! simulator instance, each handler runs to completion before the next
//! request is dispatched. Taxonomy errors raised by handlers are converted
//! to HTTP responses at this boundary and never escape to the caller.

use std::cell::RefCell;

use http::{Method, StatusCode};
use regex::{Captures, Regex};
use serde_json::Value;
use tracing::debug;

use crate::error::ApiError;
use crate::fault::FaultInjector;
use crate::history::RequestHistory;
use crate::wire::{Body, Request, Response};

/// How a handler's successful payload is encoded on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    Json,
    Text,
}

/// Successful handler outcome: a status code plus the payload to encode.
#[derive(Debug, Clone)]
pub struct Handled {
    pub status: StatusCode,
    pub body: Value,
}

impl Handled {
    pub fn ok(body: Value) -> Self {
        Self {
            status: StatusCode::OK,
            body,
        }
    }

    pub fn created(body: Value) -> Self {
        Self {
            status: StatusCode::CREATED,
            body,
        }
    }

    pub fn no_content() -> Self {
        Self {
            status: StatusCode::NO_CONTENT,
            body: Value::Null,
        }
    }
}

pub type HandlerResult = Result<Handled, ApiError>;

type Handler = Box<dyn Fn(&Captures<'_>, &Request) -> HandlerResult>;

struct Route {
    method: Method,
    pattern: Regex,
    kind: ResponseKind,
    handler: Handler,
}

/// Route registry and dispatcher for one simulator instance.
///
/// Owns the request history and the fault injector so that every
/// dispatched request is recorded, and every routed one is subject to one
/// fault decision, whatever its outcome.
pub struct Router {
    routes: Vec<Route>,
    history: RefCell<RequestHistory>,
    faults: FaultInjector,
}

impl Router {
    pub fn new() -> Self {
        Self::with_faults(FaultInjector::disabled())
    }

    pub fn with_faults(faults: FaultInjector) -> Self {
        Self {
            routes: Vec::new(),
            history: RefCell::new(RequestHistory::new()),
            faults,
        }
    }

    /// Bind one operation. The pattern is anchored `^…$` when matched
    /// against the request path; capture groups become the handler's path
    /// arguments. Panics on an invalid pattern, which is a bug in the
    /// simulator itself.
    pub fn route<F>(&mut self, method: Method, pattern: &str, kind: ResponseKind, handler: F)
    where
        F: Fn(&Captures<'_>, &Request) -> HandlerResult + 'static,
    {
        let anchored = format!("^{pattern}$");
        let pattern = Regex::new(&anchored).expect("invalid route pattern");
        self.routes.push(Route {
            method,
            pattern,
            kind,
            handler: Box::new(handler),
        });
    }

    /// Dispatch one request. Returns `None` when no registered route
    /// matches; what an unhandled request means is the interception
    /// layer's decision, not ours.
    pub fn dispatch(&self, request: &Request) -> Option<Response> {
        self.history
            .borrow_mut()
            .record(&request.path, &request.method);

        // Match before the fault draw so a request nothing routes stays
        // unhandled instead of passing as a synthetic 404.
        let route = self
            .routes
            .iter()
            .find(|r| r.method == request.method && r.pattern.is_match(&request.path))?;

        if self.faults.should_fault() {
            debug!(method = %request.method, path = %request.path, "fault injected, handler skipped");
            return Some(error_response(&ApiError::FaultInjected));
        }

        let caps = route.pattern.captures(&request.path)?;
        debug!(method = %request.method, path = %request.path, "dispatching");
        Some(match (route.handler)(&caps, request) {
            Ok(handled) => encode(route.kind, handled),
            Err(err) => error_response(&err),
        })
    }

    /// Filtered view of the request history; see
    /// [`RequestHistory::matching`].
    pub fn requests_made(
        &self,
        path_pattern: Option<&str>,
        method: Option<&Method>,
    ) -> Vec<(String, Method)> {
        self.history.borrow().matching(path_pattern, method)
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

fn encode(kind: ResponseKind, handled: Handled) -> Response {
    let body = match (kind, handled.body) {
        (_, Value::Null) => Body::Empty,
        (ResponseKind::Json, value) => Body::Json(value),
        (ResponseKind::Text, Value::String(text)) => Body::Text(text),
        (ResponseKind::Text, value) => Body::Text(value.to_string()),
    };
    Response {
        status: handled.status,
        body,
    }
}

fn error_response(err: &ApiError) -> Response {
    Response {
        status: err.status(),
        body: Body::Json(err.body()),
    }
}
