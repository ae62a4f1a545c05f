// SPDX-License-Identifier: PMPL-1.0-or-later
//! In-process stand-in for the HTTP transport.
//!
//! Tests mount one or more simulators under their host prefixes and then
//! issue ordinary-looking calls (`get`, `post`, ...). There are no sockets
//! and no TLS; a URL is resolved by prefix match and the remainder of it is
//! dispatched as the request path.
//!
//! A request to an un-mounted host, or one no route matches, panics with
//! the offending method and URL: that is a bug in the test or the
//! simulator and must fail loudly.

use std::rc::Rc;

use http::Method;
use serde_json::Value;

use crate::routes::Router;
use crate::wire::{Request, Response};

/// An installable in-process service: a host prefix plus its route table.
pub trait Simulator {
    /// Host prefix requests are anchored to, e.g. `https://api.github.com`.
    fn host(&self) -> &str;

    /// The service's route table, shared with the simulator itself.
    fn router(&self) -> Rc<Router>;
}

/// The interception layer: routes client calls to mounted simulators.
#[derive(Default)]
pub struct MockNet {
    mounts: Vec<(String, Rc<Router>)>,
}

impl MockNet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount a simulator under its host prefix.
    pub fn install(&mut self, simulator: &dyn Simulator) {
        self.mounts
            .push((simulator.host().to_owned(), simulator.router()));
    }

    pub fn get(&self, url: &str) -> Response {
        self.request(Method::GET, url, None)
    }

    pub fn post(&self, url: &str, body: Value) -> Response {
        self.request(Method::POST, url, Some(body))
    }

    pub fn patch(&self, url: &str, body: Value) -> Response {
        self.request(Method::PATCH, url, Some(body))
    }

    pub fn delete(&self, url: &str) -> Response {
        self.request(Method::DELETE, url, None)
    }

    /// Resolve `url` against the mounted simulators and dispatch it.
    pub fn request(&self, method: Method, url: &str, body: Option<Value>) -> Response {
        let (host, router) = self
            .mounts
            .iter()
            .find(|(host, _)| url.starts_with(host.as_str()))
            .unwrap_or_else(|| panic!("no simulator mounted for {url}"));
        let path = url[host.len()..].to_owned();
        let request = Request {
            method: method.clone(),
            path,
            body,
        };
        router
            .dispatch(&request)
            .unwrap_or_else(|| panic!("no route matches {method} {url}"))
    }
}
