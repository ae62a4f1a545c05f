// SPDX-License-Identifier: PMPL-1.0-or-later
//! Append-only log of every request a simulator has dispatched.
//!
//! Used for post-hoc assertions about what the system under test actually
//! did. Entries are recorded in arrival order and never deduplicated;
//! failed and fault-injected requests are logged like any other.

use http::Method;
use regex::Regex;

#[derive(Debug, Default)]
pub struct RequestHistory {
    entries: Vec<(String, Method)>,
}

impl RequestHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one dispatched request.
    pub fn record(&mut self, path: &str, method: &Method) {
        self.entries.push((path.to_owned(), method.clone()));
    }

    /// The `(path, method)` pairs recorded so far, optionally narrowed by a
    /// path regex (searched, not anchored) and/or an exact method. Both
    /// filters compose; ordering is strictly arrival order.
    ///
    /// Panics on an invalid filter pattern: that is a bug in the test
    /// itself and should fail loudly.
    pub fn matching(
        &self,
        path_pattern: Option<&str>,
        method: Option<&Method>,
    ) -> Vec<(String, Method)> {
        let pattern =
            path_pattern.map(|p| Regex::new(p).expect("invalid history filter pattern"));
        self.entries
            .iter()
            .filter(|(path, m)| {
                if let Some(want) = method {
                    if *want != *m {
                        return false;
                    }
                }
                if let Some(re) = &pattern {
                    if !re.is_match(path) {
                        return false;
                    }
                }
                true
            })
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
