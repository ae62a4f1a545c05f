// SPDX-License-Identifier: PMPL-1.0-or-later
//! forgesim - deterministic in-process simulators of forge and tracker APIs
//!
//! This crate provides test doubles for the external REST services a
//! webhook bot talks to: a GitHub-like forge and a Jira-like tracker.
//! Code written against the real API behaves identically against the
//! simulation -- same routes, same JSON shapes, same validation errors and
//! 404 sentences -- without any network access.
//!
//! # Architecture
//!
//! ```text
//! test client → MockNet → FaultInjector → Router → handlers → state
//!                              │                      │
//!                              └── RequestHistory ←───┘
//! ```
//!
//! Everything is synchronous and single-threaded: one simulator instance
//! serves one logical client, each handler runs to completion before the
//! next dispatch. Construct a fresh simulator per test so no state leaks
//! between tests.

pub mod error;
pub mod fault;
pub mod github;
pub mod history;
pub mod jira;
pub mod net;
pub mod retry;
pub mod routes;
pub mod rules;
pub mod wire;

pub use error::{ApiError, ErrorCode};
pub use fault::FaultInjector;
pub use github::FakeGitHub;
pub use jira::FakeJira;
pub use net::{MockNet, Simulator};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::{ApiError, ErrorCode};
    pub use crate::fault::FaultInjector;
    pub use crate::github::FakeGitHub;
    pub use crate::jira::FakeJira;
    pub use crate::net::{MockNet, Simulator};
    pub use crate::retry::RetryPolicy;
}
