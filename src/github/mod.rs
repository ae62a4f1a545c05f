// SPDX-License-Identifier: PMPL-1.0-or-later
//! GitHub-like simulator.
//!
//! Reproduces the wire behavior of the forge API the bot talks to:
//! repositories with labels, pull requests, comments, and users, plus the
//! validation errors and 404 sentences the real service sends. One
//! instance per test; construct it fresh so no state leaks between tests.

mod store;

pub use store::{
    Comment, GitHubState, Label, PrState, PullRequest, Repo, User, GENERIC_LABEL_COLOR,
};

use std::cell::RefCell;
use std::rc::Rc;

use http::Method;
use regex::Captures;
use serde_json::{json, Value};

use crate::fault::FaultInjector;
use crate::net::Simulator;
use crate::routes::{Handled, ResponseKind, Router};
use crate::wire;

/// Where the simulated API lives, matching the real service so client
/// code under test needs no reconfiguration.
pub const DEFAULT_HOST: &str = "https://api.github.com";

/// Bot login used when a test does not pick one.
pub const DEFAULT_LOGIN: &str = "webhook-bot";

pub struct FakeGitHub {
    host: String,
    state: Rc<RefCell<GitHubState>>,
    router: Rc<Router>,
}

impl FakeGitHub {
    pub fn new() -> Self {
        Self::with_login(DEFAULT_LOGIN)
    }

    pub fn with_login(login: &str) -> Self {
        Self::build(login, FaultInjector::disabled())
    }

    /// Simulator whose dispatch is subject to the given fault injector.
    pub fn with_faults(login: &str, faults: FaultInjector) -> Self {
        Self::build(login, faults)
    }

    fn build(login: &str, faults: FaultInjector) -> Self {
        let state = Rc::new(RefCell::new(GitHubState::new(login)));
        let mut router = Router::with_faults(faults);
        install_routes(&mut router, &state);
        Self {
            host: DEFAULT_HOST.to_owned(),
            state,
            router: Rc::new(router),
        }
    }

    /// The authenticated bot identity.
    pub fn login(&self) -> String {
        self.state.borrow().login().to_owned()
    }

    pub fn make_user(&self, login: &str, name: &str) {
        self.state.borrow_mut().make_user(login, Some(name));
    }

    /// Create (or fetch) a repository, seeded with the standard labels.
    pub fn make_repo(&self, owner: &str, name: &str) -> RepoHandle {
        self.state.borrow_mut().make_repo(owner, name);
        RepoHandle {
            state: Rc::clone(&self.state),
            owner: owner.to_owned(),
            name: name.to_owned(),
        }
    }

    pub fn get_repo(&self, owner: &str, name: &str) -> Option<RepoHandle> {
        if self.state.borrow().has_repo(owner, name) {
            Some(RepoHandle {
                state: Rc::clone(&self.state),
                owner: owner.to_owned(),
                name: name.to_owned(),
            })
        } else {
            None
        }
    }

    /// Filtered view of every request dispatched to this simulator; see
    /// [`crate::history::RequestHistory::matching`].
    pub fn requests_made(
        &self,
        path_pattern: Option<&str>,
        method: Option<&Method>,
    ) -> Vec<(String, Method)> {
        self.router.requests_made(path_pattern, method)
    }
}

impl Default for FakeGitHub {
    fn default() -> Self {
        Self::new()
    }
}

impl Simulator for FakeGitHub {
    fn host(&self) -> &str {
        &self.host
    }

    fn router(&self) -> Rc<Router> {
        Rc::clone(&self.router)
    }
}

/// Test-setup view of one repository.
#[derive(Clone)]
pub struct RepoHandle {
    state: Rc<RefCell<GitHubState>>,
    owner: String,
    name: String,
}

impl RepoHandle {
    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get_label(&self, name: &str) -> Option<Label> {
        self.state
            .borrow()
            .repo(&self.owner, &self.name)
            .ok()?
            .get_label(name)
            .cloned()
    }

    /// Start building a pull request; finish with
    /// [`PullRequestBuilder::create`].
    pub fn make_pull_request(&self) -> PullRequestBuilder {
        PullRequestBuilder {
            repo: self.clone(),
            user: "user".to_owned(),
            title: String::new(),
            body: String::new(),
        }
    }

    pub fn pull(&self, number: u32) -> Option<PullRequestHandle> {
        self.state
            .borrow()
            .repo(&self.owner, &self.name)
            .ok()?
            .pull_request(number)
            .ok()?;
        Some(PullRequestHandle {
            repo: self.clone(),
            number,
        })
    }
}

pub struct PullRequestBuilder {
    repo: RepoHandle,
    user: String,
    title: String,
    body: String,
}

impl PullRequestBuilder {
    pub fn user(mut self, login: &str) -> Self {
        self.user = login.to_owned();
        self
    }

    pub fn title(mut self, title: &str) -> Self {
        self.title = title.to_owned();
        self
    }

    pub fn body(mut self, body: &str) -> Self {
        self.body = body.to_owned();
        self
    }

    pub fn create(self) -> PullRequestHandle {
        let mut state = self.repo.state.borrow_mut();
        state.ensure_user(&self.user);
        let number = state
            .make_repo(&self.repo.owner, &self.repo.name)
            .create_pull_request(&self.user, &self.title, &self.body);
        drop(state);
        PullRequestHandle {
            repo: self.repo,
            number,
        }
    }
}

/// Test-setup view of one pull request.
pub struct PullRequestHandle {
    repo: RepoHandle,
    number: u32,
}

impl PullRequestHandle {
    pub fn number(&self) -> u32 {
        self.number
    }

    /// Snapshot of the current state of this pull request.
    pub fn snapshot(&self) -> Option<PullRequest> {
        self.repo
            .state
            .borrow()
            .repo(&self.repo.owner, &self.repo.name)
            .ok()?
            .pull_request(self.number)
            .ok()
            .cloned()
    }

    /// The current label-name set.
    pub fn labels(&self) -> std::collections::BTreeSet<String> {
        self.snapshot().map(|pr| pr.labels).unwrap_or_default()
    }

    /// Comments in the order they were added.
    pub fn comments(&self) -> Vec<Comment> {
        self.snapshot().map(|pr| pr.comments).unwrap_or_default()
    }

    /// Close this pull request; `merged` marks it as merged rather than
    /// merely closed.
    pub fn close(&self, merged: bool) {
        let state = if merged {
            PrState::Merged
        } else {
            PrState::Closed
        };
        self.repo
            .state
            .borrow_mut()
            .repo_mut(&self.repo.owner, &self.repo.name)
            .and_then(|repo| repo.set_pull_state(self.number, state))
            .expect("pull request vanished");
    }

    /// Add a comment as an explicit user (registered on demand).
    pub fn add_comment(&self, user: &str, body: &str) {
        let mut state = self.repo.state.borrow_mut();
        state.ensure_user(user);
        state
            .repo_mut(&self.repo.owner, &self.repo.name)
            .and_then(|repo| repo.add_comment(self.number, user, body))
            .expect("pull request vanished");
    }
}

fn seg(caps: &Captures<'_>, index: usize) -> String {
    wire::decode_segment(&caps[index])
}

fn install_routes(router: &mut Router, state: &Rc<RefCell<GitHubState>>) {
    let st = Rc::clone(state);
    router.route(Method::GET, "/user", ResponseKind::Json, move |_caps, _req| {
        let state = st.borrow();
        Ok(Handled::ok(json!({ "login": state.login() })))
    });

    let st = Rc::clone(state);
    router.route(
        Method::GET,
        "/users/([^/]+)",
        ResponseKind::Json,
        move |caps, _req| {
            let login = seg(caps, 1);
            let state = st.borrow();
            Ok(Handled::ok(state.user(&login)?.as_json()))
        },
    );

    let st = Rc::clone(state);
    router.route(
        Method::GET,
        "/repos/([^/]+)/([^/]+)/labels",
        ResponseKind::Json,
        move |caps, _req| {
            let state = st.borrow();
            let repo = state.repo(&seg(caps, 1), &seg(caps, 2))?;
            let labels: Vec<Value> = repo.labels().map(Label::as_json).collect();
            Ok(Handled::ok(Value::Array(labels)))
        },
    );

    let st = Rc::clone(state);
    router.route(
        Method::POST,
        "/repos/([^/]+)/([^/]+)/labels",
        ResponseKind::Json,
        move |caps, req| {
            let mut state = st.borrow_mut();
            let repo = state.repo_mut(&seg(caps, 1), &seg(caps, 2))?;
            let label = repo.create_label(
                req.body_str("name").unwrap_or_default(),
                req.body_str("color").unwrap_or_default(),
                req.body_str("description").map(str::to_owned),
            )?;
            Ok(Handled::created(label.as_json()))
        },
    );

    let st = Rc::clone(state);
    router.route(
        Method::PATCH,
        "/repos/([^/]+)/([^/]+)/labels/([^/]+)",
        ResponseKind::Json,
        move |caps, req| {
            let label_name = seg(caps, 3);
            let mut state = st.borrow_mut();
            let repo = state.repo_mut(&seg(caps, 1), &seg(caps, 2))?;
            let new_name = req
                .body_str("name")
                .map(str::to_owned)
                .unwrap_or_else(|| label_name.clone());
            let new_color = match req.body_str("color") {
                Some(color) => color.to_owned(),
                None => repo
                    .get_label(&label_name)
                    .map(|l| l.color.clone())
                    .unwrap_or_default(),
            };
            let new_description = req
                .body_str("description")
                .map(str::to_owned)
                .or_else(|| repo.get_label(&label_name).and_then(|l| l.description.clone()));
            let label = repo.update_label(&label_name, &new_name, &new_color, new_description)?;
            Ok(Handled::ok(label.as_json()))
        },
    );

    let st = Rc::clone(state);
    router.route(
        Method::DELETE,
        "/repos/([^/]+)/([^/]+)/labels/([^/]+)",
        ResponseKind::Json,
        move |caps, _req| {
            let label_name = seg(caps, 3);
            let mut state = st.borrow_mut();
            let repo = state.repo_mut(&seg(caps, 1), &seg(caps, 2))?;
            repo.delete_label(&label_name)?;
            Ok(Handled::no_content())
        },
    );

    let st = Rc::clone(state);
    router.route(
        Method::GET,
        "/repos/([^/]+)/([^/]+)/pulls/([0-9]+)",
        ResponseKind::Json,
        move |caps, _req| {
            let state = st.borrow();
            let repo = state.repo(&seg(caps, 1), &seg(caps, 2))?;
            let pr = repo.pull_request_by_segment(&caps[3])?;
            Ok(Handled::ok(state.pr_json(repo, pr)))
        },
    );

    let st = Rc::clone(state);
    router.route(
        Method::POST,
        "/repos/([^/]+)/([^/]+)/pulls",
        ResponseKind::Json,
        move |caps, req| {
            let (owner, name) = (seg(caps, 1), seg(caps, 2));
            let mut state = st.borrow_mut();
            state.repo(&owner, &name)?;
            let user = req.body_str("user").unwrap_or("user").to_owned();
            let title = req.body_str("title").unwrap_or_default().to_owned();
            let body_text = req.body_str("body").unwrap_or_default().to_owned();
            state.ensure_user(&user);
            let number = state
                .repo_mut(&owner, &name)?
                .create_pull_request(&user, &title, &body_text);
            let repo = state.repo(&owner, &name)?;
            let pr = repo.pull_request(number)?;
            Ok(Handled::created(state.pr_json(repo, pr)))
        },
    );

    let st = Rc::clone(state);
    router.route(
        Method::PATCH,
        "/repos/([^/]+)/([^/]+)/issues/([0-9]+)",
        ResponseKind::Json,
        move |caps, req| {
            let names: Option<Vec<String>> = req
                .body_field("labels")
                .and_then(Value::as_array)
                .map(|arr| {
                    arr.iter()
                        .filter_map(Value::as_str)
                        .map(str::to_owned)
                        .collect()
                });
            let (owner, name) = (seg(caps, 1), seg(caps, 2));
            let mut state = st.borrow_mut();
            let number;
            {
                let repo = state.repo_mut(&owner, &name)?;
                number = repo.pull_request_by_segment(&caps[3])?.number;
                if let Some(names) = &names {
                    repo.set_labels(number, names)?;
                }
                // "merged" is not settable over the wire, as on the real
                // service.
                match req.body_str("state") {
                    Some("closed") => repo.set_pull_state(number, PrState::Closed)?,
                    Some("open") => repo.set_pull_state(number, PrState::Open)?,
                    _ => {}
                }
            }
            let repo = state.repo(&owner, &name)?;
            let pr = repo.pull_request(number)?;
            Ok(Handled::ok(state.pr_json(repo, pr)))
        },
    );

    let st = Rc::clone(state);
    router.route(
        Method::GET,
        "/repos/([^/]+)/([^/]+)/issues/([0-9]+)/comments",
        ResponseKind::Json,
        move |caps, _req| {
            let state = st.borrow();
            let repo = state.repo(&seg(caps, 1), &seg(caps, 2))?;
            let pr = repo.pull_request_by_segment(&caps[3])?;
            let comments: Vec<Value> = pr.comments.iter().map(|c| state.comment_json(c)).collect();
            Ok(Handled::ok(Value::Array(comments)))
        },
    );

    let st = Rc::clone(state);
    router.route(
        Method::POST,
        "/repos/([^/]+)/([^/]+)/issues/([0-9]+)/comments",
        ResponseKind::Json,
        move |caps, req| {
            let (owner, name) = (seg(caps, 1), seg(caps, 2));
            let mut state = st.borrow_mut();
            // The authenticated caller comments unless the body names a user.
            let user = req
                .body_str("user")
                .map(str::to_owned)
                .unwrap_or_else(|| state.login().to_owned());
            state.ensure_user(&user);
            let comment = {
                let repo = state.repo_mut(&owner, &name)?;
                let number = repo.pull_request_by_segment(&caps[3])?.number;
                repo.add_comment(number, &user, req.body_str("body").unwrap_or_default())?
            };
            Ok(Handled::ok(state.comment_json(&comment)))
        },
    );
}
