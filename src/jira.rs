// SPDX-License-Identifier: PMPL-1.0-or-later
//! Jira-like simulator.
//!
//! A much smaller surface than the forge simulator -- field metadata,
//! issue lookup, issue creation -- built on the same route registry,
//! dispatcher, and history machinery.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use http::Method;
use regex::Captures;
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::fault::FaultInjector;
use crate::net::Simulator;
use crate::routes::{Handled, ResponseKind, Router};
use crate::wire;

/// Where the simulated tracker lives.
pub const DEFAULT_HOST: &str = "https://test.atlassian.net";

/// Issue keys are numbered from here, like a project with history.
const FIRST_ISSUE_NUMBER: u32 = 101;

#[derive(Debug, Clone)]
pub struct Field {
    pub id: String,
    pub name: String,
    pub custom: bool,
}

impl Field {
    fn as_json(&self) -> Value {
        json!({
            "id": self.id,
            "name": self.name,
            "custom": self.custom,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Issue {
    pub key: String,
    pub summary: String,
    pub description: Option<String>,
    pub issue_type: String,
    pub labels: Vec<String>,
    pub status: String,
}

#[derive(Debug)]
struct JiraState {
    host: String,
    fields: Vec<Field>,
    issues: BTreeMap<String, Issue>,
    next_numbers: BTreeMap<String, u32>,
    next_id: u64,
}

impl JiraState {
    fn new(host: &str) -> Self {
        Self {
            host: host.to_owned(),
            fields: default_fields(),
            issues: BTreeMap::new(),
            next_numbers: BTreeMap::new(),
            next_id: 10_000,
        }
    }

    fn issue(&self, key: &str) -> Result<&Issue, ApiError> {
        self.issues
            .get(key)
            .ok_or_else(|| ApiError::NotFound(format!("Issue {key} does not exist")))
    }

    fn next_key(&mut self, project: &str) -> String {
        let number = self
            .next_numbers
            .entry(project.to_owned())
            .or_insert(FIRST_ISSUE_NUMBER);
        let key = format!("{project}-{number}");
        *number += 1;
        key
    }

    fn issue_json(&self, issue: &Issue) -> Value {
        json!({
            "key": issue.key,
            "self": format!("{}/rest/api/2/issue/{}", self.host, issue.key),
            "fields": {
                "summary": issue.summary,
                "description": issue.description,
                "issuetype": {"name": issue.issue_type},
                "labels": issue.labels,
                "status": {"name": issue.status},
            },
        })
    }
}

fn default_fields() -> Vec<Field> {
    let standard = [
        ("summary", "Summary"),
        ("description", "Description"),
        ("issuetype", "Issue Type"),
        ("labels", "Labels"),
        ("status", "Status"),
    ];
    let custom = [
        ("customfield_10001", "Sprint"),
        ("customfield_10002", "Story Points"),
    ];
    standard
        .iter()
        .map(|(id, name)| Field {
            id: (*id).to_owned(),
            name: (*name).to_owned(),
            custom: false,
        })
        .chain(custom.iter().map(|(id, name)| Field {
            id: (*id).to_owned(),
            name: (*name).to_owned(),
            custom: true,
        }))
        .collect()
}

pub struct FakeJira {
    host: String,
    state: Rc<RefCell<JiraState>>,
    router: Rc<Router>,
}

impl FakeJira {
    pub fn new() -> Self {
        Self::with_faults(FaultInjector::disabled())
    }

    pub fn with_faults(faults: FaultInjector) -> Self {
        let state = Rc::new(RefCell::new(JiraState::new(DEFAULT_HOST)));
        let mut router = Router::with_faults(faults);
        install_routes(&mut router, &state);
        Self {
            host: DEFAULT_HOST.to_owned(),
            state,
            router: Rc::new(router),
        }
    }

    /// Register an issue directly, for test setup.
    pub fn make_issue(&self, key: &str, summary: &str) -> Issue {
        let issue = Issue {
            key: key.to_owned(),
            summary: summary.to_owned(),
            description: None,
            issue_type: "Task".to_owned(),
            labels: Vec::new(),
            status: "Open".to_owned(),
        };
        self.state
            .borrow_mut()
            .issues
            .insert(key.to_owned(), issue.clone());
        issue
    }

    pub fn get_issue(&self, key: &str) -> Option<Issue> {
        self.state.borrow().issues.get(key).cloned()
    }

    pub fn requests_made(
        &self,
        path_pattern: Option<&str>,
        method: Option<&Method>,
    ) -> Vec<(String, Method)> {
        self.router.requests_made(path_pattern, method)
    }
}

impl Default for FakeJira {
    fn default() -> Self {
        Self::new()
    }
}

impl Simulator for FakeJira {
    fn host(&self) -> &str {
        &self.host
    }

    fn router(&self) -> Rc<Router> {
        Rc::clone(&self.router)
    }
}

fn seg(caps: &Captures<'_>, index: usize) -> String {
    wire::decode_segment(&caps[index])
}

fn install_routes(router: &mut Router, state: &Rc<RefCell<JiraState>>) {
    let st = Rc::clone(state);
    router.route(
        Method::GET,
        "/rest/api/2/field",
        ResponseKind::Json,
        move |_caps, _req| {
            let state = st.borrow();
            let fields: Vec<Value> = state.fields.iter().map(Field::as_json).collect();
            Ok(Handled::ok(Value::Array(fields)))
        },
    );

    let st = Rc::clone(state);
    router.route(
        Method::GET,
        "/rest/api/2/issue/([^/]+)",
        ResponseKind::Json,
        move |caps, _req| {
            let key = seg(caps, 1);
            let state = st.borrow();
            let issue = state.issue(&key)?;
            Ok(Handled::ok(state.issue_json(issue)))
        },
    );

    let st = Rc::clone(state);
    router.route(
        Method::POST,
        "/rest/api/2/issue",
        ResponseKind::Json,
        move |_caps, req| {
            let fields = req.body_field("fields").cloned().unwrap_or_default();
            let project = fields["project"]["key"].as_str().unwrap_or("TEST").to_owned();
            let mut state = st.borrow_mut();
            let key = state.next_key(&project);
            let issue = Issue {
                key: key.clone(),
                summary: fields["summary"].as_str().unwrap_or_default().to_owned(),
                description: fields["description"].as_str().map(str::to_owned),
                issue_type: fields["issuetype"]["name"]
                    .as_str()
                    .unwrap_or("Task")
                    .to_owned(),
                labels: fields["labels"]
                    .as_array()
                    .map(|arr| {
                        arr.iter()
                            .filter_map(Value::as_str)
                            .map(str::to_owned)
                            .collect()
                    })
                    .unwrap_or_default(),
                status: "Open".to_owned(),
            };
            state.issues.insert(key.clone(), issue);
            state.next_id += 1;
            let id = state.next_id;
            Ok(Handled::created(json!({
                "id": id.to_string(),
                "key": key,
                "self": format!("{}/rest/api/2/issue/{}", state.host, key),
            })))
        },
    );
}
