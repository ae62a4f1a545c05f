// SPDX-License-Identifier: PMPL-1.0-or-later
//! In-memory entity graph for the GitHub-like simulator.
//!
//! The store exclusively owns every entity; operations hand out clones or
//! build wire JSON, never long-lived references. Pull requests reference
//! labels by name only, so deleting a label a pull request still mentions
//! is well-defined: the listing simply omits it.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{json, Value};
use tracing::trace;

use crate::error::ApiError;
use crate::rules;

/// Color given to labels auto-created by name, unless the name is one of
/// the well-known defaults below.
pub const GENERIC_LABEL_COLOR: &str = "ededed";

/// The standard label set GitHub seeds into every new repository.
const DEFAULT_LABELS: &[(&str, &str, &str)] = &[
    ("bug", "d73a4a", "Something isn't working"),
    ("documentation", "0075ca", "Improvements or additions to documentation"),
    ("duplicate", "cfd3d7", "This issue or pull request already exists"),
    ("enhancement", "a2eeef", "New feature or request"),
    ("good first issue", "7057ff", "Good for newcomers"),
    ("help wanted", "008672", "Extra attention is needed"),
    ("invalid", "e4e669", "This doesn't seem right"),
    ("question", "d876e3", "Further information is requested"),
    ("wontfix", "ffffff", "This will not be worked on"),
];

fn default_color(name: &str) -> &'static str {
    DEFAULT_LABELS
        .iter()
        .find(|(n, _, _)| *n == name)
        .map(|(_, color, _)| *color)
        .unwrap_or(GENERIC_LABEL_COLOR)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub login: String,
    pub name: Option<String>,
}

impl User {
    pub(crate) fn as_json(&self) -> Value {
        json!({
            "login": self.login,
            "name": self.name,
            "type": "User",
            "url": format!("https://api.github.com/users/{}", self.login),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub name: String,
    pub color: String,
    pub description: Option<String>,
}

impl Label {
    pub(crate) fn as_json(&self) -> Value {
        json!({
            "name": self.name,
            "color": self.color,
            "description": self.description,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrState {
    Open,
    Closed,
    Merged,
}

impl PrState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
            Self::Merged => "merged",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Comment {
    pub user: String,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct PullRequest {
    pub number: u32,
    pub user: String,
    pub title: String,
    pub body: String,
    pub state: PrState,
    /// Label names, not owning references.
    pub labels: BTreeSet<String>,
    /// Append-only; creation order is the listing order.
    pub comments: Vec<Comment>,
}

#[derive(Debug)]
pub struct Repo {
    owner: String,
    name: String,
    labels: BTreeMap<String, Label>,
    pulls: BTreeMap<u32, PullRequest>,
    next_number: u32,
}

impl Repo {
    fn new(owner: &str, name: &str) -> Self {
        let labels = DEFAULT_LABELS
            .iter()
            .map(|(name, color, description)| {
                (
                    (*name).to_owned(),
                    Label {
                        name: (*name).to_owned(),
                        color: (*color).to_owned(),
                        description: Some((*description).to_owned()),
                    },
                )
            })
            .collect();
        Self {
            owner: owner.to_owned(),
            name: name.to_owned(),
            labels,
            pulls: BTreeMap::new(),
            next_number: 1,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    fn missing_label(&self, name: &str) -> ApiError {
        ApiError::NotFound(format!(
            "Label {}/{} '{}' does not exist",
            self.owner, self.name, name
        ))
    }

    fn missing_pull(&self, number: &str) -> ApiError {
        ApiError::NotFound(format!(
            "Pull request {}/{} #{} does not exist",
            self.owner, self.name, number
        ))
    }

    pub fn get_label(&self, name: &str) -> Option<&Label> {
        self.labels.get(name)
    }

    /// All labels, ordered by name.
    pub fn labels(&self) -> impl Iterator<Item = &Label> {
        self.labels.values()
    }

    pub fn create_label(
        &mut self,
        name: &str,
        color: &str,
        description: Option<String>,
    ) -> Result<Label, ApiError> {
        if self.labels.contains_key(name) {
            return Err(ApiError::already_exists("Label", "name"));
        }
        if !rules::is_label_color(color) {
            return Err(ApiError::invalid("Label", "color"));
        }
        let label = Label {
            name: name.to_owned(),
            color: color.to_owned(),
            description,
        };
        trace!(repo = %self.full_name(), label = name, "label created");
        self.labels.insert(name.to_owned(), label.clone());
        Ok(label)
    }

    pub fn update_label(
        &mut self,
        name: &str,
        new_name: &str,
        new_color: &str,
        new_description: Option<String>,
    ) -> Result<Label, ApiError> {
        if !self.labels.contains_key(name) {
            return Err(self.missing_label(name));
        }
        if new_name != name && self.labels.contains_key(new_name) {
            return Err(ApiError::already_exists("Label", "name"));
        }
        if !rules::is_label_color(new_color) {
            return Err(ApiError::invalid("Label", "color"));
        }
        self.labels.remove(name);
        let label = Label {
            name: new_name.to_owned(),
            color: new_color.to_owned(),
            description: new_description,
        };
        self.labels.insert(new_name.to_owned(), label.clone());
        Ok(label)
    }

    pub fn delete_label(&mut self, name: &str) -> Result<(), ApiError> {
        match self.labels.remove(name) {
            Some(_) => Ok(()),
            None => Err(self.missing_label(name)),
        }
    }

    /// Create a pull request and return its number. Numbers are assigned
    /// sequentially from 1 and never reused.
    pub fn create_pull_request(&mut self, user: &str, title: &str, body: &str) -> u32 {
        let number = self.next_number;
        self.next_number += 1;
        self.pulls.insert(
            number,
            PullRequest {
                number,
                user: user.to_owned(),
                title: title.to_owned(),
                body: body.to_owned(),
                state: PrState::Open,
                labels: BTreeSet::new(),
                comments: Vec::new(),
            },
        );
        trace!(repo = %self.full_name(), number, "pull request created");
        number
    }

    pub fn set_pull_state(&mut self, number: u32, state: PrState) -> Result<(), ApiError> {
        let full_name = self.full_name();
        match self.pulls.get_mut(&number) {
            Some(pr) => {
                trace!(repo = %full_name, number, state = state.as_str(), "pull request state changed");
                pr.state = state;
                Ok(())
            }
            None => Err(self.missing_pull(&number.to_string())),
        }
    }

    pub fn pull_request(&self, number: u32) -> Result<&PullRequest, ApiError> {
        self.pulls
            .get(&number)
            .ok_or_else(|| self.missing_pull(&number.to_string()))
    }

    /// 404 for a number that parses but matches nothing, and likewise for
    /// one too large to parse at all.
    pub fn pull_request_by_segment(&self, raw: &str) -> Result<&PullRequest, ApiError> {
        let number: u32 = raw.parse().map_err(|_| self.missing_pull(raw))?;
        self.pull_request(number)
    }

    /// Replace the pull request's label set wholesale. Names with no
    /// matching label are auto-created: well-known names take their
    /// standard color, anything else the generic gray.
    pub fn set_labels(&mut self, number: u32, names: &[String]) -> Result<(), ApiError> {
        if !self.pulls.contains_key(&number) {
            return Err(self.missing_pull(&number.to_string()));
        }
        for name in names {
            if !self.labels.contains_key(name) {
                self.labels.insert(
                    name.clone(),
                    Label {
                        name: name.clone(),
                        color: default_color(name).to_owned(),
                        description: None,
                    },
                );
            }
        }
        if let Some(pr) = self.pulls.get_mut(&number) {
            pr.labels = names.iter().cloned().collect();
        }
        Ok(())
    }

    pub fn add_comment(&mut self, number: u32, user: &str, body: &str) -> Result<Comment, ApiError> {
        if !self.pulls.contains_key(&number) {
            return Err(self.missing_pull(&number.to_string()));
        }
        let comment = Comment {
            user: user.to_owned(),
            body: body.to_owned(),
        };
        if let Some(pr) = self.pulls.get_mut(&number) {
            pr.comments.push(comment.clone());
        }
        Ok(comment)
    }
}

/// Entity graph owned by one `FakeGitHub` instance.
#[derive(Debug)]
pub struct GitHubState {
    login: String,
    users: BTreeMap<String, User>,
    repos: BTreeMap<String, Repo>,
}

impl GitHubState {
    /// Fresh state with the bot identity pre-registered.
    pub fn new(login: &str) -> Self {
        let mut users = BTreeMap::new();
        users.insert(
            login.to_owned(),
            User {
                login: login.to_owned(),
                name: None,
            },
        );
        Self {
            login: login.to_owned(),
            users,
            repos: BTreeMap::new(),
        }
    }

    /// Login of the simulator's own (bot) identity.
    pub fn login(&self) -> &str {
        &self.login
    }

    pub fn make_user(&mut self, login: &str, name: Option<&str>) {
        self.users.insert(
            login.to_owned(),
            User {
                login: login.to_owned(),
                name: name.map(str::to_owned),
            },
        );
    }

    /// Register `login` if unknown, deriving a display name from it.
    pub fn ensure_user(&mut self, login: &str) {
        if !self.users.contains_key(login) {
            let name = rules::display_name(login);
            self.make_user(login, Some(&name));
        }
    }

    pub fn user(&self, login: &str) -> Result<&User, ApiError> {
        self.users
            .get(login)
            .ok_or_else(|| ApiError::NotFound(format!("User {login} does not exist")))
    }

    pub fn make_repo(&mut self, owner: &str, name: &str) -> &mut Repo {
        self.repos
            .entry(format!("{owner}/{name}"))
            .or_insert_with(|| Repo::new(owner, name))
    }

    pub fn repo(&self, owner: &str, name: &str) -> Result<&Repo, ApiError> {
        self.repos
            .get(&format!("{owner}/{name}"))
            .ok_or_else(|| ApiError::NotFound(format!("Repo {owner}/{name} does not exist")))
    }

    pub fn repo_mut(&mut self, owner: &str, name: &str) -> Result<&mut Repo, ApiError> {
        self.repos
            .get_mut(&format!("{owner}/{name}"))
            .ok_or_else(|| ApiError::NotFound(format!("Repo {owner}/{name} does not exist")))
    }

    pub fn has_repo(&self, owner: &str, name: &str) -> bool {
        self.repos.contains_key(&format!("{owner}/{name}"))
    }

    /// Wire JSON for a user by login. Logins the store has never seen
    /// render with a derived display name, mirroring how the real service
    /// always has *some* record for an author.
    pub fn user_json(&self, login: &str) -> Value {
        match self.users.get(login) {
            Some(user) => user.as_json(),
            None => User {
                login: login.to_owned(),
                name: Some(rules::display_name(login)),
            }
            .as_json(),
        }
    }

    /// Full wire representation of one pull request. The label list is
    /// resolved by name, sorted, and silently omits labels that have been
    /// deleted since they were attached.
    pub fn pr_json(&self, repo: &Repo, pr: &PullRequest) -> Value {
        let labels: Vec<Value> = pr
            .labels
            .iter()
            .filter_map(|name| repo.get_label(name))
            .map(Label::as_json)
            .collect();
        json!({
            "number": pr.number,
            "user": self.user_json(&pr.user),
            "title": pr.title,
            "body": pr.body,
            "state": pr.state.as_str(),
            "labels": labels,
            "base": {"repo": {"full_name": repo.full_name()}},
            "html_url": format!("https://github.com/{}/pull/{}", repo.full_name(), pr.number),
        })
    }

    pub fn comment_json(&self, comment: &Comment) -> Value {
        json!({
            "user": self.user_json(&comment.user),
            "body": comment.body,
        })
    }
}
