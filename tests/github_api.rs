// SPDX-License-Identifier: PMPL-1.0-or-later
//! Integration tests for the GitHub-like simulator.
//!
//! Tests cover:
//! - Request history recording and filtering
//! - User identity endpoints
//! - Label CRUD, validation errors, and the default label set
//! - Pull request creation, lookup, and label replacement
//! - Comment listing and posting

use http::Method;
use serde_json::json;

use forgesim::{FakeGitHub, MockNet};

fn setup() -> (MockNet, FakeGitHub) {
    let github = FakeGitHub::new();
    let mut net = MockNet::new();
    net.install(&github);
    (net, github)
}

// =============================================================================
// Request History Tests
// =============================================================================

#[test]
fn test_requests_made() {
    let (net, github) = setup();
    net.get("https://api.github.com/repos/xyzzy/quux/pulls/1");
    net.get("https://api.github.com/repos/xyzzy/quux/pulls/1234");
    net.post("https://api.github.com/repos/xyzzy/quux/labels", json!({}));
    net.delete("https://api.github.com/repos/xyzzy/quux/labels/bug123");

    assert_eq!(
        github.requests_made(None, None),
        vec![
            ("/repos/xyzzy/quux/pulls/1".to_string(), Method::GET),
            ("/repos/xyzzy/quux/pulls/1234".to_string(), Method::GET),
            ("/repos/xyzzy/quux/labels".to_string(), Method::POST),
            ("/repos/xyzzy/quux/labels/bug123".to_string(), Method::DELETE),
        ]
    );
    assert_eq!(
        github.requests_made(None, Some(&Method::GET)),
        vec![
            ("/repos/xyzzy/quux/pulls/1".to_string(), Method::GET),
            ("/repos/xyzzy/quux/pulls/1234".to_string(), Method::GET),
        ]
    );
    assert_eq!(
        github.requests_made(Some("123"), None),
        vec![
            ("/repos/xyzzy/quux/pulls/1234".to_string(), Method::GET),
            ("/repos/xyzzy/quux/labels/bug123".to_string(), Method::DELETE),
        ]
    );
    assert_eq!(
        github.requests_made(Some("123"), Some(&Method::GET)),
        vec![("/repos/xyzzy/quux/pulls/1234".to_string(), Method::GET)]
    );
}

// =============================================================================
// User Tests
// =============================================================================

#[test]
fn test_get_me() {
    let (net, _github) = setup();
    let resp = net.get("https://api.github.com/user");
    assert_eq!(resp.status.as_u16(), 200);
    assert_eq!(resp.json(), Some(&json!({"login": "webhook-bot"})));
}

#[test]
fn test_get_user() {
    let (net, github) = setup();
    github.make_user("nedbat", "Ned Batchelder");
    let resp = net.get("https://api.github.com/users/nedbat");
    assert_eq!(resp.status.as_u16(), 200);
    let user = resp.json().unwrap();
    assert_eq!(user["login"], "nedbat");
    assert_eq!(user["name"], "Ned Batchelder");
    assert_eq!(user["type"], "User");
    assert_eq!(user["url"], "https://api.github.com/users/nedbat");
}

#[test]
fn test_get_unknown_user() {
    let (net, _github) = setup();
    let resp = net.get("https://api.github.com/users/stranger");
    assert_eq!(resp.status.as_u16(), 404);
}

// =============================================================================
// Repo Tests
// =============================================================================

#[test]
fn test_make_repo() {
    let (_net, github) = setup();
    let repo = github.make_repo("an-org", "a-repo");
    assert_eq!(repo.owner(), "an-org");
    assert_eq!(repo.name(), "a-repo");
    let again = github.get_repo("an-org", "a-repo").unwrap();
    assert_eq!(again.owner(), "an-org");
    assert_eq!(again.name(), "a-repo");
    assert!(github.get_repo("an-org", "other").is_none());
}

// =============================================================================
// Label Tests
// =============================================================================

const BOGUS_COLORS: [&str; 4] = ["red please", "#ff000", "f00", "12345g"];

#[test]
fn test_get_default_labels() {
    let (net, github) = setup();
    github.make_repo("an-org", "a-repo");
    let resp = net.get("https://api.github.com/repos/an-org/a-repo/labels");
    assert_eq!(resp.status.as_u16(), 200);
    let labels = resp.json().unwrap().as_array().unwrap();
    assert_eq!(labels.len(), 9);
    assert!(labels.contains(&json!({
        "name": "invalid",
        "color": "e4e669",
        "description": "This doesn't seem right",
    })));
}

#[test]
fn test_create_label() {
    let (net, github) = setup();
    let repo = github.make_repo("an-org", "a-repo");
    // At first, the label doesn't exist.
    assert!(repo.get_label("nice").is_none());

    let resp = net.post(
        "https://api.github.com/repos/an-org/a-repo/labels",
        json!({"name": "nice", "color": "ff0000"}),
    );
    assert_eq!(resp.status.as_u16(), 201);
    let label_json = resp.json().unwrap();
    assert_eq!(label_json["name"], "nice");
    assert_eq!(label_json["color"], "ff0000");
    assert!(label_json["description"].is_null());

    // Now the label does exist.
    let label = repo.get_label("nice").unwrap();
    assert_eq!(label.name, "nice");
    assert_eq!(label.color, "ff0000");
    assert_eq!(label.description, None);
}

#[test]
fn test_cant_create_duplicate_label() {
    let (net, github) = setup();
    github.make_repo("an-org", "a-repo");
    // "bug" is already seeded by the default label set.
    let resp = net.post(
        "https://api.github.com/repos/an-org/a-repo/labels",
        json!({"name": "bug", "color": "ff0000"}),
    );
    assert_eq!(resp.status.as_u16(), 422);
    let error_json = resp.json().unwrap();
    assert_eq!(error_json["message"], "Validation Failed");
    assert_eq!(
        error_json["errors"],
        json!([{"resource": "Label", "code": "already_exists", "field": "name"}])
    );
}

#[test]
fn test_cant_create_bogus_color() {
    for bogus_color in BOGUS_COLORS {
        let (net, github) = setup();
        github.make_repo("an-org", "a-repo");
        let resp = net.post(
            "https://api.github.com/repos/an-org/a-repo/labels",
            json!({"name": "nice", "color": bogus_color}),
        );
        assert_eq!(resp.status.as_u16(), 422, "color {bogus_color:?}");
        let error_json = resp.json().unwrap();
        assert_eq!(error_json["message"], "Validation Failed");
        assert_eq!(
            error_json["errors"],
            json!([{"resource": "Label", "code": "invalid", "field": "color"}])
        );
    }
}

#[test]
fn test_patch_label() {
    let (net, github) = setup();
    let repo = github.make_repo("an-org", "a-repo");
    let resp = net.patch(
        "https://api.github.com/repos/an-org/a-repo/labels/help%20wanted",
        json!({"name": "help wanted", "color": "dedbee", "description": "Please?"}),
    );
    assert_eq!(resp.status.as_u16(), 200);
    let label_json = resp.json().unwrap();
    assert_eq!(label_json["name"], "help wanted");
    assert_eq!(label_json["color"], "dedbee");
    assert_eq!(label_json["description"], "Please?");

    let label = repo.get_label("help wanted").unwrap();
    assert_eq!(label.color, "dedbee");
    assert_eq!(label.description.as_deref(), Some("Please?"));
}

#[test]
fn test_cant_rename_label_onto_existing() {
    let (net, github) = setup();
    github.make_repo("an-org", "a-repo");
    let resp = net.patch(
        "https://api.github.com/repos/an-org/a-repo/labels/bug",
        json!({"name": "question", "color": "d73a4a"}),
    );
    assert_eq!(resp.status.as_u16(), 422);
    let error_json = resp.json().unwrap();
    assert_eq!(error_json["message"], "Validation Failed");
    assert_eq!(
        error_json["errors"],
        json!([{"resource": "Label", "code": "already_exists", "field": "name"}])
    );
}

#[test]
fn test_cant_patch_missing_label() {
    let (net, github) = setup();
    github.make_repo("an-org", "a-repo");
    let resp = net.patch(
        "https://api.github.com/repos/an-org/a-repo/labels/xyzzy",
        json!({"name": "xyzzy", "color": "dedbee", "description": "Go away"}),
    );
    assert_eq!(resp.status.as_u16(), 404);
    assert_eq!(
        resp.json().unwrap()["message"],
        "Label an-org/a-repo 'xyzzy' does not exist"
    );
}

#[test]
fn test_cant_patch_bogus_color() {
    for bogus_color in BOGUS_COLORS {
        let (net, github) = setup();
        github.make_repo("an-org", "a-repo");
        let resp = net.patch(
            "https://api.github.com/repos/an-org/a-repo/labels/bug",
            json!({"name": "bug", "color": bogus_color}),
        );
        assert_eq!(resp.status.as_u16(), 422, "color {bogus_color:?}");
        let error_json = resp.json().unwrap();
        assert_eq!(error_json["message"], "Validation Failed");
        assert_eq!(
            error_json["errors"],
            json!([{"resource": "Label", "code": "invalid", "field": "color"}])
        );
    }
}

#[test]
fn test_delete_label() {
    let (net, github) = setup();
    let repo = github.make_repo("an-org", "a-repo");
    // At first, the label does exist.
    assert_eq!(repo.get_label("help wanted").unwrap().color, "008672");

    let resp = net.delete("https://api.github.com/repos/an-org/a-repo/labels/help%20wanted");
    assert_eq!(resp.status.as_u16(), 204);
    assert_eq!(resp.json(), None);

    // Now the label doesn't exist.
    assert!(repo.get_label("help wanted").is_none());
}

#[test]
fn test_cant_delete_missing_label() {
    let (net, github) = setup();
    github.make_repo("an-org", "a-repo");
    let resp = net.delete("https://api.github.com/repos/an-org/a-repo/labels/xyzzy");
    assert_eq!(resp.status.as_u16(), 404);
}

// =============================================================================
// Pull Request Tests
// =============================================================================

#[test]
fn test_make_pull_request() {
    let (net, github) = setup();
    let repo = github.make_repo("an-org", "a-repo");
    let pr = repo
        .make_pull_request()
        .user("some-user")
        .title("Here is a pull request")
        .body("It's a good pull request, you should merge it.")
        .create();

    let resp = net.get(&format!(
        "https://api.github.com/repos/an-org/a-repo/pulls/{}",
        pr.number()
    ));
    assert_eq!(resp.status.as_u16(), 200);
    let prj = resp.json().unwrap();
    assert_eq!(prj["number"], pr.number());
    assert_eq!(prj["user"]["login"], "some-user");
    assert_eq!(prj["user"]["name"], "Some User");
    assert_eq!(prj["title"], "Here is a pull request");
    assert_eq!(prj["body"], "It's a good pull request, you should merge it.");
    assert_eq!(prj["state"], "open");
    assert_eq!(prj["labels"], json!([]));
    assert_eq!(prj["base"]["repo"]["full_name"], "an-org/a-repo");
    assert_eq!(
        prj["html_url"],
        format!("https://github.com/an-org/a-repo/pull/{}", pr.number())
    );
}

#[test]
fn test_create_pull_request_over_api() {
    let (net, github) = setup();
    github.make_repo("an-org", "a-repo");
    let resp = net.post(
        "https://api.github.com/repos/an-org/a-repo/pulls",
        json!({"title": "First", "body": "One"}),
    );
    assert_eq!(resp.status.as_u16(), 201);
    assert_eq!(resp.json().unwrap()["number"], 1);

    let resp = net.post(
        "https://api.github.com/repos/an-org/a-repo/pulls",
        json!({"title": "Second", "body": "Two"}),
    );
    assert_eq!(resp.status.as_u16(), 201);
    assert_eq!(resp.json().unwrap()["number"], 2);
}

#[test]
fn test_no_such_pull_request() {
    let (net, github) = setup();
    github.make_repo("an-org", "a-repo");
    let resp = net.get("https://api.github.com/repos/an-org/a-repo/pulls/99");
    assert_eq!(resp.status.as_u16(), 404);
    assert_eq!(
        resp.json().unwrap()["message"],
        "Pull request an-org/a-repo #99 does not exist"
    );
}

#[test]
fn test_no_such_repo_for_pull_request() {
    let (net, github) = setup();
    github.make_repo("an-org", "a-repo");
    let resp = net.get("https://api.github.com/repos/some-user/another-repo/pulls/1");
    assert_eq!(resp.status.as_u16(), 404);
    assert_eq!(
        resp.json().unwrap()["message"],
        "Repo some-user/another-repo does not exist"
    );
}

// =============================================================================
// Pull Request State Tests
// =============================================================================

#[test]
fn test_closed_pull_request() {
    let (net, github) = setup();
    let repo = github.make_repo("an-org", "a-repo");
    let pr = repo.make_pull_request().title("Never mind").create();
    pr.close(false);

    let resp = net.get(&format!(
        "https://api.github.com/repos/an-org/a-repo/pulls/{}",
        pr.number()
    ));
    assert_eq!(resp.status.as_u16(), 200);
    assert_eq!(resp.json().unwrap()["state"], "closed");
}

#[test]
fn test_merged_pull_request() {
    let (net, github) = setup();
    let repo = github.make_repo("an-org", "a-repo");
    let pr = repo.make_pull_request().title("Ship it").create();
    pr.close(true);

    let resp = net.get(&format!(
        "https://api.github.com/repos/an-org/a-repo/pulls/{}",
        pr.number()
    ));
    assert_eq!(resp.status.as_u16(), 200);
    assert_eq!(resp.json().unwrap()["state"], "merged");
}

#[test]
fn test_closing_and_reopening_over_api() {
    let (net, github) = setup();
    let repo = github.make_repo("an-org", "a-repo");
    let pr = repo.make_pull_request().create();
    let url = format!(
        "https://api.github.com/repos/an-org/a-repo/issues/{}",
        pr.number()
    );

    let resp = net.patch(&url, json!({"state": "closed"}));
    assert_eq!(resp.status.as_u16(), 200);
    assert_eq!(resp.json().unwrap()["state"], "closed");

    let resp = net.patch(&url, json!({"state": "open"}));
    assert_eq!(resp.json().unwrap()["state"], "open");
}

// =============================================================================
// Pull Request Label Tests
// =============================================================================

#[test]
fn test_updating_labels() {
    let (net, github) = setup();
    let repo = github.make_repo("an-org", "a-repo");
    let pr = repo
        .make_pull_request()
        .title("Here is a pull request")
        .body("It's a good pull request, you should merge it.")
        .create();
    assert!(pr.labels().is_empty());

    let resp = net.patch(
        &format!(
            "https://api.github.com/repos/an-org/a-repo/issues/{}",
            pr.number()
        ),
        json!({"labels": ["new label", "bug", "another label"]}),
    );
    assert_eq!(resp.status.as_u16(), 200);
    assert_eq!(
        pr.labels(),
        ["new label", "bug", "another label"]
            .iter()
            .map(|s| s.to_string())
            .collect::<std::collections::BTreeSet<String>>()
    );
    // Unknown names were auto-created with the generic color; "bug" kept
    // its standard one.
    assert_eq!(repo.get_label("new label").unwrap().color, "ededed");
    assert_eq!(repo.get_label("bug").unwrap().color, "d73a4a");
    assert_eq!(repo.get_label("another label").unwrap().color, "ededed");

    let resp = net.get(&format!(
        "https://api.github.com/repos/an-org/a-repo/pulls/{}",
        pr.number()
    ));
    assert_eq!(resp.status.as_u16(), 200);
    let prj = resp.json().unwrap();
    assert_eq!(prj["title"], "Here is a pull request");
    let label_summary: Vec<(String, String)> = prj["labels"]
        .as_array()
        .unwrap()
        .iter()
        .map(|l| {
            (
                l["name"].as_str().unwrap().to_string(),
                l["color"].as_str().unwrap().to_string(),
            )
        })
        .collect();
    assert_eq!(
        label_summary,
        vec![
            ("another label".to_string(), "ededed".to_string()),
            ("bug".to_string(), "d73a4a".to_string()),
            ("new label".to_string(), "ededed".to_string()),
        ]
    );
}

#[test]
fn test_updating_labels_is_idempotent() {
    let (net, github) = setup();
    let repo = github.make_repo("an-org", "a-repo");
    let pr = repo.make_pull_request().create();
    let url = format!(
        "https://api.github.com/repos/an-org/a-repo/issues/{}",
        pr.number()
    );
    let body = json!({"labels": ["new label", "bug"]});
    net.patch(&url, body.clone());
    net.patch(&url, body);
    assert_eq!(pr.labels().len(), 2);
    assert_eq!(repo.get_label("new label").unwrap().color, "ededed");
}

// =============================================================================
// Comment Tests
// =============================================================================

#[test]
fn test_listing_comments() {
    let (net, github) = setup();
    let repo = github.make_repo("an-org", "a-repo");
    let pr = repo.make_pull_request().create();
    assert!(pr.comments().is_empty());
    let url = format!(
        "https://api.github.com/repos/an-org/a-repo/issues/{}/comments",
        pr.number()
    );
    let resp = net.get(&url);
    assert_eq!(resp.status.as_u16(), 200);
    assert_eq!(resp.json(), Some(&json!([])));

    pr.add_comment("tusbar", "This is my comment");
    pr.add_comment("feanil", "I love this change!");
    let resp = net.get(&url);
    assert_eq!(resp.status.as_u16(), 200);
    let summary: Vec<(String, String)> = resp
        .json()
        .unwrap()
        .as_array()
        .unwrap()
        .iter()
        .map(|c| {
            (
                c["user"]["login"].as_str().unwrap().to_string(),
                c["body"].as_str().unwrap().to_string(),
            )
        })
        .collect();
    assert_eq!(
        summary,
        vec![
            ("tusbar".to_string(), "This is my comment".to_string()),
            ("feanil".to_string(), "I love this change!".to_string()),
        ]
    );
}

#[test]
fn test_posting_comments() {
    let (net, github) = setup();
    let repo = github.make_repo("an-org", "a-repo");
    let pr = repo.make_pull_request().create();

    let resp = net.post(
        &format!(
            "https://api.github.com/repos/an-org/a-repo/issues/{}/comments",
            pr.number()
        ),
        json!({"body": "I'm making a comment"}),
    );
    assert_eq!(resp.status.as_u16(), 200);

    // Without an explicit user the authenticated bot is the author.
    let comments = pr.comments();
    assert_eq!(comments[0].user, "webhook-bot");
    assert_eq!(comments[0].body, "I'm making a comment");
}
