//! Integration tests for the GitHub repository handle.
//!
//! These tests run the real `HttpTransport` against a local `wiremock`
//! server, so the whole path from handle to wire and back is exercised.
//! Live GitHub API tests are behind the `live_github_tests` feature flag.

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use igitt::forge::github::{FetchPhase, GitHub, GitHubRepository};
use igitt::forge::{CreateLabelRequest, ForgeError, Repository};
use igitt::transport::{HttpTransport, TransportOptions};

// =============================================================================
// Fixtures
// =============================================================================

fn github(server: &MockServer) -> GitHub {
    let transport = HttpTransport::new(&TransportOptions::default()).unwrap();
    GitHub::new(Arc::new(transport), server.uri())
}

fn widgets(server: &MockServer) -> serde_json::Value {
    json!({
        "id": 42,
        "full_name": "acme/widgets",
        "description": "Widgets for everyone",
        "private": false,
        "url": format!("{}/repos/acme/widgets", server.uri()),
        "html_url": "https://github.com/acme/widgets",
        "homepage": "https://widgets.example.com",
        "has_issues": true,
        "fork": false
    })
}

async fn mount_widgets(server: &MockServer, route: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(widgets(server)))
        .mount(server)
        .await;
}

async fn received(server: &MockServer, verb: &str, route: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.method.as_str() == verb && r.url.path() == route)
        .count()
}

// =============================================================================
// Fetch and cache
// =============================================================================

mod fetch {
    use super::*;

    #[tokio::test]
    async fn by_name_fetches_once_and_backfills_id() {
        let server = MockServer::start().await;
        mount_widgets(&server, "/repos/acme/widgets").await;

        let repo = github(&server)
            .repository_from_name("acme/widgets", "")
            .unwrap();

        assert_eq!(repo.id().await.unwrap(), 42);
        assert_eq!(repo.full_name().await.unwrap(), "acme/widgets");
        assert_eq!(
            repo.homepage().await.unwrap().as_deref(),
            Some("https://widgets.example.com")
        );
        assert!(repo.has_issues().await.unwrap());

        assert_eq!(received(&server, "GET", "/repos/acme/widgets").await, 1);
        assert_eq!(repo.phase(), FetchPhase::Fetched);
    }

    #[tokio::test]
    async fn by_id_fetches_numeric_form() {
        let server = MockServer::start().await;
        mount_widgets(&server, "/repositories/42").await;

        let repo = github(&server).repository(42, "").unwrap();

        assert_eq!(repo.full_name().await.unwrap(), "acme/widgets");
        assert_eq!(received(&server, "GET", "/repositories/42").await, 1);
    }

    #[tokio::test]
    async fn token_is_sent_as_token_auth() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repositories/42"))
            .and(header("authorization", "token ghp_test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(widgets(&server)))
            .expect(1)
            .mount(&server)
            .await;

        let repo = github(&server).repository(42, "ghp_test").unwrap();
        repo.id().await.unwrap();
    }

    #[tokio::test]
    async fn unknown_repository_is_not_found_and_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/missing"))
            .respond_with(
                ResponseTemplate::new(404).set_body_string(r#"{"message":"Not Found"}"#),
            )
            .mount(&server)
            .await;

        let repo = github(&server)
            .repository_from_name("acme/missing", "")
            .unwrap();

        let err = repo.id().await.unwrap_err();
        assert!(err.is_not_found(), "got {:?}", err);
        assert_eq!(repo.phase(), FetchPhase::Unresolved);

        // Not cached as fetched, so the next access asks again.
        assert!(repo.description().await.is_err());
        assert_eq!(received(&server, "GET", "/repos/acme/missing").await, 2);
    }

    #[tokio::test]
    async fn malformed_json_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repositories/42"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let repo = github(&server).repository(42, "").unwrap();
        assert!(matches!(repo.id().await, Err(ForgeError::Decode(_))));
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repositories/42"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(widgets(&server))
                    .set_delay(std::time::Duration::from_millis(50)),
            )
            .mount(&server)
            .await;

        let repo = Arc::new(github(&server).repository(42, "").unwrap());
        let mut tasks = Vec::new();
        for _ in 0..8 {
            let repo = Arc::clone(&repo);
            tasks.push(tokio::spawn(async move { repo.full_name().await }));
        }
        for task in tasks {
            assert_eq!(task.await.unwrap().unwrap(), "acme/widgets");
        }

        assert_eq!(received(&server, "GET", "/repositories/42").await, 1);
    }

    #[tokio::test]
    async fn api_url_never_touches_the_network() {
        let server = MockServer::start().await;
        let repo = github(&server)
            .repository_from_name("acme/widgets", "")
            .unwrap();

        assert_eq!(
            repo.api_url().unwrap(),
            format!("{}/repos/acme/widgets", server.uri())
        );
        assert!(server.received_requests().await.unwrap().is_empty());
    }
}

// =============================================================================
// Parent
// =============================================================================

mod parent {
    use super::*;

    #[tokio::test]
    async fn fork_exposes_parent_without_another_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/nkprince007/coala-bears"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 76145200,
                "full_name": "nkprince007/coala-bears",
                "fork": true,
                "parent": {
                    "id": 49558751,
                    "full_name": "coala/coala-bears",
                    "url": format!("{}/repos/coala/coala-bears", server.uri()),
                    "html_url": "https://github.com/coala/coala-bears",
                    "fork": false
                }
            })))
            .mount(&server)
            .await;

        let repo = github(&server)
            .repository_from_name("nkprince007/coala-bears", "")
            .unwrap();

        assert!(repo.is_fork().await.unwrap());
        let parent = repo.parent().await.unwrap().expect("fork has a parent");
        assert_eq!(parent.full_name().await.unwrap(), "coala/coala-bears");
        assert_eq!(parent.id().await.unwrap(), 49558751);
        assert!(!parent.is_fork().await.unwrap());
        assert!(parent.parent().await.unwrap().is_none());

        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }
}

// =============================================================================
// Labels
// =============================================================================

mod labels {
    use super::*;

    #[tokio::test]
    async fn list_create_list_delete_list() {
        let server = MockServer::start().await;
        let labels = "/repositories/42/labels";

        // Label listings in the order they are requested.
        for body in [
            json!([{"name": "bug", "color": "d73a4a"}]),
            json!([{"name": "bug", "color": "d73a4a"}, {"name": "x", "color": "000000"}]),
        ] {
            Mock::given(method("GET"))
                .and(path(labels))
                .respond_with(ResponseTemplate::new(200).set_body_json(body))
                .up_to_n_times(1)
                .mount(&server)
                .await;
        }
        Mock::given(method("GET"))
            .and(path(labels))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([{"name": "bug", "color": "d73a4a"}])),
            )
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path(labels))
            .and(body_json(json!({"name": "x", "color": "000000"})))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({"name": "x", "color": "000000"})),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/repositories/42/labels/x"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let repo = github(&server).repository(42, "").unwrap();

        assert_eq!(repo.get_all_labels().await.unwrap(), vec!["bug"]);

        let created = repo
            .create_label(CreateLabelRequest::new("x", "000000"))
            .await
            .unwrap();
        assert_eq!(created.name, "x");
        assert_eq!(repo.get_all_labels().await.unwrap(), vec!["bug", "x"]);

        repo.delete_label("x").await.unwrap();
        assert_eq!(repo.get_all_labels().await.unwrap(), vec!["bug"]);
    }

    #[tokio::test]
    async fn duplicate_label_is_a_response_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/repositories/42/labels"))
            .respond_with(
                ResponseTemplate::new(422)
                    .set_body_string(r#"{"message":"Validation Failed"}"#),
            )
            .mount(&server)
            .await;

        let repo = github(&server).repository(42, "").unwrap();
        let err = repo
            .create_label(CreateLabelRequest::new("bug", "d73a4a"))
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(422));
        assert!(err.to_string().contains("Validation Failed"));
    }

    #[tokio::test]
    async fn full_labels_keep_color_and_description() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repositories/42/labels"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"name": "bug", "color": "d73a4a", "description": "Something is broken"},
                {"name": "wip", "color": "ededed", "description": null}
            ])))
            .mount(&server)
            .await;

        let repo = github(&server).repository(42, "").unwrap();
        let labels = repo.labels().await.unwrap();

        assert_eq!(labels.len(), 2);
        assert_eq!(labels[0].description.as_deref(), Some("Something is broken"));
        assert_eq!(labels[1].color, "ededed");
        assert!(labels[1].description.is_none());
    }
}

// =============================================================================
// End-to-end scenario
// =============================================================================

#[tokio::test]
async fn acme_widgets_scenario() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 42,
            "full_name": "acme/widgets",
            "fork": false
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/repositories/42/labels"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(json!({"name": "triage", "color": "ededed"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let repo: GitHubRepository = github(&server)
        .repository_from_name("acme/widgets", "")
        .unwrap();

    assert_eq!(
        repo.to_string(),
        format!(
            "Repository(id=0, full_name=acme/widgets, url={}/repos/acme/widgets)",
            server.uri()
        )
    );

    assert_eq!(repo.id().await.unwrap(), 42);
    assert!(!repo.is_fork().await.unwrap());
    assert!(repo.parent().await.unwrap().is_none());
    assert_eq!(
        repo.to_string(),
        format!(
            "Repository(id=42, full_name=acme/widgets, url={}/repositories/42)",
            server.uri()
        )
    );

    repo.create_label(CreateLabelRequest::new("triage", "ededed"))
        .await
        .unwrap();
    assert_eq!(repo.phase(), FetchPhase::FetchedUndecoded);
    assert_eq!(repo.full_name().await.unwrap(), "acme/widgets");

    assert_eq!(received(&server, "GET", "/repos/acme/widgets").await, 1);
}

#[tokio::test]
async fn label_requests_stay_on_configured_base() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repositories/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 42,
            "full_name": "acme/widgets",
            "url": "https://elsewhere.invalid/repos/acme/widgets"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/repositories/42/labels"))
        .and(header("authorization", "token ghp_secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"name": "bug"}])))
        .expect(1)
        .mount(&server)
        .await;

    let repo = github(&server).repository(42, "ghp_secret").unwrap();
    repo.id().await.unwrap();

    assert_eq!(repo.get_all_labels().await.unwrap(), vec!["bug"]);
    assert_eq!(
        repo.api_url().unwrap(),
        format!("{}/repositories/42", server.uri())
    );
}

// =============================================================================
// Live GitHub API tests
// =============================================================================

#[cfg(feature = "live_github_tests")]
mod live_tests {
    use super::*;

    fn get_test_token() -> String {
        std::env::var("GITHUB_TOKEN").unwrap_or_default()
    }

    #[tokio::test]
    async fn live_coala_bears_fork_has_parent() {
        let repo = GitHub::from_env()
            .unwrap()
            .repository_from_name("nkprince007/coala-bears", get_test_token())
            .unwrap();

        assert!(repo.is_fork().await.unwrap());
        let parent = repo.parent().await.unwrap().unwrap();
        assert_eq!(parent.full_name().await.unwrap(), "coala/coala-bears");
    }

    #[tokio::test]
    async fn live_lookup_by_id_backfills_name() {
        let repo = GitHub::from_env()
            .unwrap()
            .repository(49558751, get_test_token())
            .unwrap();

        assert_eq!(repo.full_name().await.unwrap(), "coala/coala-bears");
    }
}
