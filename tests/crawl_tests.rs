//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for Wikipedia and run the full
//! cycle end-to-end: configuration, page source, traversal and word
//! frequency aggregation.

use serde_json::json;
use wiki_ripple::config::{parse_config, Config};
use wiki_ripple::crawler::{build_traverser, FailureKind};
use wiki_ripple::frequency::calculate;
use wiki_ripple::normalize_title;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration pointing at the mock server
fn create_test_config(server: &MockServer, kind: &str) -> Config {
    parse_config(&format!(
        r#"
        [crawler]
        max-concurrent-requests = 4
        max-requests-per-second = 100.0

        [user-agent]
        crawler-name = "TestBot"
        crawler-version = "1.0.0"
        contact-url = "https://example.com/contact"
        contact-email = "test@example.com"

        [http]
        request-timeout = 5.0

        [retry]
        max-attempts = 2
        min-wait = 0.01
        max-wait = 0.05
        jitter-max = 0.01

        [source]
        kind = "{kind}"
        api-endpoint = "{uri}/w/api.php"
        site-url = "{uri}"
        "#,
        kind = kind,
        uri = server.uri()
    ))
    .expect("Failed to parse test config")
}

fn api_page(title: &str, html: &str, links: &[&str]) -> serde_json::Value {
    json!({
        "parse": {
            "title": title,
            "text": {"*": html},
            "links": links
                .iter()
                .map(|link| json!({"ns": 0, "exists": "", "*": link}))
                .collect::<Vec<_>>(),
        }
    })
}

async fn mount_api_page(server: &MockServer, requested: &str, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("action", "parse"))
        .and(query_param("page", requested))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_api_crawl_with_partial_failure() {
    let server = MockServer::start().await;

    mount_api_page(
        &server,
        "Rust",
        api_page(
            "Rust",
            "<p>Rust is a language.<sup>[1]</sup> Rust is fast.</p>",
            &["Memory safety", "Cargo"],
        ),
    )
    .await;
    mount_api_page(
        &server,
        "Memory safety",
        api_page("Memory safety", "<p>Memory safety matters.</p>", &["Rust"]),
    )
    .await;

    // Cargo stays unavailable for the whole retry budget
    Mock::given(method("GET"))
        .and(path("/w/api.php"))
        .and(query_param("page", "Cargo"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let config = create_test_config(&server, "api");
    let traverser = build_traverser(&config).expect("Failed to build traverser");

    let result = traverser.traverse("Rust", 2).await;

    assert_eq!(result.texts.len(), 2);
    assert_eq!(result.errors.len(), 1);
    assert_eq!(result.errors[0].title, "Cargo");
    assert_eq!(result.errors[0].kind, FailureKind::Recoverable);
    assert_eq!(result.visited.len(), 3);
    assert!(result.visited.contains("memory safety"));

    let table = calculate(&result.texts, None, None);
    assert_eq!(table["rust"].count, 2);
    assert_eq!(table["is"].count, 2);
    assert!((table["rust"].percentage - 20.0).abs() < 1e-9);
    assert!(!table.contains_key("1"));

    let ignore = vec!["is".to_string(), "RUST".to_string()];
    let keywords = calculate(&result.texts, Some(&ignore), Some(50));
    assert_eq!(keywords.len(), 3);
    assert!(keywords.values().all(|frequency| frequency.count == 1));
}

#[tokio::test]
async fn test_api_redirect_resolves_canonical_title() {
    let server = MockServer::start().await;

    let mut body = api_page("United Kingdom", "<p>A country.</p>", &["United Kingdom", "UK"]);
    body["parse"]["redirects"] = json!([{"from": "UK", "to": "United Kingdom"}]);
    mount_api_page(&server, "UK", body).await;

    let config = create_test_config(&server, "api");
    let result = build_traverser(&config)
        .unwrap()
        .traverse("UK", 1)
        .await;

    assert_eq!(result.texts, vec!["A country."]);
    assert!(result.errors.is_empty());
    assert!(result.visited.contains(&normalize_title("United Kingdom")));
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_api_missing_article_is_not_found() {
    let server = MockServer::start().await;

    mount_api_page(
        &server,
        "NonexistentPage12345",
        json!({"error": {"code": "missingtitle", "info": "The page you specified doesn't exist."}}),
    )
    .await;

    let config = create_test_config(&server, "api");
    let result = build_traverser(&config)
        .unwrap()
        .traverse("NonexistentPage12345", 3)
        .await;

    assert!(result.texts.is_empty());
    assert!(result.errors.is_empty());
    assert_eq!(result.visited.len(), 1);
}

#[tokio::test]
async fn test_html_crawl_end_to_end() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/wiki/Rust"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html>
            <head><title>Rust - Wikipedia</title></head>
            <body>
                <h1 id="firstHeading">Rust</h1>
                <div id="mw-content-text">
                    <p>Rust has <a href="/wiki/Ownership_(computing)">ownership</a>
                    and <a href="/wiki/Deleted_page">history</a>.</p>
                    <div class="navbox"><a href="/wiki/Navigation">ignored</a></div>
                </div>
            </body>
            </html>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wiki/Ownership_%28computing%29"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body><h1 id="firstHeading">Ownership (computing)</h1>
            <div id="mw-content-text"><p>Ownership rules.</p></div></body></html>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wiki/Deleted_page"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(&server, "html");
    let result = build_traverser(&config).unwrap().traverse("Rust", 1).await;

    assert_eq!(result.texts.len(), 2);
    assert!(result.errors.is_empty());
    assert_eq!(result.visited.len(), 3);
    assert!(!result.visited.contains("navigation"));

    let table = calculate(&result.texts, None, None);
    assert_eq!(table["ownership"].count, 2);
    assert_eq!(table["rust"].count, 1);
}
