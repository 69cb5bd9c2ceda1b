//! End-to-end crawls with the static driver against wiremock servers

use serde_json::{json, Value};
use std::time::{Duration, Instant};
use sumi_page::config::{Credentials, CrawlConfig, WaitCondition, WaitFor, WaitOptions};
use sumi_page::crawler::ExtractStep;
use sumi_page::driver::{HeaderMap, DEFAULT_USER_AGENT};
use sumi_page::{crawl, DriverError, StaticDriver, SumiError};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html")
}

fn driver() -> StaticDriver {
    StaticDriver::new().expect("Failed to build static driver")
}

#[tokio::test]
async fn test_crawl_collects_links_across_frames() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let port = url::Url::parse(&base_url).unwrap().port().unwrap();

    // localhost and 127.0.0.1 are different origins
    let cross_origin = format!("http://localhost:{}/ads", port);

    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(html(format!(
            r#"<html><body>
            <a href="/a">A</a>
            <a href="/a">A again</a>
            <a href="http://other.com/b">B</a>
            <a href="javascript:void(0)">Menu</a>
            <iframe src="/frame"></iframe>
            <iframe src="{}"></iframe>
            </body></html>"#,
            cross_origin
        )))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/frame"))
        .respond_with(html(r#"<a href="/from-frame">F</a><a href="/a">A</a>"#.to_string()))
        .expect(1)
        .mount(&server)
        .await;

    let config = CrawlConfig::new(format!("{}/page", base_url));
    let outcome = crawl(driver(), config).await.unwrap();
    let record = outcome.extracted().expect("extracted record");

    assert_eq!(
        record.links,
        vec![
            format!("{}/a", base_url),
            "http://other.com/b".to_string(),
            format!("{}/from-frame", base_url),
            cross_origin,
        ]
    );
    assert!(record.text.contains("A again"));
    assert!(record.redirect_chain.is_empty());

    let value = serde_json::to_value(&outcome).unwrap();
    assert_eq!(value["response"]["status"], json!(200));
    assert_eq!(value["response"]["url"], json!(format!("{}/page", base_url)));
    assert_eq!(value["response"]["headers"]["content-type"], json!("text/html"));
    assert_eq!(value["screenshot"], Value::Null);
}

#[tokio::test]
async fn test_followed_redirects_are_recorded_oldest_first() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    Mock::given(method("GET"))
        .and(path("/start"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/middle"))
        .mount(&server)
        .await;
    let final_url = format!("{}/final", base_url);
    Mock::given(method("GET"))
        .and(path("/middle"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", final_url.as_str()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/final"))
        .respond_with(html("<p>done</p>".to_string()))
        .mount(&server)
        .await;

    let config = CrawlConfig::new(format!("{}/start", base_url));
    let outcome = crawl(driver(), config).await.unwrap();
    let record = outcome.extracted().unwrap();

    let chain: Vec<(&str, Option<u16>)> = record
        .redirect_chain
        .iter()
        .map(|entry| (entry.url.as_str(), entry.response.status()))
        .collect();
    let start = format!("{}/start", base_url);
    let middle = format!("{}/middle", base_url);
    assert_eq!(
        chain,
        vec![(start.as_str(), Some(301)), (middle.as_str(), Some(302))]
    );
    assert_eq!(record.response.status(), Some(200));
    assert_eq!(record.text, "<p>done</p>");
}

#[tokio::test]
async fn test_unfollowed_redirect_target_is_answered_empty() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    Mock::given(method("GET"))
        .and(path("/start"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/elsewhere"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/elsewhere"))
        .respond_with(html("<a href='/leak'>leak</a>".to_string()))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = CrawlConfig::new(format!("{}/start", base_url));
    config.follow_redirects = false;

    let outcome = crawl(driver(), config).await.unwrap();
    let record = outcome.extracted().unwrap();

    assert_eq!(record.text, "");
    assert!(record.links.is_empty());
    assert_eq!(record.redirect_chain.len(), 1);
    assert_eq!(record.redirect_chain[0].response.status(), Some(302));
}

#[tokio::test]
async fn test_unfollowable_redirect_status_short_circuits() {
    let server = MockServer::start().await;

    // A 3xx without a Location header cannot be followed
    Mock::given(method("GET"))
        .and(path("/choices"))
        .respond_with(ResponseTemplate::new(300).set_body_string("pick one"))
        .mount(&server)
        .await;

    let config = CrawlConfig::new(format!("{}/choices", server.uri()));
    let outcome = crawl(driver(), config).await.unwrap();

    assert!(outcome.is_redirect());
    let value = serde_json::to_value(&outcome).unwrap();
    let mut keys: Vec<&String> = value.as_object().unwrap().keys().collect();
    keys.sort();
    assert_eq!(keys, vec!["request", "response", "timing"]);
    assert_eq!(value["response"]["status"], json!(300));
}

#[tokio::test]
async fn test_basic_auth_retry() {
    let server = MockServer::start().await;

    // "user:pass"
    Mock::given(method("GET"))
        .and(path("/private"))
        .and(header("authorization", "Basic dXNlcjpwYXNz"))
        .respond_with(html("<p>secret</p>".to_string()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/private"))
        .respond_with(
            ResponseTemplate::new(401).insert_header("www-authenticate", "Basic realm=\"test\""),
        )
        .mount(&server)
        .await;

    let mut config = CrawlConfig::new(format!("{}/private", server.uri()));
    config.credentials = Some(Credentials {
        username: "user".to_string(),
        password: "pass".to_string(),
    });

    let outcome = crawl(driver(), config).await.unwrap();
    let record = outcome.extracted().unwrap();
    assert_eq!(record.response.status(), Some(200));
    assert_eq!(record.text, "<p>secret</p>");
}

#[tokio::test]
async fn test_user_agent_and_extra_headers_are_sent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("user-agent", "Agent/1.0"))
        .and(header("x-crawl", "yes"))
        .and(header("cache-control", "no-cache"))
        .respond_with(html("ok".to_string()))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = CrawlConfig::new(format!("{}/", server.uri()));
    config.user_agent = Some("Agent/1.0".to_string());
    config.browser_cache = false;
    let mut headers = HeaderMap::new();
    headers.insert("X-Crawl".to_string(), "yes".to_string());
    config.extra_headers = Some(headers);

    let outcome = crawl(driver(), config).await.unwrap();
    assert_eq!(outcome.extracted().unwrap().text, "ok");
}

#[tokio::test]
async fn test_default_user_agent_is_recorded() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("user-agent", DEFAULT_USER_AGENT))
        .respond_with(html("ok".to_string()))
        .expect(1)
        .mount(&server)
        .await;

    let config = CrawlConfig::new(format!("{}/", server.uri()));
    let outcome = crawl(driver(), config).await.unwrap();

    let value = serde_json::to_value(&outcome).unwrap();
    assert_eq!(
        value["request"]["headers"]["user-agent"],
        json!(DEFAULT_USER_AGENT)
    );
}

#[tokio::test]
async fn test_stalled_frame_is_bounded_by_navigation_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(html(r#"<iframe src="/slow"></iframe>"#.to_string()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html("<a href='/late'>late</a>".to_string()).set_delay(Duration::from_secs(6)))
        .mount(&server)
        .await;

    let mut config = CrawlConfig::new(format!("{}/page", server.uri()));
    config.navigation.timeout_ms = 500;

    let started = Instant::now();
    let err = crawl(driver(), config).await.unwrap_err();

    assert!(started.elapsed() < Duration::from_secs(3));
    assert!(matches!(
        err,
        SumiError::Extraction {
            step: ExtractStep::Links,
            source: DriverError::Timeout(_),
        }
    ));
}

#[tokio::test]
async fn test_selector_wait_gate() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<div id="ready"></div>"#.to_string()))
        .mount(&server)
        .await;

    let wait = |selector: &str| WaitFor {
        condition: WaitCondition::Selector(selector.to_string()),
        options: WaitOptions {
            timeout_ms: 50,
            ..WaitOptions::default()
        },
        args: vec![],
    };

    let mut config = CrawlConfig::new(format!("{}/", server.uri()));
    config.wait_for = Some(wait("#ready"));
    assert!(crawl(driver(), config.clone()).await.is_ok());

    config.wait_for = Some(wait("#missing"));
    let err = crawl(driver(), config).await.unwrap_err();
    assert!(matches!(err, SumiError::WaitGate(DriverError::Timeout(_))));
}

#[tokio::test]
async fn test_page_evaluation_needs_a_script_engine() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html("<p>hi</p>".to_string()))
        .mount(&server)
        .await;

    let mut config = CrawlConfig::new(format!("{}/", server.uri()));
    config.evaluate_page = Some("() => document.title".to_string());

    let err = crawl(driver(), config).await.unwrap_err();
    assert!(matches!(
        err,
        SumiError::Extraction {
            step: ExtractStep::Scrape,
            source: DriverError::Unsupported(_),
        }
    ));
}

#[tokio::test]
async fn test_unreachable_target_is_a_navigation_error() {
    // Port 9 (discard) refuses connections on test hosts
    let config = CrawlConfig::new("http://127.0.0.1:9/");
    let err = crawl(driver(), config).await.unwrap_err();
    assert!(matches!(err, SumiError::Navigation { .. }));
}
