//! Crawl pipeline properties checked against the in-memory driver

use crate::fake_driver::FakeDriver;
use serde_json::{json, Value};
use std::sync::Arc;
use sumi_page::config::{
    Credentials, CrawlConfig, DeviceSetting, ImageFormat, ScreenshotOptions, WaitCondition,
    WaitFor, WaitOptions,
};
use sumi_page::crawler::{CrawlOutcome, Crawler, ExtractStep, PrepareStep};
use sumi_page::driver::{
    Dialog, DialogAction, DialogKind, HeaderMap, HttpRequest, RequestDecision, ResourceType,
};
use sumi_page::{crawl, CrawlPhase, DriverError, SumiError};

fn keys(value: &Value) -> Vec<String> {
    let mut keys: Vec<String> = value.as_object().unwrap().keys().cloned().collect();
    keys.sort();
    keys
}

fn config() -> CrawlConfig {
    CrawlConfig::new("http://example.com")
}

fn screenshot_png() -> ScreenshotOptions {
    ScreenshotOptions {
        format: ImageFormat::Png,
        quality: None,
        full_page: false,
        omit_background: false,
        clip: None,
    }
}

#[tokio::test]
async fn test_ok_page_produces_full_record() {
    let driver = FakeDriver::new(200)
        .header("content-type", "text/html")
        .links(&["/a", "http://other.com/b"])
        .text("<html>home</html>");
    let mut config = config();
    config.follow_redirects = true;

    let outcome = crawl(driver, config).await.unwrap();
    let record = outcome.extracted().expect("extracted record");

    assert_eq!(record.links, vec!["http://example.com/a", "http://other.com/b"]);
    assert!(record.redirect_chain.is_empty());
    assert_eq!(record.text, "<html>home</html>");
    assert_eq!(record.result, Value::Null);
    assert_eq!(record.screenshot, None);
    assert!(record.timing.start <= record.timing.end);

    let value = serde_json::to_value(&outcome).unwrap();
    assert_eq!(
        keys(&value),
        vec![
            "links",
            "redirectChain",
            "request",
            "response",
            "result",
            "screenshot",
            "text",
            "timing"
        ]
    );
    assert_eq!(keys(&value["response"]), vec!["headers", "ok", "status", "url"]);
    assert_eq!(keys(&value["request"]), vec!["headers"]);
    assert_eq!(value["response"]["status"], json!(200));
    assert_eq!(value["response"]["ok"], json!(true));
    assert_eq!(value["response"]["headers"]["content-type"], json!("text/html"));
}

#[tokio::test]
async fn test_redirect_status_short_circuits() {
    let driver = FakeDriver::new(302).header("location", "http://example.com/login");
    let mut crawler = Crawler::new(driver, config()).unwrap();

    let outcome = crawler.run().await.unwrap();

    assert!(matches!(outcome, CrawlOutcome::Redirected(_)));
    assert_eq!(crawler.phase(), CrawlPhase::Redirected);

    let value = serde_json::to_value(&outcome).unwrap();
    assert_eq!(keys(&value), vec!["request", "response", "timing"]);
    assert_eq!(value["response"]["status"], json!(302));
    assert_eq!(value["response"]["ok"], json!(false));

    // Neither the wait gate nor any extraction ran
    let driver = crawler.into_driver();
    for capability in ["text", "main_frame", "evaluate", "screenshot", "wait_selector"] {
        assert!(!driver.called(capability), "{} was called", capability);
    }
}

#[tokio::test]
async fn test_redirect_boundaries() {
    for (status, redirected) in [(299, false), (300, true), (399, true), (400, false)] {
        let outcome = crawl(FakeDriver::new(status), config()).await.unwrap();
        assert_eq!(outcome.is_redirect(), redirected, "status {}", status);
    }
}

#[tokio::test]
async fn test_redirect_chain_oldest_first() {
    let driver = FakeDriver::new(200)
        .redirect_from("http://example.com/", 301, "http://example.com/step")
        .redirect_from("http://example.com/step", 302, "http://example.com/final");

    let outcome = crawl(driver, config()).await.unwrap();
    let record = outcome.extracted().unwrap();

    let urls: Vec<&str> = record.redirect_chain.iter().map(|e| e.url.as_str()).collect();
    assert_eq!(urls, vec!["http://example.com/", "http://example.com/step"]);
    assert_eq!(record.redirect_chain[0].response.status(), Some(301));
    assert_eq!(record.redirect_chain[1].response.status(), Some(302));
    assert_eq!(record.response.status(), Some(200));
}

#[tokio::test]
async fn test_missing_hop_response_is_an_empty_projection() {
    let driver = FakeDriver::new(200).redirect_without_response("http://example.com/");

    let outcome = crawl(driver, config()).await.unwrap();
    let value = serde_json::to_value(&outcome).unwrap();

    assert_eq!(value["redirectChain"][0]["url"], json!("http://example.com/"));
    assert_eq!(value["redirectChain"][0]["response"], json!({}));
    assert_eq!(keys(&value["redirectChain"][0]["request"]), vec!["headers"]);
}

#[tokio::test]
async fn test_links_deduplicated_across_frames() {
    let driver = FakeDriver::new(200)
        .frame(
            "main",
            &["/a", "/a", "/b"],
            &[("/inner", "inner"), ("https://ads.example.net/x", "ads")],
        )
        .frame("inner", &["/b", "/c", "javascript:void(0)", ""], &[])
        .block_frame("ads");

    let outcome = crawl(driver, config()).await.unwrap();
    assert_eq!(
        outcome.extracted().unwrap().links,
        vec![
            "http://example.com/a",
            "http://example.com/b",
            "http://example.com/c",
            "https://ads.example.net/x"
        ]
    );
}

#[tokio::test]
async fn test_all_extractions_feed_the_record() {
    let driver = FakeDriver::new(200)
        .evaluation(json!({"title": "Home"}))
        .screenshot_bytes(b"PNG")
        .text("body");
    let mut config = config();
    config.evaluate_page = Some("() => ({ title: document.title })".to_string());
    config.jquery = true;
    config.screenshot = Some(screenshot_png());

    let mut crawler = Crawler::new(driver, config).unwrap();
    let outcome = crawler.run().await.unwrap();

    let value = serde_json::to_value(&outcome).unwrap();
    assert_eq!(value["result"], json!({"title": "Home"}));
    assert_eq!(value["screenshot"], json!("UE5H"));
    assert_eq!(value["text"], json!("body"));

    let driver = crawler.into_driver();
    assert!(driver.called("script_tag"));
    assert!(driver.called("evaluate"));
}

#[tokio::test]
async fn test_extraction_failure_is_all_or_nothing() {
    for (capability, step) in [
        ("evaluate", ExtractStep::Scrape),
        ("screenshot", ExtractStep::Screenshot),
        ("main_frame", ExtractStep::Links),
        ("text", ExtractStep::Text),
    ] {
        let driver = FakeDriver::new(200).fail(capability);
        let mut config = config();
        config.evaluate_page = Some("() => 1".to_string());
        config.screenshot = Some(screenshot_png());

        let err = crawl(driver, config).await.unwrap_err();
        match err {
            SumiError::Extraction { step: failed, .. } => assert_eq!(failed, step),
            other => panic!("expected extraction error for {}, got {}", capability, other),
        }
    }
}

#[tokio::test]
async fn test_preparation_failure_stops_before_navigation() {
    let driver = FakeDriver::new(200).fail("user_agent");
    let mut config = config();
    config.user_agent = Some("Agent/1.0".to_string());

    let mut crawler = Crawler::new(driver, config).unwrap();
    let err = crawler.run().await.unwrap_err();

    assert!(matches!(
        err,
        SumiError::Preparation {
            step: PrepareStep::UserAgent,
            ..
        }
    ));
    assert_eq!(crawler.phase(), CrawlPhase::Init);
    assert!(!crawler.driver().called("navigate"));
}

#[tokio::test]
async fn test_preparation_runs_every_configured_step() {
    let mut config = config();
    config.credentials = Some(Credentials {
        username: "user".to_string(),
        password: "pass".to_string(),
    });
    config.device = Some(DeviceSetting::Named("iPad".to_string()));
    config.user_agent = Some("Agent/1.0".to_string());
    let mut headers = HeaderMap::new();
    headers.insert("x-crawl".to_string(), "1".to_string());
    config.extra_headers = Some(headers);

    let mut crawler = Crawler::new(FakeDriver::new(200), config).unwrap();
    crawler.run().await.unwrap();

    let driver = crawler.into_driver();
    let calls = driver.calls();
    let navigate_at = calls.iter().position(|c| c == "navigate").unwrap();
    for capability in [
        "init_script",
        "authenticate",
        "emulate",
        "interception",
        "cache",
        "user_agent",
        "extra_headers",
        "javascript",
    ] {
        let at = calls
            .iter()
            .position(|c| c == capability)
            .unwrap_or_else(|| panic!("{} not called", capability));
        assert!(at < navigate_at, "{} ran after navigation", capability);
    }
}

#[tokio::test]
async fn test_navigation_failure_propagates() {
    let driver = FakeDriver::new(200).fail("navigate-timeout");

    let err = crawl(driver, config()).await.unwrap_err();
    match err {
        SumiError::Navigation { url, source } => {
            assert_eq!(url, "http://example.com");
            assert!(matches!(source, DriverError::Timeout(_)));
        }
        other => panic!("expected navigation error, got {}", other),
    }
}

#[tokio::test]
async fn test_wait_gate_runs_before_extraction() {
    let mut config = config();
    config.wait_for = Some(WaitFor {
        condition: WaitCondition::Selector("#content".to_string()),
        options: WaitOptions::default(),
        args: vec![],
    });

    let mut crawler = Crawler::new(FakeDriver::new(200), config).unwrap();
    crawler.run().await.unwrap();

    let calls = crawler.driver().calls();
    let waited = calls.iter().position(|c| c == "wait_selector").unwrap();
    let text = calls.iter().position(|c| c == "text").unwrap();
    assert!(waited < text);
}

#[tokio::test]
async fn test_wait_gate_timeout_fails_the_crawl() {
    let mut config = config();
    config.wait_for = Some(WaitFor {
        condition: WaitCondition::Selector("#never".to_string()),
        options: WaitOptions::default(),
        args: vec![],
    });

    let driver = FakeDriver::new(200).fail("wait_selector_timeout");
    let err = crawl(driver, config).await.unwrap_err();
    assert!(matches!(err, SumiError::WaitGate(DriverError::Timeout(_))));
}

#[tokio::test]
async fn test_interception_follows_redirect_policy() {
    let mut follow = Crawler::new(FakeDriver::new(200), config()).unwrap();
    follow.run().await.unwrap();
    assert!(!follow.driver().interception_enabled());

    let mut config = config();
    config.follow_redirects = false;
    let mut manual = Crawler::new(FakeDriver::new(200), config).unwrap();
    manual.run().await.unwrap();
    assert!(manual.driver().interception_enabled());
}

#[tokio::test]
async fn test_off_target_documents_answered_empty_despite_hook() {
    let hook = Arc::new(|_: &CrawlConfig, _: &HttpRequest| RequestDecision::abort("failed"));
    let crawler = Crawler::with_hook(FakeDriver::new(200), config(), hook).unwrap();
    let driver = crawler.driver();

    let away = HttpRequest::document("1", "http://example.com/logout");
    assert_eq!(driver.intercept(&away), Some(RequestDecision::respond_empty()));

    let target = HttpRequest::document("2", "http://example.com/");
    assert_eq!(driver.intercept(&target), Some(RequestDecision::abort("failed")));

    let mut image = HttpRequest::document("3", "http://example.com/logo.png");
    image.resource_type = ResourceType::Image;
    assert_eq!(driver.intercept(&image), Some(RequestDecision::abort("failed")));
}

#[tokio::test]
async fn test_hook_abort_on_target_fails_navigation() {
    let hook = Arc::new(|_: &CrawlConfig, _: &HttpRequest| RequestDecision::abort("blockedbyclient"));
    let mut config = config();
    config.follow_redirects = false;

    let mut crawler = Crawler::with_hook(FakeDriver::new(200), config, hook).unwrap();
    let err = crawler.run().await.unwrap_err();
    assert!(matches!(
        err,
        SumiError::Navigation {
            source: DriverError::Aborted { .. },
            ..
        }
    ));
}

#[tokio::test]
async fn test_default_hook_continues_requests() {
    let crawler = Crawler::new(FakeDriver::new(200), config()).unwrap();
    let mut script = HttpRequest::document("1", "http://cdn.example.net/app.js");
    script.resource_type = ResourceType::Script;
    assert_eq!(
        crawler.driver().intercept(&script),
        Some(RequestDecision::continue_unmodified())
    );
}

#[tokio::test]
async fn test_dialogs_are_dismissed() {
    let mut crawler = Crawler::new(FakeDriver::new(200), config()).unwrap();
    assert_eq!(crawler.driver().observer_count(), 1);

    for kind in [DialogKind::Alert, DialogKind::Confirm, DialogKind::Prompt] {
        let dialog = Dialog {
            kind,
            message: "Leave?".to_string(),
            default_value: None,
        };
        assert_eq!(crawler.driver().open_dialog(&dialog), DialogAction::Dismiss);
    }

    // Observers stay registered after the crawl
    crawler.run().await.unwrap();
    assert_eq!(crawler.driver().observer_count(), 1);
}

#[tokio::test]
async fn test_invalid_config_never_touches_the_page() {
    let mut config = config();
    config.url = "not a url".to_string();
    let err = crawl(FakeDriver::new(200), config).await.unwrap_err();
    assert!(matches!(err, SumiError::Config(_)));
}
