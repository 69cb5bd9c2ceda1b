//! Page-side scripts used by the browser driver

use serde_json::Value;

/// Milliseconds between predicate polls when no interval is configured
pub const ANIMATION_FRAME_MS: u64 = 16;

/// Isolated world the link snapshot runs in, away from page globals
pub const SNAPSHOT_WORLD: &str = "sumi-page";

/// Link-relevant snapshot of the current document
pub const FRAME_SNAPSHOT_SCRIPT: &str = r#"(() => ({
    url: document.location.href,
    hrefs: Array.from(document.querySelectorAll('a[href]'), (a) => a.getAttribute('href')),
    frames: Array.from(document.querySelectorAll('frame, iframe'), (f) => f.getAttribute('src')),
}))()"#;

/// Selector state check taking (selector, visible, hidden)
const SELECTOR_STATE_FUNCTION: &str = r#"(selector, visible, hidden) => {
    const element = document.querySelector(selector);
    if (!element) return hidden;
    if (!visible && !hidden) return true;
    const style = window.getComputedStyle(element);
    const box = element.getBoundingClientRect();
    const shown = style.visibility !== 'hidden' && box.width > 0 && box.height > 0;
    return visible ? shown : !shown;
}"#;

/// Script tag insertion taking (url, content); resolves once loaded
const ADD_SCRIPT_TAG_FUNCTION: &str = r#"(url, content) => new Promise((resolve, reject) => {
    const script = document.createElement('script');
    if (url) {
        script.src = url;
        script.onload = () => resolve(true);
        script.onerror = () => reject(new Error('Failed to load script ' + url));
    } else {
        script.text = content;
    }
    (document.head || document.documentElement).appendChild(script);
    if (!url) resolve(true);
})"#;

/// Expression calling a function source with JSON arguments
pub fn call_expression(function: &str, args: &[Value]) -> String {
    let args = Value::Array(args.to_vec());
    format!("({})(...{})", function, args)
}

/// Expression resolving to whether a predicate currently holds
pub fn predicate_expression(function: &str, args: &[Value]) -> String {
    format!(
        "(async () => Boolean(await {}))()",
        call_expression(function, args)
    )
}

pub fn selector_expression(selector: &str, visible: bool, hidden: bool) -> String {
    call_expression(
        SELECTOR_STATE_FUNCTION,
        &[
            Value::String(selector.to_string()),
            Value::Bool(visible),
            Value::Bool(hidden),
        ],
    )
}

pub fn script_tag_expression(url: Option<&str>, content: Option<&str>) -> String {
    let arg = |value: Option<&str>| value.map(|v| Value::String(v.to_string())).unwrap_or(Value::Null);
    call_expression(ADD_SCRIPT_TAG_FUNCTION, &[arg(url), arg(content)])
}
