use crate::config::types::{CrawlConfig, ImageFormat, ScreenshotOptions, WaitCondition, WaitFor};
use crate::driver::HeaderMap;
use crate::ConfigError;
use reqwest::header::{HeaderName, HeaderValue};
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &CrawlConfig) -> Result<(), ConfigError> {
    validate_target_url(&config.url)?;
    validate_credentials(config)?;
    validate_user_agent(config.user_agent.as_deref())?;
    if let Some(headers) = &config.extra_headers {
        validate_extra_headers(headers)?;
    }
    if let Some(device) = &config.device {
        device.resolve()?;
    }
    if let Some(wait) = &config.wait_for {
        validate_wait_for(wait)?;
    }
    if let Some(script) = &config.evaluate_page {
        if script.trim().is_empty() {
            return Err(ConfigError::Validation(
                "evaluate_page cannot be empty".to_string(),
            ));
        }
    }
    if let Some(screenshot) = &config.screenshot {
        validate_screenshot(screenshot)?;
    }
    Ok(())
}

/// Validates the crawl target: must parse and use HTTP(S)
fn validate_target_url(raw: &str) -> Result<(), ConfigError> {
    let url =
        Url::parse(raw).map_err(|e| ConfigError::InvalidUrl(format!("'{}': {}", raw, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "'{}' must use the http or https scheme",
            raw
        )));
    }

    Ok(())
}

fn validate_credentials(config: &CrawlConfig) -> Result<(), ConfigError> {
    if let Some(credentials) = &config.credentials {
        if credentials.username.is_empty() {
            return Err(ConfigError::Validation(
                "credentials.username cannot be empty".to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_user_agent(user_agent: Option<&str>) -> Result<(), ConfigError> {
    match user_agent {
        Some(agent) if agent.trim().is_empty() => Err(ConfigError::Validation(
            "user_agent cannot be empty when set".to_string(),
        )),
        _ => Ok(()),
    }
}

/// Extra headers must be non-empty and well-formed HTTP header pairs
fn validate_extra_headers(headers: &HeaderMap) -> Result<(), ConfigError> {
    if headers.is_empty() {
        return Err(ConfigError::Validation(
            "extra_headers must contain at least one header when present".to_string(),
        ));
    }

    for (name, value) in headers {
        HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
            ConfigError::Validation(format!("Invalid header name '{}'", name))
        })?;
        HeaderValue::from_str(value).map_err(|_| {
            ConfigError::Validation(format!("Invalid value for header '{}'", name))
        })?;
    }

    Ok(())
}

fn validate_wait_for(wait: &WaitFor) -> Result<(), ConfigError> {
    match &wait.condition {
        WaitCondition::Selector(selector) if selector.trim().is_empty() => {
            return Err(ConfigError::Validation(
                "wait_for selector cannot be empty".to_string(),
            ));
        }
        WaitCondition::Function(function) if function.trim().is_empty() => {
            return Err(ConfigError::Validation(
                "wait_for function cannot be empty".to_string(),
            ));
        }
        _ => {}
    }

    if wait.options.visible && wait.options.hidden {
        return Err(ConfigError::Validation(
            "wait_for options cannot require both visible and hidden".to_string(),
        ));
    }

    Ok(())
}

fn validate_screenshot(options: &ScreenshotOptions) -> Result<(), ConfigError> {
    if let Some(quality) = options.quality {
        if options.format != ImageFormat::Jpeg {
            return Err(ConfigError::Validation(
                "screenshot quality is only supported for jpeg".to_string(),
            ));
        }
        if quality > 100 {
            return Err(ConfigError::Validation(format!(
                "screenshot quality must be between 0 and 100, got {}",
                quality
            )));
        }
    }

    if let Some(clip) = &options.clip {
        if clip.width <= 0.0 || clip.height <= 0.0 {
            return Err(ConfigError::Validation(
                "screenshot clip must have a positive width and height".to_string(),
            ));
        }
    }

    Ok(())
}
