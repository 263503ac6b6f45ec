use crate::config::types::{Config, CrawlConfig, OutputConfig, ScoringConfig, SelectorConfig};
use crate::scoring::{ParamPreset, ScoringMethod};
use crate::ConfigError;
use regex::Regex;
use scraper::Selector;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawl_config(&config.crawl)?;
    validate_scoring_config(&config.scoring)?;
    validate_selector_config(&config.selectors)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawl configuration
fn validate_crawl_config(config: &CrawlConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.start_url).map_err(|e| {
        ConfigError::Validation(format!("Invalid start-url '{}': {}", config.start_url, e))
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "start-url must use http or https, got '{}'",
            url.scheme()
        )));
    }

    if let Some(limit) = config.page_limit {
        if limit < 1 {
            return Err(ConfigError::Validation(
                "page-limit must be >= 1 when set".to_string(),
            ));
        }
    }

    if config.navigation_timeout_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "navigation-timeout-ms must be >= 100ms, got {}ms",
            config.navigation_timeout_ms
        )));
    }

    if config.watchdog_timeout_ms < config.navigation_timeout_ms + config.settle_delay_ms {
        return Err(ConfigError::Validation(format!(
            "watchdog-timeout-ms ({}ms) must cover navigation-timeout-ms plus settle-delay-ms \
             ({}ms), or every slow navigation reads as a stall",
            config.watchdog_timeout_ms,
            config.navigation_timeout_ms + config.settle_delay_ms
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates scoring configuration
fn validate_scoring_config(config: &ScoringConfig) -> Result<(), ConfigError> {
    if ScoringMethod::from_name(&config.method).is_none() {
        return Err(ConfigError::Validation(format!(
            "Unknown scoring method '{}'; expected one of: {}",
            config.method,
            ScoringMethod::all_methods()
                .iter()
                .map(|m| m.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )));
    }

    match (config.custom_c, config.custom_m) {
        (Some(c), Some(m)) => {
            if !c.is_finite() || c < 0.0 {
                return Err(ConfigError::Validation(format!(
                    "custom-c must be a finite non-negative number, got {c}"
                )));
            }
            if !m.is_finite() || m <= 0.0 {
                return Err(ConfigError::Validation(format!(
                    "custom-m must be a finite positive number, got {m}"
                )));
            }
        }
        (None, None) => {}
        _ => {
            return Err(ConfigError::Validation(
                "custom-c and custom-m must be set together".to_string(),
            ));
        }
    }

    if let Some(preset) = &config.custom_preset {
        if ParamPreset::from_name(preset).is_none() {
            return Err(ConfigError::Validation(format!(
                "Unknown custom-preset '{preset}'; expected dataset-min, dataset-max, or \
                 dataset-mean"
            )));
        }
    }

    Ok(())
}

/// Validates selector configuration
fn validate_selector_config(config: &SelectorConfig) -> Result<(), ConfigError> {
    validate_selector("listing", &config.listing)?;
    validate_selector("title", &config.title)?;

    for (name, selector) in [
        ("rating", &config.rating),
        ("reviews", &config.reviews),
        ("price", &config.price),
        ("link", &config.link),
    ] {
        if let Some(selector) = selector {
            validate_selector(name, selector)?;
        }
    }

    if config.next_page.is_empty() {
        return Err(ConfigError::Validation(
            "next-page must list at least one selector strategy".to_string(),
        ));
    }
    for selector in &config.next_page {
        validate_selector("next-page", selector)?;
    }

    if let Some(attribute) = &config.id_attribute {
        if attribute.trim().is_empty() {
            return Err(ConfigError::Validation(
                "id-attribute cannot be empty when set".to_string(),
            ));
        }
    }

    if let Some(pattern) = &config.exclude_title_pattern {
        Regex::new(pattern)
            .map_err(|e| ConfigError::InvalidPattern(format!("'{pattern}': {e}")))?;
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    if config.export_path.is_empty() {
        return Err(ConfigError::Validation(
            "export-path cannot be empty".to_string(),
        ));
    }

    if config.format != "csv" && config.format != "json" {
        return Err(ConfigError::Validation(format!(
            "format must be \"csv\" or \"json\", got '{}'",
            config.format
        )));
    }

    Ok(())
}

/// Checks that a CSS selector parses
fn validate_selector(name: &str, selector: &str) -> Result<(), ConfigError> {
    if selector.trim().is_empty() {
        return Err(ConfigError::Validation(format!(
            "{name} selector cannot be empty"
        )));
    }
    Selector::parse(selector)
        .map_err(|_| ConfigError::InvalidSelector(format!("{name}: '{selector}'")))?;
    Ok(())
}
