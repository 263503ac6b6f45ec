use crate::listing::Listing;
use crate::scoring::{preset_params, ParamPreset, ScoringMethod, ScoringParams};
use serde::Deserialize;

/// Main configuration structure for Shelf-Scout
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawl: CrawlConfig,
    #[serde(default)]
    pub scoring: ScoringConfig,
    pub selectors: SelectorConfig,
    pub output: OutputConfig,
}

/// Crawl behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    /// First results page to collect from
    #[serde(rename = "start-url")]
    pub start_url: String,

    /// Maximum pages to visit; omit for unbounded
    #[serde(rename = "page-limit", default)]
    pub page_limit: Option<u32>,

    /// How long to wait for a page navigation before extracting anyway
    /// (milliseconds)
    #[serde(
        rename = "navigation-timeout-ms",
        default = "default_navigation_timeout_ms"
    )]
    pub navigation_timeout_ms: u64,

    /// Stall watchdog: a page step that takes longer than this finishes
    /// the crawl with partial results (milliseconds)
    #[serde(
        rename = "watchdog-timeout-ms",
        default = "default_watchdog_timeout_ms"
    )]
    pub watchdog_timeout_ms: u64,

    /// Pause after a completed navigation before extracting (milliseconds)
    #[serde(rename = "settle-delay-ms", default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// User agent sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

/// Scoring configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ScoringConfig {
    /// Scoring method name (see `ScoringMethod::from_name`)
    #[serde(default = "default_method")]
    pub method: String,

    /// Explicit prior rating for the custom method
    #[serde(rename = "custom-c", default)]
    pub custom_c: Option<f64>,

    /// Explicit prior weight for the custom method, in review-count units
    #[serde(rename = "custom-m", default)]
    pub custom_m: Option<f64>,

    /// Dataset preset for the custom method's prior
    /// ("dataset-min" | "dataset-max" | "dataset-mean")
    #[serde(rename = "custom-preset", default)]
    pub custom_preset: Option<String>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            method: default_method(),
            custom_c: None,
            custom_m: None,
            custom_preset: None,
        }
    }
}

impl ScoringConfig {
    /// The configured method; validation guarantees the name parses
    pub fn method(&self) -> ScoringMethod {
        ScoringMethod::from_name(&self.method).unwrap_or(ScoringMethod::Classic)
    }

    /// Resolves prior parameters against a batch
    ///
    /// Explicit `custom-c`/`custom-m` win over a preset; with neither the
    /// engine falls back to its own per-method parameters.
    pub fn resolve_params(&self, listings: &[Listing]) -> Option<ScoringParams> {
        if let (Some(c), Some(m)) = (self.custom_c, self.custom_m) {
            return Some(ScoringParams { c, m });
        }
        self.custom_preset
            .as_deref()
            .and_then(ParamPreset::from_name)
            .map(|preset| preset_params(preset, listings))
    }
}

/// CSS selector configuration for listing extraction
///
/// Selectors are configuration rather than code so the crate stays free
/// of site-specific markup knowledge.
#[derive(Debug, Clone, Deserialize)]
pub struct SelectorConfig {
    /// Selects one listing container per result
    pub listing: String,

    /// Selects the title text within a container
    pub title: String,

    /// Selects the rating text within a container
    #[serde(default)]
    pub rating: Option<String>,

    /// Selects the review-count text within a container
    #[serde(default)]
    pub reviews: Option<String>,

    /// Selects the price text within a container
    #[serde(default)]
    pub price: Option<String>,

    /// Selects the listing link within a container
    #[serde(default)]
    pub link: Option<String>,

    /// Container attribute carrying a stable platform id
    #[serde(rename = "id-attribute", default)]
    pub id_attribute: Option<String>,

    /// Next-page link selectors, tried in priority order
    #[serde(rename = "next-page")]
    pub next_page: Vec<String>,

    /// Listings whose titles match this pattern are skipped
    /// (sponsored/promoted labels)
    #[serde(rename = "exclude-title-pattern", default)]
    pub exclude_title_pattern: Option<String>,

    /// Listings with shorter titles are skipped
    #[serde(rename = "min-title-length", default)]
    pub min_title_length: usize,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite checkpoint database
    #[serde(rename = "database-path", default = "default_database_path")]
    pub database_path: String,

    /// Path the scored export is written to
    #[serde(rename = "export-path")]
    pub export_path: String,

    /// Export format: "csv" or "json"
    #[serde(default = "default_format")]
    pub format: String,
}

fn default_navigation_timeout_ms() -> u64 {
    10_000
}

fn default_watchdog_timeout_ms() -> u64 {
    45_000
}

fn default_settle_delay_ms() -> u64 {
    1_000
}

fn default_user_agent() -> String {
    "shelf-scout/1.0".to_string()
}

fn default_method() -> String {
    "classic".to_string()
}

fn default_database_path() -> String {
    "./shelf-scout.db".to_string()
}

fn default_format() -> String {
    "csv".to_string()
}
