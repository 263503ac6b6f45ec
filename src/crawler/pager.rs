//! HTTP-backed pager: fetches results pages and extracts listings
//!
//! `HttpPager` implements both collaborator traits over an HTTP client
//! and CSS selectors supplied entirely by configuration:
//! - Extraction selects listing containers and pulls field text out of
//!   each, with NaN-safe coercion happening downstream
//! - Next-page resolution tries an ordered list of selector strategies
//!   and only reports "no next page" after every strategy fails
//! - Relative pagination links resolve against the current page URL

use crate::config::SelectorConfig;
use crate::crawler::fetcher::{build_http_client, fetch_page, FetchOutcome};
use crate::crawler::{PageError, PageExtractor, PageNavigator};
use crate::listing::RawListing;
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// The page the pager is currently positioned on
struct CurrentPage {
    url: Url,
    body: String,
}

/// Config-driven pager over an HTTP client
pub struct HttpPager {
    client: Client,
    selectors: SelectorConfig,
    exclude: Option<Regex>,
    current: Option<CurrentPage>,
}

impl HttpPager {
    /// Creates a pager from validated selector configuration
    pub fn new(selectors: SelectorConfig, user_agent: &str) -> crate::Result<Self> {
        let client = build_http_client(user_agent)?;
        let exclude = match &selectors.exclude_title_pattern {
            Some(pattern) => Some(Regex::new(pattern).map_err(|e| {
                crate::ConfigError::InvalidPattern(format!("'{pattern}': {e}"))
            })?),
            None => None,
        };

        Ok(Self {
            client,
            selectors,
            exclude,
            current: None,
        })
    }

    /// Loads the first results page
    pub async fn open(&mut self, url: &Url) -> Result<(), PageError> {
        self.navigate_to(url).await
    }

    /// Applies the title filters: exclusion pattern and minimum length
    fn keep_title(&self, title: &str) -> bool {
        if title.chars().count() < self.selectors.min_title_length {
            tracing::debug!("Skipping short title: {}", title);
            return false;
        }
        if let Some(exclude) = &self.exclude {
            if exclude.is_match(title) {
                tracing::debug!("Skipping excluded title: {}", title);
                return false;
            }
        }
        true
    }

    #[cfg(test)]
    fn set_current(&mut self, url: &str, body: &str) {
        self.current = Some(CurrentPage {
            url: Url::parse(url).unwrap(),
            body: body.to_string(),
        });
    }
}

#[async_trait]
impl PageExtractor for HttpPager {
    async fn extract(&mut self) -> Result<Vec<RawListing>, PageError> {
        let page = self
            .current
            .as_ref()
            .ok_or_else(|| PageError::Extraction("no page loaded".to_string()))?;

        let document = Html::parse_document(&page.body);
        let container = Selector::parse(&self.selectors.listing)
            .map_err(|_| PageError::Extraction("listing selector failed to parse".to_string()))?;

        let mut listings = Vec::new();
        for node in document.select(&container) {
            let Some(title) = select_text(node, &self.selectors.title) else {
                continue;
            };
            if !self.keep_title(&title) {
                continue;
            }

            let id = self
                .selectors
                .id_attribute
                .as_deref()
                .and_then(|attr| node.value().attr(attr))
                .map(str::to_string);

            let url = self
                .selectors
                .link
                .as_deref()
                .and_then(|sel| select_attr(node, sel, "href"))
                .and_then(|href| page.url.join(&href).ok())
                .map(String::from);

            listings.push(RawListing {
                title,
                id,
                rating: self
                    .selectors
                    .rating
                    .as_deref()
                    .and_then(|sel| select_text(node, sel)),
                reviews: self
                    .selectors
                    .reviews
                    .as_deref()
                    .and_then(|sel| select_text(node, sel)),
                price: self
                    .selectors
                    .price
                    .as_deref()
                    .and_then(|sel| select_text(node, sel)),
                url,
            });
        }

        Ok(listings)
    }
}

#[async_trait]
impl PageNavigator for HttpPager {
    async fn find_next_page(&mut self) -> Option<Url> {
        let page = self.current.as_ref()?;
        let document = Html::parse_document(&page.body);

        for (index, strategy) in self.selectors.next_page.iter().enumerate() {
            let Ok(selector) = Selector::parse(strategy) else {
                continue;
            };

            let Some(href) = document
                .select(&selector)
                .find_map(|el| el.value().attr("href"))
            else {
                tracing::debug!(
                    "Next-page strategy {} ('{}') matched nothing, trying next",
                    index + 1,
                    strategy
                );
                continue;
            };

            match page.url.join(href) {
                Ok(url) => {
                    tracing::debug!(
                        "Next page via strategy {} ('{}'): {}",
                        index + 1,
                        strategy,
                        url
                    );
                    return Some(url);
                }
                Err(e) => {
                    tracing::debug!(
                        "Strategy '{}' produced unusable href '{}': {}",
                        strategy,
                        href,
                        e
                    );
                }
            }
        }

        None
    }

    async fn navigate_to(&mut self, url: &Url) -> Result<(), PageError> {
        match fetch_page(&self.client, url.as_str()).await {
            FetchOutcome::Success {
                final_url, body, ..
            } => {
                let resolved = Url::parse(&final_url).unwrap_or_else(|_| url.clone());
                self.current = Some(CurrentPage {
                    url: resolved,
                    body,
                });
                Ok(())
            }
            FetchOutcome::HttpError { status_code } => Err(PageError::Navigation(format!(
                "HTTP {status_code} from {url}"
            ))),
            FetchOutcome::NetworkError { error, timed_out } => {
                if timed_out {
                    Err(PageError::Navigation(format!("timeout loading {url}")))
                } else {
                    Err(PageError::Navigation(error))
                }
            }
        }
    }
}

/// Selects the first match under `node` and returns its trimmed text
fn select_text(node: ElementRef<'_>, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    let element = node.select(&selector).next()?;
    let text = element
        .text()
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Selects the first match under `node` and returns an attribute value
fn select_attr(node: ElementRef<'_>, selector: &str, attr: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    node.select(&selector)
        .find_map(|el| el.value().attr(attr))
        .map(str::to_string)
}
