//! Crawl orchestration for sequential results-page collection
//!
//! This module contains the core collection logic, including:
//! - The collaborator traits the orchestrator drives (page extraction
//!   and page navigation)
//! - Session state, deduplication, and stop reasons
//! - The coordinator that steps page by page with cancellation, stall
//!   protection, and checkpointing
//! - The HTTP-backed pager implementation of the collaborator traits

mod coordinator;
mod fetcher;
mod pager;
mod session;

pub use coordinator::{CancelHandle, Coordinator, Progress};
pub use fetcher::{build_http_client, fetch_page, FetchOutcome};
pub use pager::HttpPager;
pub use session::{CrawlOutcome, CrawlSession, StopReason};

use crate::listing::RawListing;
use async_trait::async_trait;
use thiserror::Error;
use url::Url;

/// Errors surfaced by page collaborators
///
/// The coordinator absorbs these into a terminal stop reason; they never
/// escape to the host.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("Extraction failed: {0}")]
    Extraction(String),

    #[error("Navigation failed: {0}")]
    Navigation(String),
}

/// Extracts the current page's raw listings
///
/// Implementations own whatever "current page" means for them (a fetched
/// document, a scripted fixture). Extraction may fail; the coordinator
/// treats that as a per-page extraction error and finishes with partial
/// results.
#[async_trait]
pub trait PageExtractor: Send {
    async fn extract(&mut self) -> Result<Vec<RawListing>, PageError>;
}

/// Finds and follows pagination links
#[async_trait]
pub trait PageNavigator: Send {
    /// Resolves the next page's URL, or None once every pagination
    /// strategy has been exhausted
    async fn find_next_page(&mut self) -> Option<Url>;

    /// Navigates to the given URL, making it the current page
    async fn navigate_to(&mut self, url: &Url) -> Result<(), PageError>;
}
