//! Crawl session state and termination reasons
//!
//! A session is created at crawl start, mutated only by the coordinator's
//! own step functions, and consumed into an outcome when the crawl
//! finishes. The accumulator preserves first-seen insertion order;
//! repeated identity keys are dropped silently and counted.

use crate::listing::{Listing, RawListing};
use std::collections::HashSet;
use std::fmt;

/// Why a crawl stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopReason {
    /// Every pagination strategy failed to find a next page
    NoNextPage,

    /// The configured page limit was reached
    PageLimitReached,

    /// A caller cancelled the crawl
    UserCancelled,

    /// The extractor failed on a page; partial results were kept
    ExtractionError,

    /// Navigation to the next page failed; partial results were kept
    NavigationError,

    /// No page transition completed within the watchdog interval
    Stalled,
}

impl StopReason {
    /// Returns true for reasons that represent an absorbed failure
    ///
    /// Cancellation and normal termination are not errors.
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Self::ExtractionError | Self::NavigationError | Self::Stalled
        )
    }

    /// Converts the reason to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::NoNextPage => "no_next_page",
            Self::PageLimitReached => "page_limit_reached",
            Self::UserCancelled => "user_cancelled",
            Self::ExtractionError => "extraction_error",
            Self::NavigationError => "navigation_error",
            Self::Stalled => "stalled",
        }
    }

    /// Parses a reason from its database string representation
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "no_next_page" => Some(Self::NoNextPage),
            "page_limit_reached" => Some(Self::PageLimitReached),
            "user_cancelled" => Some(Self::UserCancelled),
            "extraction_error" => Some(Self::ExtractionError),
            "navigation_error" => Some(Self::NavigationError),
            "stalled" => Some(Self::Stalled),
            _ => None,
        }
    }

    /// Returns all stop reasons
    pub fn all_reasons() -> Vec<Self> {
        vec![
            Self::NoNextPage,
            Self::PageLimitReached,
            Self::UserCancelled,
            Self::ExtractionError,
            Self::NavigationError,
            Self::Stalled,
        ]
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}

/// Mutable state for one collection run
#[derive(Debug)]
pub struct CrawlSession {
    /// Maximum pages to visit; None means unbounded
    page_limit: Option<u32>,

    /// Pages visited so far
    pages_visited: u32,

    /// Accumulated listings in first-seen order
    accumulated: Vec<Listing>,

    /// Identity keys already accepted
    seen_keys: HashSet<String>,

    /// Repeats dropped by deduplication
    duplicates_dropped: u64,
}

impl CrawlSession {
    /// Creates a fresh session
    pub fn new(page_limit: Option<u32>) -> Self {
        Self {
            page_limit,
            pages_visited: 0,
            accumulated: Vec::new(),
            seen_keys: HashSet::new(),
            duplicates_dropped: 0,
        }
    }

    /// Absorbs one page's worth of raw listings, deduplicating by
    /// identity key
    ///
    /// Returns how many listings were new. First-seen order is preserved;
    /// a repeated key keeps the earlier record.
    pub fn absorb_page(&mut self, raw: Vec<RawListing>) -> usize {
        let mut added = 0;
        for item in raw {
            let listing = Listing::from_raw(item);
            if self.seen_keys.insert(listing.identity_key.clone()) {
                self.accumulated.push(listing);
                added += 1;
            } else {
                self.duplicates_dropped += 1;
            }
        }
        self.pages_visited += 1;
        added
    }

    /// Returns true once the page limit (if any) is exhausted
    pub fn limit_reached(&self) -> bool {
        match self.page_limit {
            Some(limit) => self.pages_visited >= limit,
            None => false,
        }
    }

    pub fn page_limit(&self) -> Option<u32> {
        self.page_limit
    }

    pub fn pages_visited(&self) -> u32 {
        self.pages_visited
    }

    pub fn listings_collected(&self) -> usize {
        self.accumulated.len()
    }

    pub fn duplicates_dropped(&self) -> u64 {
        self.duplicates_dropped
    }

    /// Read access to the accumulator, for checkpointing
    pub fn listings(&self) -> &[Listing] {
        &self.accumulated
    }

    /// Consumes the session into a terminal outcome
    pub fn into_outcome(self, stop_reason: StopReason) -> CrawlOutcome {
        CrawlOutcome {
            listings: self.accumulated,
            stop_reason,
            pages_visited: self.pages_visited,
            duplicates_dropped: self.duplicates_dropped,
        }
    }
}

/// The terminal result of a crawl
///
/// Always produced, whatever the stop reason; per-page failures never
/// escape as errors. An empty listing set with a non-error stop reason
/// means "nothing found", which callers can distinguish from a crash.
#[derive(Debug)]
pub struct CrawlOutcome {
    /// Deduplicated listings in first-seen order, scored when non-empty
    pub listings: Vec<Listing>,

    /// Why the crawl stopped
    pub stop_reason: StopReason,

    /// Pages visited before stopping
    pub pages_visited: u32,

    /// Repeats dropped by deduplication
    pub duplicates_dropped: u64,
}

impl CrawlOutcome {
    /// Returns true when nothing survived extraction and deduplication
    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(title: &str, id: &str) -> RawListing {
        RawListing {
            title: title.to_string(),
            id: Some(id.to_string()),
            rating: Some("4.0".to_string()),
            reviews: Some("10".to_string()),
            price: Some("5.00".to_string()),
            url: None,
        }
    }

    #[test]
    fn test_absorb_dedupes_across_pages() {
        let mut session = CrawlSession::new(None);

        let added = session.absorb_page(vec![raw("A", "a"), raw("B", "b")]);
        assert_eq!(added, 2);

        // Page 2 repeats one key from page 1
        let added = session.absorb_page(vec![raw("B again", "b"), raw("C", "c")]);
        assert_eq!(added, 1);

        assert_eq!(session.listings_collected(), 3);
        assert_eq!(session.duplicates_dropped(), 1);
        assert_eq!(session.pages_visited(), 2);

        // First-seen order and first-seen record both preserved
        let titles: Vec<&str> = session.listings().iter().map(|l| l.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_absorb_dedupes_within_page() {
        let mut session = CrawlSession::new(None);
        let added = session.absorb_page(vec![raw("A", "a"), raw("A dup", "a")]);
        assert_eq!(added, 1);
        assert_eq!(session.duplicates_dropped(), 1);
    }

    #[test]
    fn test_limit_reached() {
        let mut session = CrawlSession::new(Some(2));
        assert!(!session.limit_reached());
        session.absorb_page(vec![raw("A", "a")]);
        assert!(!session.limit_reached());
        session.absorb_page(vec![raw("B", "b")]);
        assert!(session.limit_reached());
    }

    #[test]
    fn test_unbounded_limit() {
        let mut session = CrawlSession::new(None);
        for i in 0..100 {
            session.absorb_page(vec![raw(&format!("t{i}"), &format!("k{i}"))]);
        }
        assert!(!session.limit_reached());
    }

    #[test]
    fn test_into_outcome() {
        let mut session = CrawlSession::new(Some(5));
        session.absorb_page(vec![raw("A", "a")]);
        let outcome = session.into_outcome(StopReason::NoNextPage);
        assert_eq!(outcome.pages_visited, 1);
        assert_eq!(outcome.listings.len(), 1);
        assert!(!outcome.is_empty());
        assert_eq!(outcome.stop_reason, StopReason::NoNextPage);
    }

    #[test]
    fn test_empty_outcome_is_distinguishable() {
        let session = CrawlSession::new(None);
        let outcome = session.into_outcome(StopReason::NoNextPage);
        assert!(outcome.is_empty());
        assert!(!outcome.stop_reason.is_error());
    }

    #[test]
    fn test_stop_reason_roundtrip() {
        for reason in StopReason::all_reasons() {
            let db = reason.to_db_string();
            assert_eq!(
                StopReason::from_db_string(db),
                Some(reason),
                "Failed roundtrip for {:?}",
                reason
            );
        }
        assert_eq!(StopReason::from_db_string("invalid"), None);
    }

    #[test]
    fn test_stop_reason_error_classification() {
        assert!(StopReason::ExtractionError.is_error());
        assert!(StopReason::NavigationError.is_error());
        assert!(StopReason::Stalled.is_error());

        assert!(!StopReason::NoNextPage.is_error());
        assert!(!StopReason::PageLimitReached.is_error());
        assert!(!StopReason::UserCancelled.is_error());
    }
}
