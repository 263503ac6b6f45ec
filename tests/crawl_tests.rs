//! Integration tests for the collection pipeline
//!
//! Scripted collaborator fakes exercise the orchestrator's state machine
//! (deduplication, cancellation, limits, absorbed failures, stall
//! protection); wiremock drives the HTTP pager end to end through
//! pagination to a scored result.

use async_trait::async_trait;
use shelf_scout::config::{CrawlConfig, ScoringConfig, SelectorConfig};
use shelf_scout::crawler::{
    CancelHandle, Coordinator, HttpPager, PageError, PageExtractor, PageNavigator, StopReason,
};
use shelf_scout::listing::RawListing;
use shelf_scout::storage::{SessionStatus, SqliteStorage, Storage};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a crawl configuration with short timeouts for testing
fn test_crawl_config(page_limit: Option<u32>) -> CrawlConfig {
    CrawlConfig {
        start_url: "https://shop.example.com/search".to_string(),
        page_limit,
        navigation_timeout_ms: 1_000,
        watchdog_timeout_ms: 5_000,
        settle_delay_ms: 0,
        user_agent: "shelf-scout-test/1.0".to_string(),
    }
}

fn raw(title: &str, id: &str, rating: &str, reviews: &str, price: &str) -> RawListing {
    RawListing {
        title: title.to_string(),
        id: Some(id.to_string()),
        rating: Some(rating.to_string()),
        reviews: Some(reviews.to_string()),
        price: Some(price.to_string()),
        url: None,
    }
}

type CancelSlot = Arc<Mutex<Option<CancelHandle>>>;

/// Scripted pager: serves fixed pages with configurable failure points
struct ScriptedPager {
    pages: Vec<Vec<RawListing>>,
    current: usize,
    fail_extract_on: Option<usize>,
    stall_extract_on: Option<usize>,
    fail_navigate_to: Option<usize>,
    cancel_on_navigate: Option<CancelSlot>,
}

impl ScriptedPager {
    fn new(pages: Vec<Vec<RawListing>>) -> Self {
        Self {
            pages,
            current: 0,
            fail_extract_on: None,
            stall_extract_on: None,
            fail_navigate_to: None,
            cancel_on_navigate: None,
        }
    }
}

#[async_trait]
impl PageExtractor for ScriptedPager {
    async fn extract(&mut self) -> Result<Vec<RawListing>, PageError> {
        let page_number = self.current + 1;
        if self.stall_extract_on == Some(page_number) {
            // Longer than any test watchdog; the coordinator must bail out
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if self.fail_extract_on == Some(page_number) {
            return Err(PageError::Extraction("result markup changed".to_string()));
        }
        Ok(self.pages[self.current].clone())
    }
}

#[async_trait]
impl PageNavigator for ScriptedPager {
    async fn find_next_page(&mut self) -> Option<Url> {
        if self.current + 1 < self.pages.len() {
            Url::parse(&format!(
                "https://shop.example.com/search?page={}",
                self.current + 2
            ))
            .ok()
        } else {
            None
        }
    }

    async fn navigate_to(&mut self, _url: &Url) -> Result<(), PageError> {
        if let Some(slot) = &self.cancel_on_navigate {
            if let Some(handle) = slot.lock().unwrap().as_ref() {
                handle.cancel();
            }
        }
        let target = self.current + 2;
        if self.fail_navigate_to == Some(target) {
            return Err(PageError::Navigation("connection reset".to_string()));
        }
        self.current += 1;
        Ok(())
    }
}

#[tokio::test]
async fn test_two_pages_dedupe_preserves_first_seen_order() {
    let pager = ScriptedPager::new(vec![
        vec![
            raw("Alpha", "a", "4.0", "100", "10.00"),
            raw("Beta", "b", "4.5", "10", "20.00"),
        ],
        // Page 2 repeats one identity key from page 1
        vec![
            raw("Beta repeat", "b", "4.5", "11", "20.00"),
            raw("Gamma", "c", "3.0", "2", "30.00"),
        ],
    ]);

    let outcome = Coordinator::new(pager, &test_crawl_config(None), ScoringConfig::default())
        .run()
        .await;

    assert_eq!(outcome.stop_reason, StopReason::NoNextPage);
    assert_eq!(outcome.pages_visited, 2);
    // page1Count + page2Count - 1
    assert_eq!(outcome.listings.len(), 3);
    assert_eq!(outcome.duplicates_dropped, 1);

    let titles: Vec<&str> = outcome.listings.iter().map(|l| l.title.as_str()).collect();
    assert_eq!(titles, vec!["Alpha", "Beta", "Gamma"]);

    // The finished batch is scored
    for listing in &outcome.listings {
        assert!(listing.score.is_some());
    }
}

#[tokio::test]
async fn test_cancel_before_second_page_keeps_first_page_only() {
    let slot: CancelSlot = Arc::new(Mutex::new(None));
    let mut pager = ScriptedPager::new(vec![
        vec![raw("Alpha", "a", "4.0", "100", "10.00")],
        vec![raw("Beta", "b", "4.5", "10", "20.00")],
    ]);
    pager.cancel_on_navigate = Some(Arc::clone(&slot));

    let coordinator = Coordinator::new(pager, &test_crawl_config(None), ScoringConfig::default());
    *slot.lock().unwrap() = Some(coordinator.cancel_handle());

    let outcome = coordinator.run().await;

    // Cancellation landed during navigation, so it takes effect before
    // the second page's extraction begins
    assert_eq!(outcome.stop_reason, StopReason::UserCancelled);
    assert_eq!(outcome.listings.len(), 1);
    assert_eq!(outcome.listings[0].title, "Alpha");
    assert!(!outcome.stop_reason.is_error());
}

#[tokio::test]
async fn test_page_limit_stops_collection() {
    let pager = ScriptedPager::new(vec![
        vec![raw("Alpha", "a", "4.0", "100", "10.00")],
        vec![raw("Beta", "b", "4.5", "10", "20.00")],
        vec![raw("Gamma", "c", "3.0", "2", "30.00")],
    ]);

    let outcome = Coordinator::new(pager, &test_crawl_config(Some(2)), ScoringConfig::default())
        .run()
        .await;

    assert_eq!(outcome.stop_reason, StopReason::PageLimitReached);
    assert_eq!(outcome.pages_visited, 2);
    assert_eq!(outcome.listings.len(), 2);
}

#[tokio::test]
async fn test_extraction_error_keeps_partial_results() {
    let mut pager = ScriptedPager::new(vec![
        vec![
            raw("Alpha", "a", "4.0", "100", "10.00"),
            raw("Beta", "b", "4.5", "10", "20.00"),
        ],
        vec![raw("Gamma", "c", "3.0", "2", "30.00")],
    ]);
    pager.fail_extract_on = Some(2);

    let outcome = Coordinator::new(pager, &test_crawl_config(None), ScoringConfig::default())
        .run()
        .await;

    assert_eq!(outcome.stop_reason, StopReason::ExtractionError);
    assert!(outcome.stop_reason.is_error());
    // Page 1 survived; the failed page was simply abandoned
    assert_eq!(outcome.listings.len(), 2);
    for listing in &outcome.listings {
        assert!(listing.score.is_some());
    }
}

#[tokio::test]
async fn test_navigation_error_keeps_partial_results() {
    let mut pager = ScriptedPager::new(vec![
        vec![raw("Alpha", "a", "4.0", "100", "10.00")],
        vec![raw("Beta", "b", "4.5", "10", "20.00")],
    ]);
    pager.fail_navigate_to = Some(2);

    let outcome = Coordinator::new(pager, &test_crawl_config(None), ScoringConfig::default())
        .run()
        .await;

    assert_eq!(outcome.stop_reason, StopReason::NavigationError);
    assert_eq!(outcome.listings.len(), 1);
}

#[tokio::test]
async fn test_stall_watchdog_finishes_with_partial_results() {
    let mut pager = ScriptedPager::new(vec![
        vec![raw("Alpha", "a", "4.0", "100", "10.00")],
        vec![raw("Beta", "b", "4.5", "10", "20.00")],
    ]);
    pager.stall_extract_on = Some(2);

    let mut crawl = test_crawl_config(None);
    crawl.navigation_timeout_ms = 50;
    crawl.watchdog_timeout_ms = 200;

    let outcome = Coordinator::new(pager, &crawl, ScoringConfig::default())
        .run()
        .await;

    assert_eq!(outcome.stop_reason, StopReason::Stalled);
    assert_eq!(outcome.listings.len(), 1);
    assert_eq!(outcome.listings[0].title, "Alpha");
}

#[tokio::test]
async fn test_empty_result_is_explicit_not_an_error() {
    let pager = ScriptedPager::new(vec![vec![]]);

    let outcome = Coordinator::new(pager, &test_crawl_config(None), ScoringConfig::default())
        .run()
        .await;

    assert!(outcome.is_empty());
    assert_eq!(outcome.stop_reason, StopReason::NoNextPage);
    assert_eq!(outcome.pages_visited, 1);
}

#[tokio::test]
async fn test_checkpointing_persists_session_and_scores() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("checkpoint.db");

    let mut storage = SqliteStorage::new(&db_path).unwrap();
    let session_id = storage.create_session("hash123", Some(5)).unwrap();

    let pager = ScriptedPager::new(vec![
        vec![
            raw("Alpha", "a", "4.0", "100", "10.00"),
            raw("Beta", "b", "4.5", "10", "20.00"),
        ],
        vec![
            raw("Beta repeat", "b", "4.5", "10", "20.00"),
            raw("Gamma", "c", "3.0", "2", "30.00"),
        ],
    ]);

    let outcome = Coordinator::new(pager, &test_crawl_config(None), ScoringConfig::default())
        .with_checkpointing(storage, session_id)
        .run()
        .await;
    assert_eq!(outcome.listings.len(), 3);

    // Reopen the database the way a restarted process would
    let reopened = SqliteStorage::new(&db_path).unwrap();
    let session = reopened.get_latest_session().unwrap().unwrap();
    assert_eq!(session.id, session_id);
    assert_eq!(session.status, SessionStatus::Completed);
    assert_eq!(session.stop_reason.as_deref(), Some("no_next_page"));
    assert_eq!(session.pages_visited, 2);
    assert_eq!(session.duplicates_dropped, 1);

    let stored = reopened.load_listings(session_id).unwrap();
    assert_eq!(stored.len(), 3);
    let titles: Vec<&str> = stored.iter().map(|l| l.title.as_str()).collect();
    assert_eq!(titles, vec!["Alpha", "Beta", "Gamma"]);
    for listing in &stored {
        assert!(listing.score.is_some());
    }
}

#[tokio::test]
async fn test_interrupted_checkpoint_leaves_recoverable_partial_results() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("interrupted.db");

    let mut storage = SqliteStorage::new(&db_path).unwrap();
    let session_id = storage.create_session("hash123", None).unwrap();

    // A stall plays the role of a dying host process: the first page was
    // checkpointed before anything went wrong
    let mut pager = ScriptedPager::new(vec![
        vec![raw("Alpha", "a", "4.0", "100", "10.00")],
        vec![raw("Beta", "b", "4.5", "10", "20.00")],
    ]);
    pager.stall_extract_on = Some(2);

    let mut crawl = test_crawl_config(None);
    crawl.watchdog_timeout_ms = 200;
    crawl.navigation_timeout_ms = 50;

    let outcome = Coordinator::new(pager, &crawl, ScoringConfig::default())
        .with_checkpointing(storage, session_id)
        .run()
        .await;
    assert_eq!(outcome.stop_reason, StopReason::Stalled);

    let reopened = SqliteStorage::new(&db_path).unwrap();
    let stored = reopened.load_listings(session_id).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].title, "Alpha");
}

// ===== HTTP round-trip through the real pager =====

fn http_selectors() -> SelectorConfig {
    SelectorConfig {
        listing: "div.result".to_string(),
        title: "h2".to_string(),
        rating: Some("span.rating".to_string()),
        reviews: Some("span.reviews".to_string()),
        price: Some("span.price".to_string()),
        link: None,
        id_attribute: Some("data-id".to_string()),
        next_page: vec!["a.missing".to_string(), "a.next".to_string()],
        exclude_title_pattern: Some("(?i)sponsored".to_string()),
        min_title_length: 0,
    }
}

fn result_div(id: &str, title: &str, rating: &str, reviews: &str, price: &str) -> String {
    format!(
        r#"<div class="result" data-id="{id}">
             <h2>{title}</h2>
             <span class="rating">{rating}</span>
             <span class="reviews">{reviews}</span>
             <span class="price">{price}</span>
           </div>"#
    )
}

#[tokio::test]
async fn test_http_pager_full_crawl() {
    let mock_server = MockServer::start().await;

    let page_one = format!(
        "<html><body>{}{}{}<a class=\"next\" href=\"/search2\">Next</a></body></html>",
        result_div("A", "Alpha Widget", "4.5 out of 5", "1,234", "$19.99"),
        result_div("B", "Beta Widget", "4.0", "56", "$24.99"),
        result_div("S", "Sponsored Widget", "5.0", "1", "$9.99"),
    );
    let page_two = format!(
        "<html><body>{}{}</body></html>",
        result_div("B", "Beta Widget", "4.0", "56", "$24.99"),
        result_div("C", "Gamma Widget", "3.5", "7", "$14.99"),
    );

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page_one))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/search2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page_two))
        .mount(&mock_server)
        .await;

    let start = Url::parse(&format!("{}/search", mock_server.uri())).unwrap();
    let mut pager = HttpPager::new(http_selectors(), "shelf-scout-test/1.0").unwrap();
    pager.open(&start).await.unwrap();

    let mut crawl = test_crawl_config(None);
    crawl.start_url = start.to_string();

    let mut scoring = ScoringConfig::default();
    scoring.method = "enhanced".to_string();

    let outcome = Coordinator::new(pager, &crawl, scoring).run().await;

    assert_eq!(outcome.stop_reason, StopReason::NoNextPage);
    assert_eq!(outcome.pages_visited, 2);
    // Sponsored listing filtered, repeated listing deduplicated
    assert_eq!(outcome.listings.len(), 3);
    assert_eq!(outcome.duplicates_dropped, 1);

    let titles: Vec<&str> = outcome.listings.iter().map(|l| l.title.as_str()).collect();
    assert_eq!(titles, vec!["Alpha Widget", "Beta Widget", "Gamma Widget"]);

    // Coerced fields came through the real HTML path
    assert_eq!(outcome.listings[0].reviews, 1234);
    assert_eq!(outcome.listings[0].rating, 4.5);
    assert_eq!(outcome.listings[0].price, 19.99);
    assert_eq!(outcome.listings[0].identity_key, "A");

    for listing in &outcome.listings {
        let score = listing.score.unwrap();
        assert!((0.0..=5.0).contains(&score));
    }
}

#[tokio::test]
async fn test_http_pager_navigation_error_absorbs_into_outcome() {
    let mock_server = MockServer::start().await;

    let page_one = format!(
        "<html><body>{}<a class=\"next\" href=\"/search2\">Next</a></body></html>",
        result_div("A", "Alpha Widget", "4.5", "120", "$19.99"),
    );

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page_one))
        .mount(&mock_server)
        .await;
    // Page 2 is gone; navigation fails and the crawl keeps page 1
    Mock::given(method("GET"))
        .and(path("/search2"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let start = Url::parse(&format!("{}/search", mock_server.uri())).unwrap();
    let mut pager = HttpPager::new(http_selectors(), "shelf-scout-test/1.0").unwrap();
    pager.open(&start).await.unwrap();

    let outcome = Coordinator::new(pager, &test_crawl_config(None), ScoringConfig::default())
        .run()
        .await;

    assert_eq!(outcome.stop_reason, StopReason::NavigationError);
    assert_eq!(outcome.listings.len(), 1);
    assert!(outcome.listings[0].score.is_some());
}
