//! Crawl coordinator - main collection orchestration logic
//!
//! This module contains the main collection loop that coordinates all
//! aspects of a run, including:
//! - Stepping through result pages one at a time
//! - Deduplicating extracted listings into the session accumulator
//! - Cooperative cancellation and watchdog stall protection
//! - Checkpointing partial results after every page
//! - Scoring the accumulated batch when the run finishes
//!
//! The coordinator owns the session state exclusively; collaborators only
//! see extraction and navigation requests. Every per-page failure is
//! absorbed into a terminal stop reason - nothing escapes to the host as
//! an error, and partial results are always preferred over none.

use crate::config::{CrawlConfig, ScoringConfig};
use crate::crawler::session::{CrawlOutcome, CrawlSession, StopReason};
use crate::crawler::{PageExtractor, PageNavigator};
use crate::scoring::score_batch;
use crate::storage::{SqliteStorage, Storage};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::timeout;

/// Passive progress notification published after each page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Progress {
    /// Pages visited so far
    pub pages_visited: u32,

    /// The configured page limit, if any
    pub page_limit: Option<u32>,

    /// Listings accumulated so far (after deduplication)
    pub listings_collected: usize,
}

/// Handle for cancelling a running crawl from another task
///
/// Cancellation is cooperative: it takes effect at the coordinator's next
/// check point (before extracting a new page, before issuing navigation).
/// An in-flight extraction always completes first, so the accumulator is
/// never left in a torn state.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    cancelled: Arc<AtomicBool>,
}

impl CancelHandle {
    /// Requests cancellation; takes effect eventually, never preemptively
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Returns true once cancellation has been requested
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Storage destination for per-page checkpoints
struct CheckpointSink {
    storage: SqliteStorage,
    session_id: i64,
}

/// Main crawl coordinator structure
///
/// Generic over a single collaborator value that implements both page
/// extraction and page navigation.
pub struct Coordinator<P> {
    pager: P,
    navigation_timeout: Duration,
    watchdog_timeout: Duration,
    settle_delay: Duration,
    scoring: ScoringConfig,
    session: CrawlSession,
    cancelled: Arc<AtomicBool>,
    progress_tx: watch::Sender<Progress>,
    checkpoint: Option<CheckpointSink>,
}

impl<P> Coordinator<P>
where
    P: PageExtractor + PageNavigator,
{
    /// Creates a new coordinator over an already-positioned pager
    ///
    /// The pager is expected to be on the first results page; the
    /// coordinator extracts before it ever navigates.
    pub fn new(pager: P, crawl: &CrawlConfig, scoring: ScoringConfig) -> Self {
        let (progress_tx, _) = watch::channel(Progress {
            pages_visited: 0,
            page_limit: crawl.page_limit,
            listings_collected: 0,
        });

        Self {
            pager,
            navigation_timeout: Duration::from_millis(crawl.navigation_timeout_ms),
            watchdog_timeout: Duration::from_millis(crawl.watchdog_timeout_ms),
            settle_delay: Duration::from_millis(crawl.settle_delay_ms),
            scoring,
            session: CrawlSession::new(crawl.page_limit),
            cancelled: Arc::new(AtomicBool::new(false)),
            progress_tx,
            checkpoint: None,
        }
    }

    /// Enables per-page checkpointing into the given storage session
    pub fn with_checkpointing(mut self, storage: SqliteStorage, session_id: i64) -> Self {
        self.checkpoint = Some(CheckpointSink {
            storage,
            session_id,
        });
        self
    }

    /// Returns a handle callers can use to cancel the crawl
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            cancelled: Arc::clone(&self.cancelled),
        }
    }

    /// Subscribes to progress notifications
    pub fn subscribe_progress(&self) -> watch::Receiver<Progress> {
        self.progress_tx.subscribe()
    }

    /// Runs the collection loop to completion
    ///
    /// Always returns an outcome: per-page failures, stalls, and
    /// cancellation all terminate the loop with a stop reason and
    /// whatever was collected. A non-empty accumulator is scored with the
    /// configured method before the outcome is returned.
    pub async fn run(mut self) -> CrawlOutcome {
        tracing::info!(
            "Starting crawl (page limit: {})",
            self.session
                .page_limit()
                .map_or("unbounded".to_string(), |l| l.to_string())
        );

        let stop_reason = self.drive().await;

        let Self {
            session,
            checkpoint,
            scoring,
            ..
        } = self;

        let mut outcome = session.into_outcome(stop_reason);

        if outcome.is_empty() {
            tracing::info!("Crawl finished with no listings ({})", stop_reason);
        } else {
            // Preset priors derive from the finished batch, so parameters
            // resolve here rather than at construction
            let params = scoring.resolve_params(&outcome.listings);
            score_batch(&mut outcome.listings, scoring.method(), params);
            tracing::info!(
                "Crawl finished: {} listings over {} pages, {} duplicates dropped ({})",
                outcome.listings.len(),
                outcome.pages_visited,
                outcome.duplicates_dropped,
                stop_reason
            );
        }

        if let Some(mut sink) = checkpoint {
            let finalized = sink
                .storage
                .update_scores(sink.session_id, &outcome.listings)
                .and_then(|_| sink.storage.complete_session(sink.session_id, stop_reason));
            if let Err(e) = finalized {
                tracing::warn!("Failed to finalize session checkpoint: {}", e);
            }
        }

        outcome
    }

    /// Steps the state machine until a stop reason is reached
    async fn drive(&mut self) -> StopReason {
        loop {
            // Cancellation check point: before starting a new page
            if self.is_cancelled() {
                return StopReason::UserCancelled;
            }

            let page_number = self.session.pages_visited() + 1;

            // Extraction, guarded by the watchdog
            let raw = match timeout(self.watchdog_timeout, self.pager.extract()).await {
                Err(_) => {
                    tracing::warn!(
                        "Watchdog fired while extracting page {} ({} listings collected)",
                        page_number,
                        self.session.listings_collected()
                    );
                    return StopReason::Stalled;
                }
                Ok(Err(e)) => {
                    tracing::warn!(
                        "Extraction failed on page {}: {} ({} listings collected)",
                        page_number,
                        e,
                        self.session.listings_collected()
                    );
                    return StopReason::ExtractionError;
                }
                Ok(Ok(raw)) => raw,
            };

            let extracted = raw.len();
            let added = self.session.absorb_page(raw);
            tracing::info!(
                "Page {}: {} extracted, {} new, {} accumulated",
                page_number,
                extracted,
                added,
                self.session.listings_collected()
            );

            self.write_checkpoint();
            self.publish_progress();

            if self.session.limit_reached() {
                return StopReason::PageLimitReached;
            }

            // Cancellation check point: before looking for the next page
            if self.is_cancelled() {
                return StopReason::UserCancelled;
            }

            let next = match timeout(self.watchdog_timeout, self.pager.find_next_page()).await {
                Err(_) => {
                    tracing::warn!("Watchdog fired while resolving the next page");
                    return StopReason::Stalled;
                }
                Ok(None) => return StopReason::NoNextPage,
                Ok(Some(url)) => url,
            };

            // Cancellation check point: before issuing navigation
            if self.is_cancelled() {
                return StopReason::UserCancelled;
            }

            match timeout(self.navigation_timeout, self.pager.navigate_to(&next)).await {
                Err(_) => {
                    // Best-effort tradeoff: a slow load is treated as
                    // "probably loaded enough", not a hard failure
                    tracing::warn!(
                        "Navigation to {} timed out after {:?}, extracting anyway",
                        next,
                        self.navigation_timeout
                    );
                }
                Ok(Err(e)) => {
                    tracing::warn!("Navigation to {} failed: {}", next, e);
                    return StopReason::NavigationError;
                }
                Ok(Ok(())) => {
                    if !self.settle_delay.is_zero() {
                        tokio::time::sleep(self.settle_delay).await;
                    }
                }
            }
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Persists the session after a page; failures are logged and
    /// swallowed so persistence never takes a crawl down
    fn write_checkpoint(&mut self) {
        if let Some(sink) = &mut self.checkpoint {
            if let Err(e) = sink.storage.checkpoint_session(
                sink.session_id,
                self.session.pages_visited(),
                self.session.duplicates_dropped(),
                self.session.listings(),
            ) {
                tracing::warn!("Checkpoint failed (continuing): {}", e);
            }
        }
    }

    fn publish_progress(&self) {
        self.progress_tx.send_replace(Progress {
            pages_visited: self.session.pages_visited(),
            page_limit: self.session.page_limit(),
            listings_collected: self.session.listings_collected(),
        });
    }
}
