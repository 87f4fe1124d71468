//! Scrape coordinator - the single coordination loop
//!
//! The coordinator owns everything that is mutated while a batch runs:
//! - the result cache (successful pages only, never evicted)
//! - the table of fetches still in flight
//! - the word-count aggregate
//! - the completion counter (`delivered` against an announced `total`)
//!
//! It reacts to three event sources with `tokio::select!`: URL submissions,
//! completed worker results, and the total-count announcement. Workers are
//! spawned freely but only run while holding a permit of the execution gate.

use crate::crawler::fetcher::{scrape_url, PageSource};
use crate::crawler::words::WordCounts;
use crate::ScrapeError;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Semaphore};

/// Terminal event for one submitted URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// The submitted URL
    pub url: String,

    /// Word counts of the page, or why it could not be scraped
    pub result: Result<WordCounts, ScrapeError>,

    /// Whether the result was served without a fetch of its own
    pub cached: bool,
}

impl Outcome {
    /// Word counts of a successful outcome
    pub fn words(&self) -> Option<&WordCounts> {
        self.result.as_ref().ok()
    }

    pub fn error(&self) -> Option<&ScrapeError> {
        self.result.as_ref().err()
    }
}

/// Cloneable handle for submitting URLs
#[derive(Debug, Clone)]
pub struct Submitter {
    tx: mpsc::UnboundedSender<String>,
}

impl Submitter {
    /// Enqueues a URL; never blocks
    ///
    /// Fails with [`ScrapeError::Closed`] once the coordinator has finished.
    pub fn submit(&self, url: impl Into<String>) -> Result<(), ScrapeError> {
        self.tx.send(url.into()).map_err(|_| ScrapeError::Closed)
    }
}

/// One-shot handle for declaring how many URLs make up the batch
///
/// Announcing consumes the handle, so the total can only be set once.
/// Dropping it without announcing makes the coordinator use the number of
/// URLs received by the time every [`Submitter`] is gone.
#[derive(Debug)]
pub struct TotalAnnouncer {
    tx: oneshot::Sender<usize>,
}

impl TotalAnnouncer {
    pub fn announce(self, total: usize) {
        if self.tx.send(total).is_err() {
            tracing::debug!("Total of {} announced after the coordinator finished", total);
        }
    }
}

/// Consumer side: streamed outcomes, then the aggregate
#[derive(Debug)]
pub struct ScrapeResults {
    outcomes: mpsc::UnboundedReceiver<Outcome>,
    aggregate: oneshot::Receiver<WordCounts>,
}

impl ScrapeResults {
    /// Next outcome in completion order
    ///
    /// Returns `None` once every outcome of the batch has been delivered.
    pub async fn next(&mut self) -> Option<Outcome> {
        self.outcomes.recv().await
    }

    /// Waits for the batch to finish and returns the aggregate word counts
    ///
    /// Outcomes not yet read through [`next`](Self::next) are discarded.
    pub async fn aggregate(self) -> Result<WordCounts, ScrapeError> {
        let Self {
            outcomes,
            aggregate,
        } = self;
        drop(outcomes);
        aggregate.await.map_err(|_| ScrapeError::Closed)
    }
}

/// Result sent back by a worker task
#[derive(Debug)]
struct Completed {
    url: String,
    result: Result<WordCounts, ScrapeError>,
}

/// Counters reported when a batch finishes
#[derive(Debug, Default, Clone, Copy)]
struct BatchStats {
    fetched: usize,
    cache_hits: usize,
    coalesced: usize,
    failures: usize,
}

/// Main coordinator structure
pub struct Coordinator<S> {
    source: Arc<S>,
    gate: Arc<Semaphore>,

    urls: mpsc::UnboundedReceiver<String>,
    urls_open: bool,
    total_rx: oneshot::Receiver<usize>,
    total_pending: bool,
    completed_tx: mpsc::UnboundedSender<Completed>,
    completed_rx: mpsc::UnboundedReceiver<Completed>,
    outcomes: mpsc::UnboundedSender<Outcome>,
    aggregate_tx: oneshot::Sender<WordCounts>,

    cache: HashMap<String, WordCounts>,
    /// URL → number of extra submissions waiting on the running fetch
    in_flight: HashMap<String, usize>,
    aggregate: WordCounts,

    received: usize,
    delivered: usize,
    total: Option<usize>,
    stats: BatchStats,
}

impl<S: PageSource> Coordinator<S> {
    /// Creates a coordinator and the handles that talk to it
    ///
    /// `concurrency` is the number of fetches allowed to run at once; it is
    /// clamped to `1..=Semaphore::MAX_PERMITS`. The coordinator does nothing
    /// until [`run`](Self::run) is awaited.
    pub fn new(source: S, concurrency: usize) -> (Self, Submitter, TotalAnnouncer, ScrapeResults) {
        let (url_tx, url_rx) = mpsc::unbounded_channel();
        let (total_tx, total_rx) = oneshot::channel();
        let (completed_tx, completed_rx) = mpsc::unbounded_channel();
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        let (aggregate_tx, aggregate_rx) = oneshot::channel();

        let permits = concurrency.clamp(1, Semaphore::MAX_PERMITS);

        let coordinator = Self {
            source: Arc::new(source),
            gate: Arc::new(Semaphore::new(permits)),
            urls: url_rx,
            urls_open: true,
            total_rx,
            total_pending: true,
            completed_tx,
            completed_rx,
            outcomes: outcome_tx,
            aggregate_tx,
            cache: HashMap::new(),
            in_flight: HashMap::new(),
            aggregate: WordCounts::new(),
            received: 0,
            delivered: 0,
            total: None,
            stats: BatchStats::default(),
        };

        (
            coordinator,
            Submitter { tx: url_tx },
            TotalAnnouncer { tx: total_tx },
            ScrapeResults {
                outcomes: outcome_rx,
                aggregate: aggregate_rx,
            },
        )
    }

    /// Creates a coordinator and runs it on a background task
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(source: S, concurrency: usize) -> (Submitter, TotalAnnouncer, ScrapeResults) {
        let (coordinator, submitter, announcer, results) = Self::new(source, concurrency);
        tokio::spawn(coordinator.run());
        (submitter, announcer, results)
    }

    /// Runs the coordination loop until every outcome has been delivered
    ///
    /// On exit the outcome stream is closed first, then the aggregate is
    /// sent exactly once.
    pub async fn run(mut self) {
        tracing::debug!(
            "Coordinator started with {} execution slots",
            self.gate.available_permits()
        );

        loop {
            self.settle_total();
            if self.is_complete() {
                break;
            }

            tokio::select! {
                url = self.urls.recv(), if self.urls_open => match url {
                    Some(url) => self.on_submit(url),
                    None => {
                        tracing::debug!("All submitters dropped after {} URLs", self.received);
                        self.urls_open = false;
                    }
                },
                Some(completed) = self.completed_rx.recv() => self.on_completed(completed),
                announced = &mut self.total_rx, if self.total_pending => {
                    self.total_pending = false;
                    match announced {
                        Ok(total) => {
                            tracing::debug!("Batch total announced: {}", total);
                            self.total = Some(total);
                        }
                        Err(_) => tracing::warn!(
                            "Total was never announced; waiting for submitters to finish"
                        ),
                    }
                }
            }
        }

        self.finish();
    }

    /// Resolves the total when the producers can no longer change it
    fn settle_total(&mut self) {
        if self.urls_open {
            return;
        }

        match self.total {
            None if !self.total_pending => {
                self.total = Some(self.received);
            }
            Some(total) if total > self.received => {
                tracing::error!(
                    "Announced {} URLs but submitters closed after {}; finishing with what arrived",
                    total,
                    self.received
                );
                self.total = Some(self.received);
            }
            _ => {}
        }
    }

    fn is_complete(&self) -> bool {
        matches!(self.total, Some(total) if self.delivered >= total)
    }

    fn on_submit(&mut self, url: String) {
        self.received += 1;

        if let Some(words) = self.cache.get(&url) {
            tracing::debug!("Cache hit for {}", url);
            let outcome = Outcome {
                url,
                result: Ok(words.clone()),
                cached: true,
            };
            self.stats.cache_hits += 1;
            self.deliver(outcome);
            return;
        }

        if let Some(waiters) = self.in_flight.get_mut(&url) {
            tracing::debug!("{} is already being fetched, waiting on it", url);
            *waiters += 1;
            return;
        }

        self.in_flight.insert(url.clone(), 0);
        self.dispatch(url);
    }

    /// Spawns a worker task for `url`
    ///
    /// Spawning never blocks; the task parks on the gate until a slot frees.
    fn dispatch(&self, url: String) {
        tracing::debug!("Dispatching {}", url);

        let source = Arc::clone(&self.source);
        let gate = Arc::clone(&self.gate);
        let done = self.completed_tx.clone();

        tokio::spawn(async move {
            let task_url = url.clone();
            let worker = tokio::spawn(async move {
                match gate.acquire_owned().await {
                    Ok(_permit) => scrape_url(&*source, &task_url).await,
                    Err(_) => Err(ScrapeError::Gate { url: task_url }),
                }
            });

            // A panicking worker still has to produce an outcome.
            let result = worker.await.unwrap_or_else(|e| {
                Err(ScrapeError::Fetch {
                    url: url.clone(),
                    message: format!("worker task failed: {}", e),
                })
            });

            // Only fails once the coordinator is gone.
            let _ = done.send(Completed { url, result });
        });
    }

    fn on_completed(&mut self, completed: Completed) {
        let Completed { url, result } = completed;
        let waiters = self.in_flight.remove(&url).unwrap_or(0);
        self.stats.fetched += 1;

        match result {
            Ok(words) => {
                tracing::debug!("Scraped {} ({} distinct words)", url, words.len());
                self.cache.insert(url.clone(), words.clone());

                for _ in 0..waiters {
                    self.stats.coalesced += 1;
                    self.deliver(Outcome {
                        url: url.clone(),
                        result: Ok(words.clone()),
                        cached: true,
                    });
                }

                self.deliver(Outcome {
                    url,
                    result: Ok(words),
                    cached: false,
                });
            }
            Err(e) => {
                tracing::warn!("{}", e);
                self.deliver(Outcome {
                    url: url.clone(),
                    result: Err(e),
                    cached: false,
                });

                // Failures are not shared: the next waiter gets its own fetch.
                if waiters > 0 {
                    self.in_flight.insert(url.clone(), waiters - 1);
                    self.dispatch(url);
                }
            }
        }
    }

    /// Folds an outcome into the aggregate and forwards it to the consumer
    fn deliver(&mut self, outcome: Outcome) {
        match &outcome.result {
            Ok(words) => self.aggregate.merge(words),
            Err(_) => self.stats.failures += 1,
        }
        self.delivered += 1;

        if self.outcomes.send(outcome).is_err() {
            tracing::trace!("Outcome dropped, consumer is gone");
        }
    }

    fn finish(self) {
        let Self {
            outcomes,
            aggregate_tx,
            aggregate,
            received,
            delivered,
            stats,
            in_flight,
            ..
        } = self;

        // Close the stream before the aggregate goes out.
        drop(outcomes);

        if received > delivered || !in_flight.is_empty() {
            tracing::warn!(
                "Finished with {} URLs received but only {} delivered",
                received,
                delivered
            );
        }

        tracing::info!(
            "Batch finished: {} outcomes ({} fetched, {} cache hits, {} coalesced, {} failed)",
            delivered,
            stats.fetched,
            stats.cache_hits,
            stats.coalesced,
            stats.failures
        );

        if aggregate_tx.send(aggregate).is_err() {
            tracing::trace!("Aggregate dropped, consumer is gone");
        }
    }
}
