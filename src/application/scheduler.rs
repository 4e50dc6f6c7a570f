//! Poll Scheduler
//!
//! Drives the discovery loop: fetch a batch from the feed, run every
//! candidate through the pipeline with bounded concurrency, refresh the
//! paper books, sleep, repeat. Cycles are strictly sequential; a slow
//! cycle delays the next fetch rather than overlapping it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Notify, RwLock, Semaphore};
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::adapters::dexscreener::PairRefresher;
use crate::domain::Candidate;
use crate::ports::alerts::{Alert, TradeUpdateAlert};
use crate::ports::journal::{EventJournal, JournalRecord};
use crate::ports::source::CandidateSource;

use super::dispatcher::AlertDispatcher;
use super::paper::{PaperBook, TradeEvent};
use super::pipeline::{Pipeline, PipelineOutcome};

/// Cooperative stop signal shared between the loop and signal handlers.
#[derive(Clone)]
pub struct ShutdownHandle {
    flag: Arc<RwLock<bool>>,
    notify: Arc<Notify>,
}

impl ShutdownHandle {
    pub fn new() -> Self {
        Self {
            flag: Arc::new(RwLock::new(false)),
            notify: Arc::new(Notify::new()),
        }
    }

    pub async fn trigger(&self) {
        *self.flag.write().await = true;
        self.notify.notify_waiters();
    }

    pub async fn is_triggered(&self) -> bool {
        *self.flag.read().await
    }
}

impl Default for ShutdownHandle {
    fn default() -> Self {
        Self::new()
    }
}

pub struct Scheduler {
    source: Arc<dyn CandidateSource>,
    pipeline: Arc<Pipeline>,
    refresher: Arc<dyn PairRefresher>,
    dispatcher: Arc<AlertDispatcher>,
    journal: Arc<dyn EventJournal>,
    books: Mutex<Vec<PaperBook>>,
    poll_interval: Duration,
    max_concurrency: usize,
    shutdown: ShutdownHandle,
}

impl Scheduler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        source: Arc<dyn CandidateSource>,
        pipeline: Arc<Pipeline>,
        refresher: Arc<dyn PairRefresher>,
        dispatcher: Arc<AlertDispatcher>,
        journal: Arc<dyn EventJournal>,
        books: Vec<PaperBook>,
        poll_interval: Duration,
        max_concurrency: usize,
        shutdown: ShutdownHandle,
    ) -> Self {
        Self {
            source,
            pipeline,
            refresher,
            dispatcher,
            journal,
            books: Mutex::new(books),
            poll_interval,
            max_concurrency: max_concurrency.max(1),
            shutdown,
        }
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Run until the shutdown handle fires. Candidates in flight when the
    /// signal lands finish their walk; queued candidates are skipped and
    /// the loop exits at the cycle boundary.
    pub async fn run(self: Arc<Self>) {
        info!(
            source = self.source.name(),
            interval_s = self.poll_interval.as_secs(),
            "scanner started"
        );
        while !self.shutdown.is_triggered().await {
            self.run_cycle().await;
            if self.shutdown.is_triggered().await {
                break;
            }
            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                _ = self.shutdown.notify.notified() => {}
            }
        }
        info!("scanner stopped");
    }

    /// One fetch-evaluate-refresh pass.
    pub async fn run_cycle(&self) {
        let candidates = match self.source.fetch_new().await {
            Ok(batch) => batch,
            Err(err) => {
                // The next poll is the retry; nothing to salvage here.
                warn!(source = self.source.name(), error = %err, "fetch failed, skipping cycle");
                return;
            }
        };
        let fetched = candidates.len();

        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut tasks: JoinSet<Option<(Candidate, PipelineOutcome)>> = JoinSet::new();
        for candidate in candidates {
            let permit = semaphore.clone();
            let pipeline = self.pipeline.clone();
            let shutdown = self.shutdown.clone();
            tasks.spawn(async move {
                // Semaphore is never closed while tasks hold clones.
                let _permit = permit.acquire_owned().await;
                // In-flight candidates finish; queued ones stand down once
                // a stop is requested.
                if shutdown.is_triggered().await {
                    return None;
                }
                let outcome = pipeline.process(&candidate).await;
                Some((candidate, outcome))
            });
        }

        let mut evaluated = 0usize;
        let mut accepted = 0usize;
        let mut skipped = 0usize;
        let mut open_events = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Some((candidate, PipelineOutcome::Evaluated { verdicts, score }))) => {
                    evaluated += 1;
                    let mut books = self.books.lock().await;
                    for verdict in verdicts.iter().filter(|v| v.accepted()) {
                        accepted += 1;
                        if let Some(book) =
                            books.iter_mut().find(|b| b.strategy() == verdict.strategy)
                        {
                            if let Some(event) = book.open(&candidate, &score) {
                                open_events.push(event);
                            }
                        }
                    }
                }
                Ok(Some(_)) => {}
                Ok(None) => skipped += 1,
                Err(err) => {
                    // One panicked candidate must not take the cycle down.
                    error!(error = %err, "candidate task failed");
                }
            }
        }
        for event in open_events {
            self.publish_trade_event(event).await;
        }
        if skipped > 0 {
            info!(skipped, "candidates skipped for shutdown");
        }

        self.refresh_books().await;

        let books = self.books.lock().await;
        for book in books.iter() {
            let stats = book.stats();
            info!(
                book = book.strategy(),
                balance_usd = format!("{:.2}", stats.balance_usd),
                open = stats.open_positions,
                closed = stats.trades_closed,
                wins = stats.wins,
                losses = stats.losses,
                pnl_usd = format!("{:.2}", stats.realized_pnl_usd),
                "book status"
            );
        }
        info!(fetched, evaluated, accepted, "cycle complete");
    }

    /// Re-price every open paper position and apply the exit rules.
    async fn refresh_books(&self) {
        // Collect the lookups first so the feed is not hit under the lock.
        let held: Vec<(String, crate::domain::TokenId, String)> = {
            let books = self.books.lock().await;
            books
                .iter()
                .flat_map(|b| {
                    b.positions().iter().map(|p| {
                        (b.strategy().to_string(), p.token.clone(), p.pair_address.clone())
                    })
                })
                .collect()
        };

        for (strategy, token, pair_address) in held {
            let market_cap = match self
                .refresher
                .fetch_market_cap(&token.chain, &pair_address)
                .await
            {
                Ok(Some(mc)) => mc,
                Ok(None) => continue,
                Err(err) => {
                    warn!(token = %token, error = %err, "pair refresh failed");
                    continue;
                }
            };

            let events = {
                let mut books = self.books.lock().await;
                match books.iter_mut().find(|b| b.strategy() == strategy) {
                    Some(book) => book.update(&token, market_cap, chrono::Utc::now()),
                    None => continue,
                }
            };
            for event in events {
                self.publish_trade_event(event).await;
            }
        }
    }

    async fn publish_trade_event(&self, event: TradeEvent) {
        self.dispatcher
            .dispatch(&Alert::TradeUpdate(TradeUpdateAlert {
                strategy: event.strategy.clone(),
                symbol: event.symbol.clone(),
                event: event.event.clone(),
                realized_pnl_usd: event.realized_pnl_usd,
            }))
            .await;
        let record = JournalRecord::PaperTrade {
            strategy: event.strategy,
            symbol: event.symbol,
            event: event.event,
            realized_pnl_usd: event.realized_pnl_usd,
            at: chrono::Utc::now(),
        };
        if let Err(err) = self.journal.append(&record).await {
            error!(error = %err, "journal append failed");
        }
    }
}
