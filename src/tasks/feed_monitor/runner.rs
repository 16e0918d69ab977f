use std::time::Duration;

use chrono::{NaiveDateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use super::{fetcher::FeedFetcher, ingest::ingest_items, parser::parse_feed, types::IngestReport};
use crate::{
    errors::{AppError, AppResult},
    models::feed::Feed,
    tasks::types::{CHECK_INTERVAL, DEFAULT_WORKERS},
    DbPool,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// time between ticks; the first tick fires immediately
    pub interval: Duration,
    /// ingestion cycles started per tick, one feed each
    pub workers: usize,
    /// a feed fetched more recently than this is not due yet
    pub min_refresh_age: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval: CHECK_INTERVAL,
            workers: DEFAULT_WORKERS,
            min_refresh_age: Duration::ZERO,
        }
    }
}

/// What one claim -> fetch -> parse -> ingest pass did.
#[derive(Debug)]
pub enum CycleOutcome {
    /// no feed was due
    Idle,
    Ingested {
        feed: Feed,
        report: IngestReport,
    },
    /// `feed` is None when the claim itself failed
    Failed {
        feed: Option<Feed>,
        error: AppError,
    },
}

/// Recurring driver of the ingestion pipeline.
///
/// Each tick starts `workers` concurrent cycles. The feed claim is the only
/// point where cycles coordinate; everything after it touches a single
/// feed's rows.
#[derive(Debug, Clone)]
pub struct Scheduler {
    pool: DbPool,
    fetcher: FeedFetcher,
    config: SchedulerConfig,
}

impl Scheduler {
    pub fn new(pool: DbPool, fetcher: FeedFetcher, config: SchedulerConfig) -> Self {
        Self {
            pool,
            fetcher,
            config: SchedulerConfig {
                workers: config.workers.max(1),
                ..config
            },
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Tick until `shutdown` flips to true or its sender is dropped.
    ///
    /// A tick already in progress is allowed to finish.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            interval_secs = self.config.interval.as_secs_f64(),
            workers = self.config.workers,
            "Feed scheduler started"
        );

        let mut timer = interval(self.config.interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        while !*shutdown.borrow() {
            tokio::select! {
                _ = timer.tick() => {
                    self.tick().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!("Feed scheduler stopped");
    }

    /// Run one round of `workers` concurrent cycles.
    ///
    /// All cycles in the round share one `due_before` instant, so a feed
    /// claimed in this round cannot be claimed again until the next.
    pub async fn tick(&self) -> Vec<CycleOutcome> {
        let due_before = due_before(Utc::now().naive_utc(), self.config.min_refresh_age);

        let mut cycles = JoinSet::new();
        for _ in 0..self.config.workers {
            let scheduler = self.clone();
            cycles.spawn(async move { scheduler.run_cycle(due_before).await });
        }

        let mut outcomes = Vec::with_capacity(self.config.workers);
        while let Some(joined) = cycles.join_next().await {
            let outcome = joined.unwrap_or_else(|e| CycleOutcome::Failed {
                feed: None,
                error: e.into(),
            });
            log_outcome(&outcome);
            outcomes.push(outcome);
        }
        outcomes
    }

    /// One claim -> fetch -> parse -> ingest pass over a single feed.
    pub async fn run_cycle(&self, due_before: NaiveDateTime) -> CycleOutcome {
        let feed = match self.claim(due_before).await {
            Ok(feed) => feed,
            Err(AppError::NotFound { .. }) => return CycleOutcome::Idle,
            Err(error) => return CycleOutcome::Failed { feed: None, error },
        };

        debug!(feed_id = %feed.id, url = %feed.url, "Claimed feed");

        match self.fetch_and_store(&feed).await {
            Ok(report) => CycleOutcome::Ingested { feed, report },
            Err(error) => CycleOutcome::Failed {
                feed: Some(feed),
                error,
            },
        }
    }

    async fn claim(&self, due_before: NaiveDateTime) -> AppResult<Feed> {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || -> AppResult<Feed> {
            let mut conn = pool.get()?;
            Feed::claim_next(&mut conn, due_before)
        })
        .await?
    }

    async fn fetch_and_store(&self, feed: &Feed) -> AppResult<IngestReport> {
        let body = self.fetcher.fetch(&feed.url).await?;
        let parsed = parse_feed(&body)?;
        debug!(
            feed_id = %feed.id,
            title = %parsed.title,
            items = parsed.items.len(),
            "Parsed feed"
        );

        let pool = self.pool.clone();
        let feed_id = feed.id.clone();
        let report = tokio::task::spawn_blocking(move || -> AppResult<IngestReport> {
            let mut conn = pool.get()?;
            Ok(ingest_items(&mut conn, &feed_id, &parsed))
        })
        .await??;

        Ok(report)
    }
}

fn due_before(now: NaiveDateTime, min_refresh_age: Duration) -> NaiveDateTime {
    chrono::Duration::from_std(min_refresh_age)
        .ok()
        .and_then(|age| now.checked_sub_signed(age))
        .unwrap_or(now)
}

fn log_outcome(outcome: &CycleOutcome) {
    match outcome {
        CycleOutcome::Idle => debug!("No feeds due for fetching"),
        CycleOutcome::Ingested { feed, report } => info!(
            feed_id = %feed.id,
            feed = %feed.name,
            inserted = report.inserted,
            skipped = report.skipped,
            failed = report.failed,
            "Feed ingested"
        ),
        CycleOutcome::Failed { feed, error } => {
            let feed_id = feed.as_ref().map(|f| f.id.as_str()).unwrap_or("-");
            let url = feed.as_ref().map(|f| f.url.as_str()).unwrap_or("-");
            if error.is_transient() {
                warn!(feed_id, url, error = %error, "Feed cycle failed");
            } else {
                error!(feed_id, url, error = %error, "Feed cycle failed");
            }
        }
    }
}
