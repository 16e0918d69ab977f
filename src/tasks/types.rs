use std::time::Duration;

/// Interval between scheduler ticks when none is given.
pub const CHECK_INTERVAL: Duration = Duration::from_secs(60);

/// Upper bound on a single feed request, connect through body.
pub const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Concurrent ingestion cycles started per tick.
pub const DEFAULT_WORKERS: usize = 1;
