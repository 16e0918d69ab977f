//! Background polling pipeline: claim a due feed, fetch it, parse it and
//! store its new items as posts.

pub mod fetcher;
pub mod ingest;
pub mod parser;
pub mod runner;
pub mod types;

pub use fetcher::FeedFetcher;
pub use ingest::ingest_items;
pub use parser::parse_feed;
pub use runner::{CycleOutcome, Scheduler, SchedulerConfig};
pub use types::{IngestReport, ParsedFeed, ParsedItem};
