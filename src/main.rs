use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use tokio::sync::watch;

use gator::{
    config::{AppConfig, UserConfig},
    errors::AppResult,
    handlers::{feeds, follows, posts, users},
    initialize_db_pool, observability, run_migrations, session,
    tasks::feed_monitor::{FeedFetcher, Scheduler, SchedulerConfig},
    DbPool,
};

/// Multi-user RSS aggregator
#[derive(Parser, Debug)]
#[command(name = "gator", author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a user and log in as them
    Register { name: String },
    /// Switch the current user
    Login { name: String },
    /// Delete all users and their follows
    Reset,
    /// List users
    Users,
    /// Fetch feeds continuously, one round every <interval> (e.g. "1m", "30s")
    Agg {
        #[arg(value_parser = parse_interval)]
        interval: Duration,
        /// Feeds fetched concurrently per round
        #[arg(long)]
        workers: Option<usize>,
    },
    /// Register a feed and follow it
    Addfeed { name: String, url: String },
    /// List every feed with its creator
    Feeds,
    /// Follow an existing feed by URL
    Follow { url: String },
    /// Stop following a feed by URL
    Unfollow { url: String },
    /// List the feeds the current user follows
    Following,
    /// Show the latest posts from followed feeds
    Browse {
        #[arg(default_value_t = posts::DEFAULT_BROWSE_LIMIT)]
        limit: i64,
    },
}

fn parse_interval(raw: &str) -> Result<Duration, String> {
    let interval = humantime::parse_duration(raw).map_err(|e| e.to_string())?;
    if interval.is_zero() {
        return Err("interval must be greater than zero".to_string());
    }
    Ok(interval)
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    let args = Args::parse();
    observability::init_logging();

    match run(args.command).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command) -> AppResult<()> {
    let config = AppConfig::from_env()?;
    let workers = match &command {
        Command::Agg {
            workers: Some(n), ..
        } => *n,
        _ => config.workers,
    }
    .max(1);

    let pool = initialize_db_pool(&config.database_url, workers as u32 + 1)?;
    tracing::info!("Running database migrations");
    run_migrations(&mut *pool.get()?)?;

    let mut conn = pool.get()?;
    let mut user_config = UserConfig::read(&config.user_config_path)?;

    match command {
        Command::Agg { interval, .. } => {
            drop(conn);
            return aggregate(pool, &config, interval, workers).await;
        }
        Command::Register { name } => {
            let user = users::register(&mut conn, &name)?;
            user_config.set_user(&config.user_config_path, &user.name)?;
            println!("User {} created", user.name);
        }
        Command::Login { name } => {
            let user = users::login(&mut conn, &name)?;
            user_config.set_user(&config.user_config_path, &user.name)?;
            println!("Logged in as {}", user.name);
        }
        Command::Reset => {
            let deleted = users::reset(&mut conn)?;
            println!("Deleted {deleted} user(s)");
        }
        Command::Users => {
            let current = user_config.current_user_name.as_deref();
            for user in users::list_users(&mut conn)? {
                if Some(user.name.as_str()) == current {
                    println!("* {} (current)", user.name);
                } else {
                    println!("* {}", user.name);
                }
            }
        }
        Command::Addfeed { name, url } => {
            let user = session::current_user(&mut conn, &user_config)?;
            let feed = feeds::add_feed(&mut conn, &user, &name, &url)?;
            println!("Added feed {} ({})", feed.name, feed.url);
        }
        Command::Feeds => {
            for listing in feeds::list_feeds(&mut conn)? {
                println!("* {}", listing.name);
                println!("  url:  {}", listing.url);
                println!("  user: {}", listing.owner_name);
            }
        }
        Command::Follow { url } => {
            let user = session::current_user(&mut conn, &user_config)?;
            let feed = follows::follow(&mut conn, &user, &url)?;
            println!("{} is now following {}", user.name, feed.name);
        }
        Command::Unfollow { url } => {
            let user = session::current_user(&mut conn, &user_config)?;
            let feed = follows::unfollow(&mut conn, &user, &url)?;
            println!("{} unfollowed {}", user.name, feed.name);
        }
        Command::Following => {
            let user = session::current_user(&mut conn, &user_config)?;
            for name in follows::list_following(&mut conn, &user)? {
                println!("* {name}");
            }
        }
        Command::Browse { limit } => {
            let user = session::current_user(&mut conn, &user_config)?;
            for post in posts::browse(&mut conn, &user, limit)? {
                let published = post
                    .published_at
                    .map(|at| at.format("%Y-%m-%d %H:%M UTC").to_string())
                    .unwrap_or_else(|| "unknown date".to_string());
                println!("{}  {}", published, posts::unescape(&post.title));
                println!("    {}", post.url);
                if let Some(description) = post.description.as_deref() {
                    println!("    {}", posts::unescape(description));
                }
                println!();
            }
        }
    }

    Ok(())
}

async fn aggregate(
    pool: DbPool,
    config: &AppConfig,
    interval: Duration,
    workers: usize,
) -> AppResult<()> {
    let fetcher = FeedFetcher::new(config.fetch_timeout)?;
    let scheduler = Scheduler::new(
        pool,
        fetcher,
        SchedulerConfig {
            interval,
            workers,
            min_refresh_age: config.min_refresh_age,
        },
    );

    println!("Collecting feeds every {}", humantime::format_duration(interval));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => tracing::info!("Shutdown requested"),
            Err(e) => tracing::error!(error = %e, "Failed to listen for ctrl-c"),
        }
        let _ = shutdown_tx.send(true);
    });

    scheduler.run(shutdown_rx).await;
    Ok(())
}
