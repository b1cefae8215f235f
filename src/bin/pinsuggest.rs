//! Pinsuggest CLI: inspect and exercise the local suggestion state.
//!
//! Usage:
//!   pinsuggest recent <list|record|clear> [--db path]
//!   pinsuggest cache show [--db path]
//!   pinsuggest rank <tags...> [--db path]
//!   pinsuggest merge --recent a,b --pinboard c --llm d --selected e

use clap::{Parser, Subcommand};
use pinsuggest::tags::menu_label;
use pinsuggest::{
    aggregate, display_strings, filter_rank, KeyValueStore, LocalTagCache, OpenStore,
    RecentTagLedger, SqliteStore, SuggestConfig, SuggestionItem, SystemClock,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "pinsuggest",
    version,
    about = "Tag suggestions for Pinboard bookmarks"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Path to SQLite database file
    #[arg(long, global = true)]
    db: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the recent-tag ledger
    Recent {
        #[command(subcommand)]
        action: RecentAction,
    },
    /// Inspect the cached tag vocabulary
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
    /// Filter and rank raw suggestions against the cached vocabulary
    Rank {
        /// Raw suggested tags
        #[arg(required = true)]
        tags: Vec<String>,
    },
    /// Merge suggestion groups into one display list
    Merge {
        #[arg(long, value_delimiter = ',')]
        recent: Vec<String>,
        #[arg(long, value_delimiter = ',')]
        pinboard: Vec<String>,
        #[arg(long, value_delimiter = ',')]
        llm: Vec<String>,
        /// Tags already on the bookmark
        #[arg(long, value_delimiter = ',')]
        selected: Vec<String>,
    },
}

#[derive(Subcommand)]
enum RecentAction {
    /// List unexpired recent tags, most recent first
    List,
    /// Record tags as just used
    Record {
        #[arg(required = true)]
        tags: Vec<String>,
    },
    /// Remove all recent tags
    Clear,
}

#[derive(Subcommand)]
enum CacheAction {
    /// Print cached tags with counts
    Show,
}

/// Get the default database path (~/.local/share/pinsuggest/pinsuggest.db)
fn default_db_path() -> PathBuf {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_default().join(".local/share"));
    data_dir.join("pinsuggest").join("pinsuggest.db")
}

fn open_store(db: Option<PathBuf>) -> Result<Arc<dyn KeyValueStore>, String> {
    let db_path = db.unwrap_or_else(default_db_path);
    let store = SqliteStore::open(&db_path).map_err(|e| format!("Failed to open database: {}", e))?;
    Ok(Arc::new(store))
}

fn cmd_recent(store: Arc<dyn KeyValueStore>, config: &SuggestConfig, action: RecentAction) -> i32 {
    let ledger = RecentTagLedger::new(store, Arc::new(SystemClock), config.recent_ttl);
    match action {
        RecentAction::List => {
            let tags = ledger.list();
            if tags.is_empty() {
                println!("No recent tags.");
            }
            for tag in tags {
                println!("{}", tag);
            }
            0
        }
        RecentAction::Record { tags } => match ledger.record(&tags) {
            Ok(()) => {
                println!("Recorded {} tag(s)", tags.len());
                0
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        },
        RecentAction::Clear => match ledger.clear() {
            Ok(()) => {
                println!("Cleared recent tags");
                0
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                1
            }
        },
    }
}

fn cmd_cache_show(cache: &LocalTagCache) -> i32 {
    let counts = cache.read();
    if counts.is_empty() {
        println!("Tag cache is empty.");
        return 0;
    }
    let mut entries: Vec<(&String, &u64)> = counts.iter().collect();
    entries.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

    let state = if cache.is_fresh() { "fresh" } else { "stale" };
    let written = cache
        .last_written_at()
        .and_then(chrono::DateTime::<chrono::Utc>::from_timestamp_millis)
        .map(|t| t.to_rfc3339())
        .unwrap_or_default();
    println!("{} tags, written {} ({})", counts.len(), written, state);
    println!("{:<32}  {:>7}", "TAG", "COUNT");
    println!("{}", "-".repeat(41));
    for (tag, count) in entries {
        println!("{:<32}  {:>7}", tag, count);
    }
    0
}

fn cmd_rank(cache: &LocalTagCache, tags: &[String]) -> i32 {
    let counts = cache.read();
    for item in filter_rank(tags, &counts) {
        match item.tag() {
            Some(tag) => println!("{}", menu_label(tag, &counts)),
            None => println!("--"),
        }
    }
    0
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = SuggestConfig::default();

    if let Commands::Merge {
        recent,
        pinboard,
        llm,
        selected,
    } = &cli.command
    {
        let service: Vec<SuggestionItem> = pinboard.iter().map(|t| t.as_str().into()).collect();
        for line in display_strings(&aggregate(recent, &service, llm, selected)) {
            println!("{}", line);
        }
        std::process::exit(0);
    }

    let store = match open_store(cli.db) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    let cache = LocalTagCache::new(store.clone(), Arc::new(SystemClock), config.tag_cache_ttl);

    let code = match cli.command {
        Commands::Recent { action } => cmd_recent(store, &config, action),
        Commands::Cache {
            action: CacheAction::Show,
        } => cmd_cache_show(&cache),
        Commands::Rank { tags } => cmd_rank(&cache, &tags),
        Commands::Merge { .. } => 0,
    };
    std::process::exit(code);
}
