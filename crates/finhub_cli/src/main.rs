//! Command-line entry point for the finhub local state layer.
//!
//! # Responsibility
//! - Drive the watchlist store against the device SQLite medium.
//! - Drive the notification inbox against the dashboard service.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use finhub_core::{
    core_version, default_log_level, init_logging, open_medium, CoreConfig,
    HttpNotificationClient, InboxPoller, InboxSnapshot, NotificationInbox, WatchlistStore,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "finhub", about = "Watchlist and notification inbox tools")]
struct Cli {
    /// SQLite file holding the watchlist (overrides FINHUB_DB_PATH; `:memory:` keeps nothing).
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Notification service base URL (overrides FINHUB_API_URL).
    #[arg(long, global = true)]
    api_url: Option<String>,
    /// Absolute directory for rolling log files.
    #[arg(long, global = true)]
    log_dir: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the core version.
    Version,
    #[command(subcommand)]
    Watchlist(WatchlistCommand),
    #[command(subcommand)]
    Inbox(InboxCommand),
}

#[derive(Debug, Subcommand)]
enum WatchlistCommand {
    List,
    Add {
        ticker: String,
        #[arg(long)]
        name: Option<String>,
    },
    Remove {
        ticker: String,
    },
    Has {
        ticker: String,
    },
    Count,
    Clear,
}

#[derive(Debug, Subcommand)]
enum InboxCommand {
    List,
    Unread,
    Read { id: i64 },
    ReadAll,
    Delete { id: i64 },
    /// Refresh on the configured interval until Ctrl-C.
    Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_deref() {
        init_logging(default_log_level().as_str(), log_dir).context("logging init failed")?;
    }

    let mut config = CoreConfig::from_env().context("invalid FINHUB_* environment")?;
    if let Some(db) = cli.db {
        config.db_path = Some(db);
    }
    if let Some(api_url) = cli.api_url {
        config.api_base_url = api_url;
    }
    config.validate()?;

    match cli.command {
        Command::Version => println!("finhub_core {}", core_version()),
        Command::Watchlist(command) => run_watchlist(&config, command),
        Command::Inbox(command) => run_inbox(&config, command).await?,
    }
    Ok(())
}

fn run_watchlist(config: &CoreConfig, command: WatchlistCommand) {
    let store = WatchlistStore::with_key(
        open_medium(config.medium_path().as_deref()),
        config.watchlist_key.as_str(),
    );

    match command {
        WatchlistCommand::List => {
            for entry in store.get_all() {
                println!(
                    "{}\t{}\t{}",
                    entry.ticker,
                    entry.added_at.to_rfc3339(),
                    entry.name.unwrap_or_default()
                );
            }
        }
        WatchlistCommand::Add { ticker, name } => {
            let added = store.add(&ticker, name.as_deref());
            println!("{}", if added { "added" } else { "unchanged" });
        }
        WatchlistCommand::Remove { ticker } => {
            let removed = store.remove(&ticker);
            println!("{}", if removed { "removed" } else { "unchanged" });
        }
        WatchlistCommand::Has { ticker } => println!("{}", store.has(&ticker)),
        WatchlistCommand::Count => println!("{}", store.count()),
        WatchlistCommand::Clear => {
            store.clear();
            println!("cleared");
        }
    }
}

async fn run_inbox(config: &CoreConfig, command: InboxCommand) -> Result<()> {
    let client = HttpNotificationClient::new(&config.api_base_url)?;
    let inbox = Arc::new(NotificationInbox::with_query(
        Arc::new(client),
        config.inbox_query(),
    ));

    match command {
        InboxCommand::List => {
            let snapshot = inbox.refresh().await;
            bail_if_stale(&inbox)?;
            print_snapshot(&snapshot);
        }
        InboxCommand::Unread => {
            inbox.refresh().await;
            bail_if_stale(&inbox)?;
            println!("{}", inbox.unread_count());
        }
        InboxCommand::Read { id } => {
            inbox.mark_as_read(id).await?;
            println!("unread={}", inbox.unread_count());
        }
        InboxCommand::ReadAll => {
            inbox.mark_all_as_read().await?;
            println!("unread={}", inbox.unread_count());
        }
        InboxCommand::Delete { id } => {
            inbox.delete(id).await?;
            println!("unread={}", inbox.unread_count());
        }
        InboxCommand::Watch => {
            let printer = Arc::clone(&inbox);
            let _subscription = inbox.changes().subscribe(move || {
                let status = printer.status();
                match status.last_error {
                    Some(err) => eprintln!("refresh failed (showing last snapshot): {err}"),
                    None => print_snapshot(&status.snapshot),
                }
            });
            let handle = InboxPoller::attach(Arc::clone(&inbox), config.poll_interval());
            tokio::signal::ctrl_c()
                .await
                .context("failed to listen for Ctrl-C")?;
            handle.detach().await;
        }
    }
    Ok(())
}

fn bail_if_stale(inbox: &NotificationInbox) -> Result<()> {
    match inbox.last_error() {
        Some(err) => anyhow::bail!("notification refresh failed: {err}"),
        None => Ok(()),
    }
}

fn print_snapshot(snapshot: &InboxSnapshot) {
    println!(
        "unread={} badge={}",
        snapshot.unread_count,
        snapshot.badge_label().unwrap_or_else(|| "-".to_string())
    );
    for record in &snapshot.records {
        println!(
            "{}\t{}\t{:?}\t{}\t{}\t{}",
            record.id,
            if record.is_read { "read" } else { "unread" },
            record.severity,
            record.ticker.as_deref().unwrap_or("-"),
            record.created_at.to_rfc3339(),
            record.title
        );
    }
}
