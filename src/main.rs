use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::{info, warn};

use bookmark_dedupe::report::{self, ScanReport};
use bookmark_dedupe::{
    BookmarkId, BookmarkStore, BrowserStore, CleanupMode, Config, DuplicateGroup, Session, SessionError, StoreKind,
};

mod progress;

#[derive(Parser)]
#[command(name = "bookmark-dedupe")]
#[command(about = "Find and remove duplicate browser bookmarks", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (default: <config dir>/bookmark-dedupe/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Chromium-family Bookmarks file (Chrome, Brave, Edge)
    #[arg(long, global = true, conflicts_with = "firefox")]
    chromium: Option<PathBuf>,

    /// Firefox-family places.sqlite (Firefox, Waterfox)
    #[arg(long, global = true)]
    firefox: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan for duplicate bookmarks without changing anything
    Scan {
        /// Show URL, folder and date of every entry
        #[arg(short, long)]
        detailed: bool,
    },

    /// Remove duplicate bookmarks (each group keeps its newest entry)
    Clean {
        /// Only delete these bookmark ids (comma-separated)
        #[arg(long, value_delimiter = ',')]
        select: Vec<String>,

        /// Select every duplicate
        #[arg(long, conflicts_with = "select")]
        select_all: bool,

        /// Skip the bookmarks file backup
        #[arg(long)]
        no_backup: bool,

        /// Dry run - show what would be deleted without making changes
        #[arg(short, long)]
        dry_run: bool,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,

        /// Show URL, folder and date of every entry
        #[arg(long)]
        detailed: bool,
    },
}

struct CleanOptions {
    select: Vec<String>,
    select_all: bool,
    dry_run: bool,
    yes: bool,
    detailed: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(path) = cli.chromium {
        config.override_store(StoreKind::Chromium, path);
    } else if let Some(path) = cli.firefox {
        config.override_store(StoreKind::Firefox, path);
    }

    match cli.command {
        Commands::Scan { detailed } => {
            let session = open_session(&config)?;
            let groups = scan(&session).await?;
            let scan_report = ScanReport::new(&groups, session.store().timestamp_kind());
            println!("{}", scan_report.format(detailed));
        }

        Commands::Clean { select, select_all, no_backup, dry_run, yes, detailed } => {
            if no_backup {
                config.cleanup.backup = false;
            }
            let options = CleanOptions { select, select_all, dry_run, yes, detailed };
            clean(&config, options).await?;
        }
    }

    Ok(())
}

fn open_session(config: &Config) -> Result<Session<BrowserStore>> {
    let (kind, path) = config.validate()?;
    info!("📖 Using {} bookmarks at {:?}", kind.name(), path);
    let store = BrowserStore::open(kind, path, config.cleanup.backup);
    Ok(Session::new(store).with_unknown_folder(config.display.unknown_folder.clone()))
}

async fn scan(session: &Session<BrowserStore>) -> Result<Vec<DuplicateGroup>> {
    let spinner = progress::create_spinner("Scanning bookmarks...");
    match session.scan().await {
        Ok(groups) => {
            let message = if groups.is_empty() {
                "Scan complete: no duplicate bookmarks".to_string()
            } else {
                format!("Scan complete: {} duplicate groups found", groups.len())
            };
            progress::finish_with_success(&spinner, &message);
            Ok(groups)
        }
        Err(e) => {
            progress::finish_with_error(&spinner, "Scan failed");
            Err(e).context("Failed to scan bookmarks")
        }
    }
}

async fn clean(config: &Config, options: CleanOptions) -> Result<()> {
    let session = open_session(config)?;
    let groups = scan(&session).await?;

    if groups.is_empty() {
        info!("✅ Nothing to clean");
        return Ok(());
    }

    let mode = if !options.select.is_empty() {
        for raw in &options.select {
            let id = BookmarkId::new(raw.trim());
            if session.is_selected(&id) {
                continue;
            }
            if !session.toggle(&id) {
                warn!("⚠️  {} is not a removable duplicate, ignoring", id);
            }
        }
        CleanupMode::Selected
    } else if options.select_all {
        session.set_all(true);
        CleanupMode::Selected
    } else {
        config.cleanup.default_mode
    };

    let selected = session.selected_ids();
    let mut scan_report = ScanReport::new(&groups, session.store().timestamp_kind());
    if mode == CleanupMode::Selected {
        scan_report = scan_report.with_selection(&selected);
    }
    println!("{}", scan_report.format(options.detailed));

    let targets = session.targets(mode);
    if targets.is_empty() {
        bail!("No bookmarks selected for deletion. Use --select <ids> or --select-all");
    }

    if options.dry_run {
        info!("🏃 Dry run mode - no changes will be made");
        for id in &targets {
            info!("  Would delete bookmark {}", id);
        }
        return Ok(());
    }

    if config.cleanup.confirm && !options.yes {
        let question = match mode {
            CleanupMode::Policy => format!(
                "Delete {} duplicate bookmarks from {} groups? Each group keeps its newest bookmark.",
                targets.len(),
                groups.len()
            ),
            CleanupMode::Selected => format!("Delete {} selected bookmarks?", targets.len()),
        };
        if !confirm(&question)? {
            info!("❌ Cancelled");
            return Ok(());
        }
    }

    let spinner = progress::create_spinner("Cleaning up duplicates...");
    match session.cleanup(mode).await {
        Ok(outcome) => {
            spinner.finish_and_clear();
            println!("{}", report::format_cleanup(&outcome));
            Ok(())
        }
        Err(SessionError::Deletion(err)) => {
            progress::finish_with_error(&spinner, "Cleanup failed");
            eprintln!("{}", report::format_cleanup_failure(&err));
            Err(err).context("Cleanup stopped early")
        }
        Err(e) => {
            progress::finish_with_error(&spinner, "Cleanup failed");
            Err(e).context("Cleanup failed")
        }
    }
}

fn confirm(question: &str) -> Result<bool> {
    print!("{} (y/N): ", question);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}
