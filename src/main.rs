//! Command-line entry point.

use std::path::PathBuf;

use clap::Parser;
use tidyfeed::{
    credentials,
    executor::Executor,
    filter::RetentionPolicy,
    models::ItemKind,
    source::{HttpItemSource, HttpSourceConfig, ItemSource},
};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// CLI arguments for tidyfeed.
#[derive(Parser, Debug)]
#[command(version, about = "Delete your old posts and favourites", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Path to the credentials file (defaults to
    /// ~/.config/tidyfeed/credentials.toml; environment variables take
    /// priority either way)
    #[arg(long, global = true)]
    credentials: Option<PathBuf>,

    /// Evaluate and report without deleting anything
    #[arg(short = 'n', long, global = true)]
    dry_run: bool,

    /// Log each examined item and skip decision
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Delete old posts from your timeline
    Posts {
        /// Keep posts at most this many days old
        #[arg(short, long, default_value_t = 62)]
        days: i64,
        /// Keep posts with more favourites than this, regardless of age
        #[arg(short, long, default_value_t = 20)]
        favorite_threshold: i64,
    },
    /// Remove old items from your favourites
    LikedItems {
        /// Keep favourites at most this many days old
        #[arg(short, long, default_value_t = 62)]
        days: i64,
    },
    /// Run the posts pass, then the favourites pass
    Both {
        /// Keep items at most this many days old
        #[arg(short, long, default_value_t = 62)]
        days: i64,
        /// Keep posts with more favourites than this, regardless of age
        #[arg(short, long, default_value_t = 20)]
        favorite_threshold: i64,
    },
}

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` overrides everything; otherwise `--verbose` selects info-level
/// output (one line per examined item) and the default is warn-level
/// (deletions and problems only).
fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "tidyfeed=info" } else { "tidyfeed=warn" };

    let filter = match std::env::var("RUST_LOG") {
        Ok(env_filter) => {
            EnvFilter::try_new(env_filter).unwrap_or_else(|_| EnvFilter::new(default_filter))
        }
        Err(_) => EnvFilter::new(default_filter),
    };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_target(false)
        .without_time();

    tracing_subscriber::registry().with(filter).with(fmt_layer).init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    if let Err(err) = run(args).await {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    // Credential problems are reported before any network activity.
    let credentials = credentials::load(args.credentials.as_deref())?;
    let source = HttpItemSource::new(credentials, HttpSourceConfig::default());

    match args.command {
        Command::Posts {
            days,
            favorite_threshold,
        } => {
            let policy = RetentionPolicy {
                min_age_days: days,
                max_favourites: favorite_threshold,
            };
            purge(&source, policy, ItemKind::Post, args.dry_run).await?;
        }
        Command::LikedItems { days } => {
            let policy = RetentionPolicy {
                min_age_days: days,
                ..Default::default()
            };
            purge(&source, policy, ItemKind::Liked, args.dry_run).await?;
        }
        Command::Both {
            days,
            favorite_threshold,
        } => {
            let policy = RetentionPolicy {
                min_age_days: days,
                max_favourites: favorite_threshold,
            };
            purge(&source, policy, ItemKind::Post, args.dry_run).await?;
            purge(&source, policy, ItemKind::Liked, args.dry_run).await?;
        }
    }

    Ok(())
}

async fn purge<S: ItemSource>(
    source: &S,
    policy: RetentionPolicy,
    kind: ItemKind,
    dry_run: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let report = Executor::new(policy, dry_run).run(source, kind).await?;
    println!("{}", report.summary());
    Ok(())
}
