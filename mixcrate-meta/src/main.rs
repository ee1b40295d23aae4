//! mixcrate-meta CLI: one-shot metadata reconciliation pass
//!
//! Queries the configured external catalogs for a track, prints the ranked
//! candidates, and (when an audio path is given) persists them under the
//! path's temporary reference for later apply/review.

use anyhow::Result;
use clap::Parser;
use mixcrate_common::config;
use mixcrate_meta::providers::{DiscogsProvider, MusicBrainzProvider, ProviderAdapter};
use mixcrate_meta::services::{CandidateAggregator, NullCoverResolver};
use mixcrate_meta::{MetadataEngine, SearchQuery};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

const PROVIDER_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Parser, Debug)]
#[command(name = "mixcrate-meta", about = "Metadata reconciliation for the mixcrate library")]
struct Args {
    /// Artist to search for
    #[arg(long)]
    artist: Option<String>,

    /// Album to search for
    #[arg(long)]
    album: Option<String>,

    /// Track title to search for
    #[arg(long)]
    title: Option<String>,

    /// Local audio path; when given, candidates are persisted under its
    /// temporary reference
    #[arg(long)]
    audio_path: Option<String>,

    /// Library root folder (overrides MIXCRATE_ROOT and the TOML config)
    #[arg(long)]
    root: Option<String>,

    /// Discogs personal access token (overrides the TOML config)
    #[arg(long, env = "MIXCRATE_DISCOGS_TOKEN")]
    discogs_token: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let toml_config = config::load_toml_config()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(toml_config.logging.level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting mixcrate-meta v{}", env!("CARGO_PKG_VERSION"));

    let query = SearchQuery {
        artist: args.artist,
        album: args.album,
        title: args.title,
    };
    if query.is_empty() {
        anyhow::bail!("Provide at least one of --artist, --album, --title");
    }

    let root = config::resolve_root_folder(args.root.as_deref(), &toml_config);
    config::ensure_root_folder(&root)?;
    info!("Library root: {}", root.display());

    let db_pool = mixcrate_meta::db::init_database_pool(&config::database_path(&root)).await?;

    let discogs_token = args.discogs_token.or(toml_config.discogs_token);
    let providers: Vec<Arc<dyn ProviderAdapter>> = vec![
        Arc::new(MusicBrainzProvider::new(PROVIDER_TIMEOUT)?),
        Arc::new(DiscogsProvider::new(PROVIDER_TIMEOUT, discogs_token)?),
    ];
    let aggregator = CandidateAggregator::with_timeout(providers, PROVIDER_TIMEOUT);

    // The CLI only aggregates; covers are resolved when a candidate is
    // applied through the library surface.
    let engine = MetadataEngine::new(db_pool, aggregator, Arc::new(NullCoverResolver));

    let candidates = match &args.audio_path {
        Some(path) => {
            let (temp_ref, candidates) = engine.aggregate_for_path(&query, path).await?;
            info!("Persisted {} candidates under temp ref {}", candidates.len(), temp_ref);
            candidates
        }
        None => engine.aggregate(&query).await,
    };

    if candidates.is_empty() {
        println!("No candidates found.");
        return Ok(());
    }

    println!("{:>6}  {:<12}  {}", "score", "source", "candidate");
    for candidate in &candidates {
        println!(
            "{:>6.1}  {:<12}  {} - {} ({})",
            candidate.score,
            candidate.source,
            candidate.artist.as_deref().unwrap_or("?"),
            candidate.title.as_deref().unwrap_or("?"),
            candidate.album.as_deref().unwrap_or("?"),
        );
    }

    if let Some(best) = engine.choose_best(&candidates) {
        println!(
            "\nBest: {} - {} (score {:.1}, {})",
            best.artist.as_deref().unwrap_or("?"),
            best.title.as_deref().unwrap_or("?"),
            best.score,
            best.source,
        );
    }

    Ok(())
}
