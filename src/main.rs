use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use colored::Colorize;
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

mod cli;

use cli::{Args, Command};
use scour::{build_index, Config, IndexOptions, SearchEngine};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;

    match args.command {
        Command::Index {
            corpus,
            storage,
            spill_threshold_mb,
        } => run_index(config, corpus, storage, spill_threshold_mb),
        Command::Search {
            query,
            top,
            storage,
        } => run_search(config, &query, top, storage),
    }
}

fn run_index(
    config: Config,
    corpus: Option<PathBuf>,
    storage: Option<PathBuf>,
    spill_threshold_mb: Option<usize>,
) -> Result<()> {
    let spill_threshold = spill_threshold_mb
        .map(|mb| mb * 1024 * 1024)
        .unwrap_or_else(|| config.spill_threshold_bytes());
    let corpus_path = corpus.or(config.corpus_path).context(
        "no corpus directory: pass --corpus, set CORPUS_PATH, or add corpus_path to scour.json",
    )?;
    let storage_path = storage.or(config.index_storage).context(
        "no storage directory: pass --storage, set INDEX_STORAGE, or add index_storage to scour.json",
    )?;

    let started = Instant::now();
    let summary = build_index(&IndexOptions {
        corpus_path,
        storage_path,
        spill_threshold,
    })?;

    println!(
        "Indexed {} documents ({} unique tokens, {} partial files, {} skipped) in {:.1?}",
        summary.documents,
        summary.unique_tokens,
        summary.partials,
        summary.skipped,
        started.elapsed()
    );
    Ok(())
}

fn run_search(
    config: Config,
    query: &str,
    top: usize,
    storage: Option<PathBuf>,
) -> Result<()> {
    let storage_path = storage.or(config.index_storage).context(
        "no storage directory: pass --storage, set INDEX_STORAGE, or add index_storage to scour.json",
    )?;

    let engine = SearchEngine::open(&storage_path)?;
    let started = Instant::now();
    let hits = engine.search(query, top)?;
    let elapsed = started.elapsed();

    if hits.is_empty() {
        println!("No results found.");
    } else {
        for (rank, hit) in hits.iter().enumerate() {
            println!(
                "{:>2}. {} {}",
                rank + 1,
                format!("({:.4})", hit.score).dimmed(),
                hit.url.cyan()
            );
        }
    }
    println!(
        "\n{} of {} documents matched in {:.1} ms",
        hits.len(),
        engine.doc_count(),
        elapsed.as_secs_f64() * 1000.0
    );
    Ok(())
}
